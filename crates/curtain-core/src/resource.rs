//! Resource lists and preload outcomes.
//!
//! A [`ResourceList`] is the ordered set of image and video URLs a gate
//! preloads before revealing the page. Every resource ends in a
//! [`ResourceOutcome`]; a failed load counts as settled exactly like a
//! successful one.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of resources (images and videos combined) in one list.
pub const MAX_RESOURCES: usize = 1_024;

/// Maximum length of a single resource URL.
pub const MAX_URL_LENGTH: usize = 4_096;

/// Kind of preloaded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// An image, settled once loaded (or errored).
    Image,
    /// A video, settled once fully fetched (or errored).
    Video,
}

impl ResourceKind {
    /// Returns the lowercase label for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from building a [`ResourceList`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResourceListError {
    /// A URL was empty or whitespace.
    #[error("{kind} URL at index {index} is empty")]
    EmptyUrl {
        /// Kind of the offending entry.
        kind: ResourceKind,
        /// Position in the caller-supplied list.
        index: usize,
    },

    /// A URL exceeded [`MAX_URL_LENGTH`].
    #[error("{kind} URL at index {index} exceeds max length: {actual} > {max}")]
    UrlTooLong {
        /// Kind of the offending entry.
        kind: ResourceKind,
        /// Position in the caller-supplied list.
        index: usize,
        /// Actual length.
        actual: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Too many resources in total.
    #[error("too many resources: {actual} > {max}")]
    TooManyResources {
        /// Number of distinct resources supplied.
        actual: usize,
        /// Maximum allowed.
        max: usize,
    },
}

/// Ordered set of image and video URLs to preload.
///
/// Duplicates within a kind are collapsed, keeping the first occurrence in
/// place, so each listed URL is attempted exactly once per gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceList {
    images: Vec<String>,
    videos: Vec<String>,
}

impl ResourceList {
    /// Builds a resource list from caller-supplied image and video URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceListError`] if a URL is empty or too long, or if the
    /// list exceeds [`MAX_RESOURCES`] after deduplication.
    pub fn new<I, V, S, T>(images: I, videos: V) -> Result<Self, ResourceListError>
    where
        I: IntoIterator<Item = S>,
        V: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let images = dedup_urls(ResourceKind::Image, images)?;
        let videos = dedup_urls(ResourceKind::Video, videos)?;

        let total = images.len() + videos.len();
        if total > MAX_RESOURCES {
            return Err(ResourceListError::TooManyResources {
                actual: total,
                max: MAX_RESOURCES,
            });
        }

        Ok(Self { images, videos })
    }

    /// Returns an empty list.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            images: Vec::new(),
            videos: Vec::new(),
        }
    }

    /// Returns the image URLs in order.
    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Returns the video URLs in order.
    #[must_use]
    pub fn videos(&self) -> &[String] {
        &self.videos
    }

    /// Returns the total number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len() + self.videos.len()
    }

    /// Returns `true` if there is nothing to preload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty()
    }

    /// Iterates images first, then videos, each in list order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &str)> {
        self.images
            .iter()
            .map(|url| (ResourceKind::Image, url.as_str()))
            .chain(
                self.videos
                    .iter()
                    .map(|url| (ResourceKind::Video, url.as_str())),
            )
    }
}

fn dedup_urls<U, S>(kind: ResourceKind, urls: U) -> Result<Vec<String>, ResourceListError>
where
    U: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (index, url) in urls.into_iter().enumerate() {
        let url: String = url.into();
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ResourceListError::EmptyUrl { kind, index });
        }
        if trimmed.len() > MAX_URL_LENGTH {
            return Err(ResourceListError::UrlTooLong {
                kind,
                index,
                actual: trimmed.len(),
                max: MAX_URL_LENGTH,
            });
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
        if out.len() > MAX_RESOURCES {
            return Err(ResourceListError::TooManyResources {
                actual: out.len(),
                max: MAX_RESOURCES,
            });
        }
    }

    Ok(out)
}

/// Terminal state of one resource.
///
/// Both variants mean "done trying"; the gate does not distinguish them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResourceOutcome {
    /// The resource loaded.
    Loaded {
        /// Number of bytes received.
        bytes: u64,
    },
    /// The resource failed to load.
    Failed {
        /// Human-readable failure reason, for reporting only.
        reason: String,
    },
}

impl ResourceOutcome {
    /// Returns `true` for [`ResourceOutcome::Loaded`].
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// One settled resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSettlement {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource URL as listed.
    pub url: String,
    /// Terminal outcome.
    #[serde(flatten)]
    pub outcome: ResourceOutcome,
    /// Milliseconds from gate construction to settlement.
    pub elapsed_ms: u64,
}

/// Outcome of a whole preload pass, in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadReport {
    /// Every resource with its outcome.
    pub settlements: Vec<ResourceSettlement>,
}

impl PreloadReport {
    /// Number of resources that loaded.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.settlements
            .iter()
            .filter(|s| s.outcome.is_loaded())
            .count()
    }

    /// Number of resources that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.settlements.len() - self.loaded_count()
    }

    /// Total bytes received across loaded resources.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.settlements
            .iter()
            .map(|s| match s.outcome {
                ResourceOutcome::Loaded { bytes } => bytes,
                ResourceOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}
