//! `curtain run`: drive one reveal gate against real assets.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use curtain_core::config::RevealConfig;
use curtain_core::document::ReadyState;
use curtain_core::event::RevealEvent;
use curtain_core::report::{CueStatus, RevealReport};
use curtain_core::resource::ResourceOutcome;
use curtain_core::timing::TimingPolicy;
use curtain_gate::cue::{AssetCue, AudioCue, SilentCue};
use curtain_gate::document::Document;
use curtain_gate::fetch::{DEFAULT_ASSET_ROOT, FsFetcher, HttpFetcher, ResourceFetcher};
use curtain_gate::gate::RevealGate;
use tracing::{debug, info};

use super::{config_exit_code, load_config, output_error};
use crate::exit_codes::codes;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// JSON document.
    Json,
}

/// Arguments for `curtain run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory holding the site's static assets
    #[arg(long, conflicts_with = "origin")]
    pub asset_root: Option<PathBuf>,

    /// HTTP(S) origin to fetch assets from instead of a directory
    #[arg(long)]
    pub origin: Option<String>,

    /// Simulated page load time in milliseconds (0 = already loaded)
    #[arg(long, default_value_t = 0)]
    pub page_load_ms: u64,

    /// Tear the gate down after this many milliseconds
    #[arg(long)]
    pub teardown_after_ms: Option<u64>,

    /// Override the minimum intro duration
    #[arg(long)]
    pub min_intro_ms: Option<u64>,

    /// Override the safety ceiling
    #[arg(long)]
    pub safety_ceiling_ms: Option<u64>,

    /// Override the dismissal delay
    #[arg(long)]
    pub dismiss_delay_ms: Option<u64>,

    /// Skip the dismissal cue
    #[arg(long)]
    pub silent: bool,

    /// Include the event log in the output
    #[arg(long)]
    pub events: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Runs `curtain run` and returns the exit code.
pub fn run(config_path: Option<&Path>, args: &RunArgs) -> u8 {
    let json = args.format == OutputFormat::Json;

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => return output_error(json, "config_error", &e.to_string(), config_exit_code(&e)),
    };
    let timing = match effective_timing(&config, args) {
        Ok(timing) => timing,
        Err(e) => {
            return output_error(json, "invalid_timing", &e, codes::VALIDATION_ERROR);
        },
    };

    let fetcher: Arc<dyn ResourceFetcher> = if let Some(origin) = &args.origin {
        match HttpFetcher::new(origin) {
            Ok(fetcher) => Arc::new(fetcher),
            Err(e) => {
                return output_error(
                    json,
                    "invalid_origin",
                    &e.to_string(),
                    codes::VALIDATION_ERROR,
                );
            },
        }
    } else {
        let root = args
            .asset_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSET_ROOT));
        if !root.is_dir() {
            return output_error(
                json,
                "asset_root_not_found",
                &format!("asset root not found: {}", root.display()),
                codes::NOT_FOUND,
            );
        }
        Arc::new(FsFetcher::new(root))
    };

    match execute(&config, timing, fetcher, args) {
        Ok(Outcome::Finished { report, events }) => {
            print_report(&report, args.events.then_some(events.as_slice()), args.format);
            if report.is_dismissed() {
                codes::SUCCESS
            } else {
                codes::TORN_DOWN
            }
        },
        Ok(Outcome::Rejected(message)) => {
            output_error(json, "invalid_config", &message, codes::VALIDATION_ERROR)
        },
        Err(e) => output_error(json, "run_failed", &format!("{e:#}"), codes::GENERIC_ERROR),
    }
}

/// Applies command-line timing overrides on top of the configuration.
fn effective_timing(config: &RevealConfig, args: &RunArgs) -> Result<TimingPolicy, String> {
    let base = config.timing;
    TimingPolicy::builder()
        .min_intro_ms(args.min_intro_ms.unwrap_or(base.min_intro_ms()))
        .safety_ceiling_ms(args.safety_ceiling_ms.unwrap_or(base.safety_ceiling_ms()))
        .dismiss_delay_ms(args.dismiss_delay_ms.unwrap_or(base.dismiss_delay_ms()))
        .try_build()
}

enum Outcome {
    Finished {
        report: RevealReport,
        events: Vec<RevealEvent>,
    },
    Rejected(String),
}

fn execute(
    config: &RevealConfig,
    timing: TimingPolicy,
    fetcher: Arc<dyn ResourceFetcher>,
    args: &RunArgs,
) -> Result<Outcome> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let document = if args.page_load_ms == 0 {
            Document::loaded()
        } else {
            Document::default()
        };
        let cue: Arc<dyn AudioCue> = if args.silent {
            Arc::new(SilentCue)
        } else {
            Arc::new(AssetCue::new(Arc::clone(&fetcher)))
        };

        let handle = match RevealGate::builder(config)
            .timing(timing)
            .fetcher(fetcher)
            .document(document.clone())
            .audio_cue(cue)
            .start()
        {
            Ok(handle) => handle,
            Err(e) => return Ok(Outcome::Rejected(e.to_string())),
        };

        if args.page_load_ms > 0 {
            let delay = Duration::from_millis(args.page_load_ms);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                document.mark_ready_state(ReadyState::Interactive);
                document.mark_ready_state(ReadyState::Complete);
                debug!("simulated page load complete");
            });
        }

        let report = match args.teardown_after_ms {
            Some(ms) => {
                tokio::select! {
                    report = handle.wait_finished() => report,
                    () = tokio::time::sleep(Duration::from_millis(ms)) => {
                        info!(after_ms = ms, "tearing gate down");
                        handle.teardown();
                        handle.report()
                    },
                }
            },
            None => handle.wait_finished().await,
        };

        Ok(Outcome::Finished {
            report,
            events: handle.drain_events(),
        })
    })
}

fn print_report(report: &RevealReport, events: Option<&[RevealEvent]>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let output = events.map_or_else(
                || serde_json::json!({ "report": report }),
                |events| serde_json::json!({ "report": report, "events": events }),
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
            );
        },
        OutputFormat::Text => {
            println!("{}", render_text(report));
            if let Some(events) = events {
                println!();
                for event in events {
                    println!("{:>8} ms  {}", event.elapsed_ms(), event.name());
                }
            }
        },
    }
}

fn render_text(report: &RevealReport) -> String {
    let ms = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| format!("{v} ms"));

    let mut lines = vec![
        format!("{:<14}{}", "state:", report.final_state),
        format!(
            "{:<14}{}",
            "path:",
            report
                .winning_path
                .map_or_else(|| "-".to_string(), |path| path.to_string())
        ),
        format!("{:<14}{}", "ready at:", ms(report.ready_to_dismiss_ms)),
        format!("{:<14}{}", "dismissed at:", ms(report.dismissed_ms)),
    ];
    if let Some(preload) = &report.preload {
        lines.push(format!(
            "{:<14}{} loaded, {} failed ({} bytes)",
            "resources:",
            preload.loaded_count(),
            preload.failed_count(),
            preload.total_bytes()
        ));
        for settlement in &preload.settlements {
            if let ResourceOutcome::Failed { reason } = &settlement.outcome {
                lines.push(format!("{:<14}{} ({reason})", "  failed:", settlement.url));
            }
        }
    } else {
        lines.push(format!("{:<14}not settled", "resources:"));
    }
    lines.push(format!(
        "{:<14}{}",
        "scroll:",
        report
            .scroll_release
            .map_or_else(|| "locked".to_string(), |style| style.to_string())
    ));
    lines.push(format!(
        "{:<14}{}",
        "cue:",
        match &report.cue {
            CueStatus::NotPlayed => "not played".to_string(),
            CueStatus::Played => "played".to_string(),
            CueStatus::Failed { reason } => format!("failed ({reason})"),
        }
    ));
    if report.torn_down {
        lines.push(format!("{:<14}yes", "torn down:"));
    }
    lines.join("\n")
}
