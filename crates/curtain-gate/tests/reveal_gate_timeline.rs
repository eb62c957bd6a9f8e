//! End-to-end timelines for the reveal gate on tokio's paused clock.
//!
//! Every test starts a gate at virtual time zero and lets the runtime
//! auto-advance, so the millisecond offsets asserted here are exact.

use std::sync::Arc;
use std::time::Duration;

use curtain_core::{
    GatePath, GateState, OverflowStyle, ReadyState, ResourceKind, ResourceList, ResourceOutcome,
    RevealConfig, RevealEvent, TimingPolicy,
};
use curtain_gate::test_support::{RecordingCue, Script, ScriptedFetcher};
use curtain_gate::{Document, GateHandle, RevealGate, ScrollSurface};
use tokio::time::{Instant, sleep, sleep_until};

// =============================================================================
// Helpers
// =============================================================================

const LANDING_IMAGES: [&str; 14] = [
    "/textures/velvet.png",
    "/images/modern-kitchen.jpg",
    "/images/innovation.jpg",
    "/images/diversity.jpg",
    "/images/commitment.jpg",
    "/images/sustainability.jpg",
    "/images/artisian.jpg",
    "/images/corporate.jpg",
    "/images/wedding-home.jpg",
    "/images/private-party.jpg",
    "/images/menu/arabian.png",
    "/images/menu/continental.png",
    "/images/menu/south-asian.png",
    "/images/menu/desserts.png",
];

fn list(images: &[&str], videos: &[&str]) -> ResourceList {
    ResourceList::new(images.iter().copied(), videos.iter().copied()).unwrap()
}

fn start(
    resources: ResourceList,
    fetcher: Arc<ScriptedFetcher>,
    document: &Document,
    cue: &Arc<RecordingCue>,
) -> GateHandle {
    RevealGate::builder(&RevealConfig::default())
        .resources(resources)
        .fetcher(fetcher)
        .document(document.clone())
        .audio_cue(Arc::clone(cue) as _)
        .start()
        .unwrap()
}

fn state_changes(events: &[RevealEvent]) -> Vec<(GateState, u64)> {
    events
        .iter()
        .filter_map(|event| match event {
            RevealEvent::StateChanged { to, elapsed_ms, .. } => Some((*to, *elapsed_ms)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test(start_paused = true)]
async fn empty_list_with_loaded_page_dismisses_at_8000ms() {
    let document = Document::loaded();
    let cue = Arc::new(RecordingCue::default());
    let handle = start(
        ResourceList::empty(),
        Arc::new(ScriptedFetcher::new()),
        &document,
        &cue,
    );

    let report = handle.wait_finished().await;

    assert_eq!(report.winning_path, Some(GatePath::Primary));
    assert_eq!(report.ready_to_dismiss_ms, Some(5_500));
    assert_eq!(report.dismissed_ms, Some(8_000));
    assert_eq!(cue.plays(), 1);
    assert_eq!(
        state_changes(&handle.drain_events()),
        vec![
            (GateState::ReadyToDismiss, 5_500),
            (GateState::Dismissing, 5_500),
            (GateState::Dismissed, 8_000),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn stalled_video_falls_back_to_safety_at_12000ms() {
    let document = Document::default();
    let cue = Arc::new(RecordingCue::default());
    let handle = start(
        list(&[], &["/videos/hero-luxury.mp4"]),
        Arc::new(ScriptedFetcher::new().with("/videos/hero-luxury.mp4", Script::Stall)),
        &document,
        &cue,
    );

    let host = document.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(200)).await;
        host.mark_ready_state(ReadyState::Complete);
    });

    let report = handle.wait_finished().await;

    assert_eq!(report.winning_path, Some(GatePath::Safety));
    assert_eq!(report.ready_to_dismiss_ms, Some(12_000));
    assert_eq!(report.dismissed_ms, Some(14_500));

    let events = handle.drain_events();
    assert!(events.contains(&RevealEvent::PageLoaded { elapsed_ms: 200 }));
    assert!(events.contains(&RevealEvent::IntroElapsed { elapsed_ms: 5_500 }));
    assert!(events.contains(&RevealEvent::PathWon {
        path: GatePath::Safety,
        elapsed_ms: 12_000
    }));
}

#[tokio::test(start_paused = true)]
async fn full_site_manifest_dismisses_on_primary_path() {
    let fetcher = LANDING_IMAGES
        .iter()
        .enumerate()
        .fold(ScriptedFetcher::new(), |fetcher, (i, url)| {
            fetcher.with(url, Script::succeed_after(150 * (i as u64 + 1)))
        })
        .with("/videos/hero-luxury.mp4", Script::succeed_after(6_200));
    let fetcher = Arc::new(fetcher);
    let document = Document::default();
    let cue = Arc::new(RecordingCue::default());
    let handle = start(
        list(&LANDING_IMAGES, &["/videos/hero-luxury.mp4"]),
        Arc::clone(&fetcher),
        &document,
        &cue,
    );

    let host = document.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(900)).await;
        host.mark_ready_state(ReadyState::Complete);
    });

    let report = handle.wait_finished().await;

    // The video outlasts the intro floor, so it sets the pace.
    assert_eq!(report.ready_to_dismiss_ms, Some(6_200));
    assert_eq!(report.dismissed_ms, Some(8_700));
    let preload = report.preload.unwrap();
    assert_eq!(preload.loaded_count(), 15);
    for url in LANDING_IMAGES {
        assert_eq!(fetcher.attempts(url), 1);
    }
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test(start_paused = true)]
async fn gate_always_dismisses_in_finite_time() {
    let cases: Vec<(ResourceList, ScriptedFetcher, ReadyState)> = vec![
        (ResourceList::empty(), ScriptedFetcher::new(), ReadyState::Loading),
        (
            list(&["/a.png"], &[]),
            ScriptedFetcher::new().with("/a.png", Script::Stall),
            ReadyState::Complete,
        ),
        (
            list(&["/a.png", "/b.png"], &["/v.mp4"]),
            ScriptedFetcher::new(),
            ReadyState::Interactive,
        ),
    ];

    for (resources, fetcher, ready_state) in cases {
        let start_at = Instant::now();
        let document = Document::new(ready_state);
        let cue = Arc::new(RecordingCue::default());
        let handle = start(resources, Arc::new(fetcher), &document, &cue);

        let report = handle.wait_dismissed().await.unwrap();
        assert!(report.is_dismissed());
        assert!(start_at.elapsed() <= Duration::from_millis(14_500));
    }
}

#[tokio::test(start_paused = true)]
async fn simultaneous_paths_produce_exactly_one_winner() {
    let timing = TimingPolicy::builder()
        .min_intro_ms(1_000)
        .safety_ceiling_ms(1_000)
        .build();

    for round in 0..32 {
        let cue = Arc::new(RecordingCue::default());
        let handle = RevealGate::builder(&RevealConfig::default())
            .timing(timing)
            .resources(ResourceList::empty())
            .fetcher(Arc::new(ScriptedFetcher::new()))
            .document(Document::loaded())
            .audio_cue(Arc::clone(&cue) as _)
            .start()
            .unwrap();

        let report = handle.wait_finished().await;
        let events = handle.drain_events();
        let wins = events
            .iter()
            .filter(|event| matches!(event, RevealEvent::PathWon { .. }))
            .count();
        let ready_entries = state_changes(&events)
            .into_iter()
            .filter(|(state, _)| *state == GateState::ReadyToDismiss)
            .count();

        assert_eq!(wins, 1, "round {round}");
        assert_eq!(ready_entries, 1, "round {round}");
        assert_eq!(cue.plays(), 1, "round {round}");
        assert!(report.winning_path.is_some(), "round {round}");
        assert_eq!(report.ready_to_dismiss_ms, Some(1_000), "round {round}");
        assert_eq!(report.dismissed_ms, Some(3_500), "round {round}");
    }
}

#[tokio::test(start_paused = true)]
async fn resource_settling_after_ceiling_changes_nothing() {
    let start_at = Instant::now();
    let document = Document::loaded();
    let cue = Arc::new(RecordingCue::default());
    let fetcher = Arc::new(ScriptedFetcher::new().with("/v.mp4", Script::succeed_after(13_000)));
    let handle = start(list(&[], &["/v.mp4"]), Arc::clone(&fetcher), &document, &cue);

    sleep_until(start_at + Duration::from_millis(14_000)).await;
    assert_eq!(fetcher.completions(), 1);
    assert_eq!(handle.state(), GateState::Dismissing);

    let report = handle.report();
    assert_eq!(report.winning_path, Some(GatePath::Safety));
    assert_eq!(report.ready_to_dismiss_ms, Some(12_000));
    assert!(report.preload.is_none());

    let report = handle.wait_finished().await;
    assert_eq!(report.dismissed_ms, Some(14_500));
    assert!(report.preload.is_none());
    assert_eq!(cue.plays(), 1);

    let events = handle.drain_events();
    let wins: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, RevealEvent::PathWon { .. }))
        .collect();
    assert_eq!(
        wins,
        [&RevealEvent::PathWon {
            path: GatePath::Safety,
            elapsed_ms: 12_000
        }]
    );
    assert!(events.contains(&RevealEvent::ResourceSettled {
        kind: ResourceKind::Video,
        url: "/v.mp4".to_string(),
        outcome: ResourceOutcome::Loaded { bytes: 1 },
        elapsed_ms: 13_000,
    }));
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, RevealEvent::PreloadSettled { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn early_primary_signals_still_wait_for_intro_floor() {
    let document = Document::loaded();
    let cue = Arc::new(RecordingCue::default());
    let handle = start(
        list(&["/a.png"], &["/v.mp4"]),
        Arc::new(
            ScriptedFetcher::new()
                .with("/a.png", Script::succeed_after(10))
                .with("/v.mp4", Script::succeed_after(40)),
        ),
        &document,
        &cue,
    );

    sleep(Duration::from_millis(5_499)).await;
    assert_eq!(handle.state(), GateState::Pending);

    let mut states = handle.subscribe_state();
    states
        .wait_for(|state| *state != GateState::Pending)
        .await
        .unwrap();
    drop(states);

    assert_eq!(handle.elapsed(), Duration::from_millis(5_500));
    assert_eq!(handle.report().ready_to_dismiss_ms, Some(5_500));
}

#[tokio::test(start_paused = true)]
async fn all_failing_resources_settle_like_successes() {
    let failing = ScriptedFetcher::new()
        .with("/a.png", Script::fail_after(300))
        .with("/v.mp4", Script::fail_after(700));
    let succeeding = ScriptedFetcher::new()
        .with("/a.png", Script::succeed_after(300))
        .with("/v.mp4", Script::succeed_after(700));

    let mut reports = Vec::new();
    for fetcher in [failing, succeeding] {
        let cue = Arc::new(RecordingCue::default());
        let handle = start(
            list(&["/a.png"], &["/v.mp4"]),
            Arc::new(fetcher),
            &Document::loaded(),
            &cue,
        );
        reports.push(handle.wait_dismissed().await.unwrap());
    }

    let (failed, loaded) = (&reports[0], &reports[1]);
    assert_eq!(failed.winning_path, Some(GatePath::Primary));
    assert_eq!(failed.ready_to_dismiss_ms, loaded.ready_to_dismiss_ms);
    assert_eq!(failed.dismissed_ms, loaded.dismissed_ms);
    assert_eq!(failed.preload.as_ref().unwrap().failed_count(), 2);
    assert_eq!(loaded.preload.as_ref().unwrap().loaded_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_resources_hit_ceiling_without_page_load() {
    let document = Document::default();
    let cue = Arc::new(RecordingCue::default());
    let handle = start(
        list(&["/a.png"], &[]),
        Arc::new(ScriptedFetcher::new().with("/a.png", Script::Stall)),
        &document,
        &cue,
    );

    let mut states = handle.subscribe_state();
    states
        .wait_for(|state| *state == GateState::ReadyToDismiss || *state == GateState::Dismissing)
        .await
        .unwrap();
    drop(states);

    assert_eq!(handle.elapsed(), Duration::from_millis(12_000));
    assert_eq!(handle.report().winning_path, Some(GatePath::Safety));
}

#[tokio::test(start_paused = true)]
async fn ready_flips_exactly_once() {
    let cue = Arc::new(RecordingCue::default());
    let handle = start(
        ResourceList::empty(),
        Arc::new(ScriptedFetcher::new()),
        &Document::loaded(),
        &cue,
    );
    let mut ready = handle.subscribe_ready();
    assert!(!*ready.borrow_and_update());

    handle.wait_finished().await;
    assert!(ready.has_changed().unwrap());
    assert!(*ready.borrow_and_update());

    handle.teardown();
    assert!(!ready.has_changed().unwrap());
    assert!(*ready.borrow());
}

#[tokio::test(start_paused = true)]
async fn scroll_released_once_despite_double_teardown() {
    let document = Document::loaded();
    let cue = Arc::new(RecordingCue::default());
    let handle = start(
        ResourceList::empty(),
        Arc::new(ScriptedFetcher::new()),
        &document,
        &cue,
    );

    handle.wait_finished().await;
    assert_eq!(document.overflow(), OverflowStyle::Auto);

    assert!(handle.teardown());
    assert!(!handle.teardown());
    assert!(handle.is_torn_down());

    assert_eq!(document.overflow(), OverflowStyle::Auto);
    assert_eq!(document.overflow_writes(), 2);
    assert_eq!(handle.report().scroll_release, Some(OverflowStyle::Auto));
    assert_eq!(cue.plays(), 1);
}

#[tokio::test(start_paused = true)]
async fn teardown_while_pending_silences_every_timer() {
    let start_at = Instant::now();
    let document = Document::default();
    let cue = Arc::new(RecordingCue::default());
    let fetcher =
        Arc::new(ScriptedFetcher::new().with("/v.mp4", Script::succeed_after(3_000)));
    let handle = start(list(&[], &["/v.mp4"]), Arc::clone(&fetcher), &document, &cue);

    sleep_until(start_at + Duration::from_millis(1_000)).await;
    assert!(handle.teardown());
    assert_eq!(document.overflow(), OverflowStyle::Unset);

    let events = handle.drain_events();
    assert_eq!(
        events.last(),
        Some(&RevealEvent::ScrollReleased {
            style: OverflowStyle::Unset,
            elapsed_ms: 1_000
        })
    );

    document.mark_ready_state(ReadyState::Complete);
    for checkpoint in [5_500, 12_000, 14_500] {
        sleep_until(start_at + Duration::from_millis(checkpoint)).await;
        assert_eq!(handle.state(), GateState::Pending, "at {checkpoint}ms");
        assert!(!handle.is_ready());
        assert!(handle.drain_events().is_empty(), "at {checkpoint}ms");
    }

    // The in-flight fetch was not aborted, only ignored.
    assert_eq!(fetcher.completions(), 1);
    assert_eq!(document.overflow(), OverflowStyle::Unset);
    assert_eq!(document.overflow_writes(), 2);
    assert_eq!(cue.plays(), 0);

    let report = handle.report();
    assert!(report.torn_down);
    assert_eq!(report.final_state, GateState::Pending);
    assert!(handle.wait_dismissed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn teardown_during_dismissal_delay_keeps_gate_dismissing() {
    let document = Document::loaded();
    let cue = Arc::new(RecordingCue::default());
    let handle = start(
        ResourceList::empty(),
        Arc::new(ScriptedFetcher::new()),
        &document,
        &cue,
    );

    sleep(Duration::from_millis(6_000)).await;
    assert_eq!(handle.state(), GateState::Dismissing);
    handle.teardown();

    sleep(Duration::from_millis(10_000)).await;
    assert_eq!(handle.state(), GateState::Dismissing);
    assert!(!handle.is_ready());
    assert_eq!(document.overflow(), OverflowStyle::Unset);
    assert_eq!(cue.plays(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn gate_runs_on_multi_thread_runtime() {
    let timing = TimingPolicy::builder()
        .min_intro_ms(20)
        .safety_ceiling_ms(200)
        .dismiss_delay_ms(10)
        .build();
    let cue = Arc::new(RecordingCue::default());
    let handle = RevealGate::builder(&RevealConfig::default())
        .timing(timing)
        .resources(list(&["/a.png"], &[]))
        .fetcher(Arc::new(ScriptedFetcher::new()))
        .document(Document::loaded())
        .audio_cue(Arc::clone(&cue) as _)
        .start()
        .unwrap();

    let report = handle.wait_finished().await;
    assert!(report.is_dismissed());
    assert_eq!(report.winning_path, Some(GatePath::Primary));
    assert_eq!(cue.plays(), 1);
}
