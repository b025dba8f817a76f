//! Unit tests for the TabManager: lazy materialization, selection, eviction,
//! restore, event dispatch and shutdown.

#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use chatgate::managers::tab_manager::{TabManagerOptions, TabManagerTrait};
use chatgate::services::page_scripts::{POSITION_QUERY, THEATER_ENTER, THEATER_EXIT};
use chatgate::services::state_store::TabStateStoreTrait;
use chatgate::types::event::ShellEvent;
use chatgate::types::surface::SurfaceBounds;
use chatgate::types::tab::TabKind;
use common::Harness;
use rstest::rstest;

#[test]
fn nothing_is_materialized_before_selection() {
    let h = Harness::new();
    assert!(h.tabs.materialized_tabs().is_empty());
    assert_eq!(h.host.created(), 0);
    assert!(h.tabs.tracker().is_scanning());
}

#[rstest]
#[case(TabKind::Chat)]
#[case(TabKind::Video)]
#[case(TabKind::Translate)]
fn selecting_twice_materializes_once(#[case] tab: TabKind) {
    let mut h = Harness::new();
    h.select(tab);
    h.select(tab);

    assert_eq!(h.tabs.materialized_tabs(), vec![tab]);
    assert_eq!(h.host.created(), 1);
    assert_eq!(h.tabs.selected(), tab);
    assert!(h.tabs.tracker().is_tracked(tab));
}

#[rstest]
#[case(TabKind::Chat)]
#[case(TabKind::Translate)]
fn non_resumable_tabs_open_default_url(#[case] tab: TabKind) {
    let mut h = Harness::new();
    h.store.save(tab, "https://example.com/saved").unwrap();
    h.select(tab);
    assert_eq!(h.host.latest(tab).unwrap().created_url, tab.default_url());
}

#[test]
fn restore_all_tabs_reopens_saved_urls() {
    let mut h = Harness::with_options(TabManagerOptions {
        restore_all_tabs: true,
        ..TabManagerOptions::default()
    });
    h.store.save(TabKind::Chat, "https://chat.openai.com/c/77").unwrap();
    h.select(TabKind::Chat);
    assert_eq!(
        h.host.latest(TabKind::Chat).unwrap().created_url,
        "https://chat.openai.com/c/77"
    );
}

#[test]
fn video_reopens_at_persisted_url_exactly() {
    let mut h = Harness::new();
    let saved = "https://example.com/watch?v=abc&t=42s";
    h.store.save(TabKind::Video, saved).unwrap();

    h.select(TabKind::Video);

    assert_eq!(h.host.latest(TabKind::Video).unwrap().created_url, saved);
}

#[test]
fn video_without_saved_state_opens_default() {
    let mut h = Harness::new();
    h.select(TabKind::Video);
    assert_eq!(
        h.host.latest(TabKind::Video).unwrap().created_url,
        TabKind::Video.default_url()
    );
}

#[test]
fn unloadable_saved_url_falls_back_to_default() {
    let mut h = Harness::new();
    h.store.save(TabKind::Video, "javascript:alert(1)").unwrap();
    h.select(TabKind::Video);
    assert_eq!(
        h.host.latest(TabKind::Video).unwrap().created_url,
        TabKind::Video.default_url()
    );
}

#[test]
fn init_scripts_depend_on_tab() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.select(TabKind::Video);
    assert_eq!(h.host.latest(TabKind::Chat).unwrap().init_scripts.len(), 1);
    assert_eq!(h.host.latest(TabKind::Video).unwrap().init_scripts.len(), 2);
}

#[test]
fn only_selected_surface_is_visible() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.select(TabKind::Translate);

    assert!(!h.host.latest(TabKind::Chat).unwrap().visible.get());
    assert!(h.host.latest(TabKind::Translate).unwrap().visible.get());

    h.select(TabKind::Chat);
    assert!(h.host.latest(TabKind::Chat).unwrap().visible.get());
    assert!(!h.host.latest(TabKind::Translate).unwrap().visible.get());
}

#[test]
fn surface_creation_failure_keeps_previous_selection() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.host.fail_next.set(true);

    assert!(h.tabs.select(TabKind::Translate).is_err());
    assert_eq!(h.tabs.selected(), TabKind::Chat);
    assert!(!h.tabs.is_materialized(TabKind::Translate));

    h.select(TabKind::Translate);
    assert!(h.tabs.is_materialized(TabKind::Translate));
}

#[test]
fn only_video_captures_position() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    assert!(!h.tabs.session(TabKind::Chat).unwrap().is_capturing());
    h.select(TabKind::Video);
    assert!(h.tabs.session(TabKind::Video).unwrap().is_capturing());
    assert!(h.scheduler.active_periods().contains(&Duration::from_secs(5)));
}

#[test]
fn evicting_selected_tab_is_ignored_and_refreshes_access() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.clock.advance(100);

    h.tabs.evict(TabKind::Chat);

    assert_eq!(h.tabs.materialized_tabs(), vec![TabKind::Chat]);
    assert_eq!(h.tabs.tracker().last_access(TabKind::Chat), Some(100));
}

#[test]
fn evicting_background_tab_releases_it() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.select(TabKind::Video);

    h.tabs.evict(TabKind::Chat);

    assert_eq!(h.tabs.materialized_tabs(), vec![TabKind::Video]);
    assert!(h.host.latest(TabKind::Chat).unwrap().detached.get());
    assert!(!h.tabs.tracker().is_tracked(TabKind::Chat));
}

#[test]
fn evicting_unknown_tab_is_a_no_op() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.tabs.evict(TabKind::Translate);
    assert_eq!(h.tabs.materialized_tabs(), vec![TabKind::Chat]);
}

#[test]
fn evicted_tab_rematerializes_with_new_session() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    let first = h.tabs.session(TabKind::Chat).unwrap().id();
    h.select(TabKind::Video);
    h.tabs.evict(TabKind::Chat);

    h.select(TabKind::Chat);

    assert_ne!(h.tabs.session(TabKind::Chat).unwrap().id(), first);
    assert_eq!(h.host.all(TabKind::Chat).len(), 2);
}

#[test]
fn idle_background_tab_is_evicted_by_scan() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.select(TabKind::Translate);

    h.clock.advance(1801);
    h.fire_timers();

    assert_eq!(h.tabs.materialized_tabs(), vec![TabKind::Translate]);
    assert!(h.tabs.tracker().is_tracked(TabKind::Translate));
}

#[test]
fn tab_shown_after_scan_survives_queued_eviction() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.select(TabKind::Translate);
    h.clock.advance(1801);

    h.scheduler.fire_all();
    let tick = h.rx.try_recv().expect("scan tick");
    h.tabs.handle_event(tick);
    assert!(!h.tabs.tracker().is_tracked(TabKind::Chat));

    h.select(TabKind::Chat);
    h.select(TabKind::Translate);
    h.pump();

    assert_eq!(
        h.tabs.materialized_tabs(),
        vec![TabKind::Chat, TabKind::Translate]
    );
    assert_eq!(h.tabs.tracker().last_access(TabKind::Chat), Some(1801));
    assert!(!h.host.latest(TabKind::Chat).unwrap().detached.get());
}

#[test]
fn recently_used_tab_survives_scan() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.select(TabKind::Translate);
    h.clock.advance(1000);
    h.select(TabKind::Chat);
    h.select(TabKind::Translate);
    h.clock.advance(1000);

    h.fire_timers();

    assert_eq!(h.tabs.materialized_tabs(), vec![TabKind::Chat, TabKind::Translate]);
}

#[test]
fn navigation_commands_target_selected_session() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.select(TabKind::Translate);

    h.tabs.handle_event(ShellEvent::GoBack);
    h.tabs.handle_event(ShellEvent::GoForward);
    h.tabs.handle_event(ShellEvent::Reload);

    assert!(h.host.latest(TabKind::Chat).unwrap().calls().is_empty());
    assert_eq!(
        h.host.latest(TabKind::Translate).unwrap().calls(),
        vec!["back", "forward", "reload"]
    );
}

#[test]
fn commands_without_selection_are_no_ops() {
    let h = Harness::new();
    h.tabs.go_back();
    h.tabs.go_forward();
    h.tabs.reload();
    assert_eq!(h.host.created(), 0);
}

#[test]
fn navigation_events_update_snapshot_and_store() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.navigate(TabKind::Chat, "https://chat.openai.com/c/5");

    let snapshot = h.tabs.snapshot();
    assert!(snapshot.can_go_back);
    assert!(!snapshot.can_go_forward);
    assert_eq!(
        h.store.load(TabKind::Chat).unwrap().as_deref(),
        Some("https://chat.openai.com/c/5")
    );
}

#[test]
fn events_from_stale_sessions_are_discarded() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    let old = h.tabs.session(TabKind::Chat).unwrap().id();
    h.select(TabKind::Video);
    h.tabs.evict(TabKind::Chat);
    h.select(TabKind::Chat);

    h.tabs.handle_event(ShellEvent::NavigationFinished {
        tab: TabKind::Chat,
        session: old,
        can_go_back: true,
        can_go_forward: true,
        url: "https://chat.openai.com/stale".to_string(),
    });
    h.tabs.handle_event(ShellEvent::NewWindowRequested {
        tab: TabKind::Chat,
        session: old,
        url: "https://chat.openai.com/popup".to_string(),
    });

    let session = h.tabs.session(TabKind::Chat).unwrap();
    assert!(!session.can_go_back());
    assert_eq!(session.current_url(), "");
    assert_eq!(h.store.load(TabKind::Chat).unwrap(), None);
    assert!(h.host.latest(TabKind::Chat).unwrap().calls().is_empty());
}

#[test]
fn new_window_requests_load_in_place() {
    let mut h = Harness::new();
    h.select(TabKind::Translate);
    let session = h.tabs.session(TabKind::Translate).unwrap().id();

    h.tabs.handle_event(ShellEvent::NewWindowRequested {
        tab: TabKind::Translate,
        session,
        url: "https://translate.google.com/about".to_string(),
    });
    h.tabs.handle_event(ShellEvent::NewWindowRequested {
        tab: TabKind::Translate,
        session,
        url: "file:///etc/passwd".to_string(),
    });

    assert_eq!(
        h.host.latest(TabKind::Translate).unwrap().calls(),
        vec!["load https://translate.google.com/about"]
    );
}

#[test]
fn video_capture_round_trip_through_event_loop() {
    let mut h = Harness::new();
    h.select(TabKind::Video);
    h.navigate(TabKind::Video, "https://www.youtube.com/watch?v=abc");

    h.fire_timers();
    let probe = h.host.latest(TabKind::Video).unwrap();
    assert_eq!(probe.scripts(), vec![POSITION_QUERY.to_string()]);
    probe.resolve_scripts(Ok("61.2".to_string()));
    h.pump();

    assert_eq!(
        h.store.load(TabKind::Video).unwrap().as_deref(),
        Some("https://www.youtube.com/watch?v=abc&t=61s")
    );
}

#[test]
fn capture_result_after_eviction_is_discarded() {
    let mut h = Harness::new();
    h.select(TabKind::Video);
    h.navigate(TabKind::Video, "https://www.youtube.com/watch?v=abc");
    h.fire_timers();
    let probe = h.host.latest(TabKind::Video).unwrap();

    h.select(TabKind::Chat);
    h.tabs.evict(TabKind::Video);
    probe.resolve_scripts(Ok("300".to_string()));
    h.pump();

    assert_eq!(
        h.store.load(TabKind::Video).unwrap().as_deref(),
        Some("https://www.youtube.com/watch?v=abc")
    );
}

#[test]
fn open_video_accepts_ids() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);

    h.tabs.handle_event(ShellEvent::OpenVideo("dQw4w9WgXcQ".to_string()));

    assert_eq!(h.tabs.selected(), TabKind::Video);
    assert_eq!(
        h.host.latest(TabKind::Video).unwrap().calls(),
        vec!["load https://www.youtube.com/watch?v=dQw4w9WgXcQ"]
    );
}

#[test]
fn open_video_ignores_invalid_input() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.tabs.open_video("not a video").unwrap();
    assert_eq!(h.tabs.selected(), TabKind::Chat);
    assert!(!h.tabs.is_materialized(TabKind::Video));
}

#[test]
fn fullscreen_toggles_theater_mode_on_video() {
    let mut h = Harness::new();
    h.select(TabKind::Video);

    h.tabs.handle_event(ShellEvent::ToggleFullscreen);
    assert!(h.tabs.is_fullscreen());
    assert!(h.tabs.snapshot().fullscreen);
    h.tabs.handle_event(ShellEvent::ToggleFullscreen);
    assert!(!h.tabs.is_fullscreen());

    assert_eq!(
        h.host.latest(TabKind::Video).unwrap().scripts(),
        vec![THEATER_ENTER.to_string(), THEATER_EXIT.to_string()]
    );
}

#[test]
fn fullscreen_is_refused_off_the_video_tab() {
    let mut h = Harness::new();
    h.select(TabKind::Video);
    h.select(TabKind::Chat);

    h.tabs.set_fullscreen(true);
    h.tabs.handle_event(ShellEvent::ToggleFullscreen);

    assert!(!h.tabs.is_fullscreen());
    assert!(h.host.latest(TabKind::Video).unwrap().scripts().is_empty());
}

#[test]
fn exit_fullscreen_event_leaves_theater_mode() {
    let mut h = Harness::new();
    h.select(TabKind::Video);
    h.tabs.set_fullscreen(true);

    h.tabs.handle_event(ShellEvent::ExitFullscreen);
    assert!(!h.tabs.is_fullscreen());
    h.tabs.handle_event(ShellEvent::ExitFullscreen);

    assert_eq!(
        h.host.latest(TabKind::Video).unwrap().scripts(),
        vec![THEATER_ENTER.to_string(), THEATER_EXIT.to_string()]
    );
}

#[test]
fn switching_away_from_video_leaves_fullscreen() {
    let mut h = Harness::new();
    h.select(TabKind::Video);
    h.tabs.set_fullscreen(true);

    h.select(TabKind::Translate);

    assert!(!h.tabs.is_fullscreen());
    assert!(!h.tabs.snapshot().fullscreen);
    assert_eq!(
        h.host.latest(TabKind::Video).unwrap().scripts().last(),
        Some(&THEATER_EXIT.to_string())
    );
}

#[test]
fn relayout_resizes_existing_and_new_surfaces() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    let bounds = SurfaceBounds {
        x: 0.0,
        y: 44.0,
        width: 1280.0,
        height: 756.0,
    };

    h.tabs.relayout(bounds);
    h.select(TabKind::Translate);

    assert_eq!(h.host.latest(TabKind::Chat).unwrap().bounds.get(), Some(bounds));
    assert_eq!(h.host.latest(TabKind::Translate).unwrap().bounds.get(), Some(bounds));
}

#[test]
fn snapshot_lists_all_tabs_in_order() {
    let mut h = Harness::new();
    h.select(TabKind::Translate);

    let snapshot = h.tabs.snapshot();
    let kinds: Vec<TabKind> = snapshot.tabs.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, TabKind::ALL.to_vec());
    assert_eq!(snapshot.selected, TabKind::Translate);
    let translate = &snapshot.tabs[2];
    assert!(translate.loaded && translate.selected);
    assert!(!snapshot.tabs[0].loaded);
    assert_eq!(snapshot.tabs[1].title, "YouTube");
}

#[test]
fn shutdown_releases_everything_and_is_idempotent() {
    let mut h = Harness::new();
    h.select(TabKind::Chat);
    h.select(TabKind::Video);

    h.tabs.handle_event(ShellEvent::Shutdown);
    h.tabs.shutdown();

    assert!(h.tabs.is_shut_down());
    assert!(h.tabs.materialized_tabs().is_empty());
    assert_eq!(h.scheduler.active_count(), 0);
    assert!(h.host.latest(TabKind::Chat).unwrap().detached.get());
    assert!(h.host.latest(TabKind::Video).unwrap().detached.get());

    assert!(h.tabs.select(TabKind::Chat).is_err());
    h.tabs.handle_event(ShellEvent::Select(TabKind::Translate));
    assert_eq!(h.host.created(), 2);
}
