use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::managers::inactivity_tracker::{InactivityTracker, InactivityTrackerTrait};
use crate::managers::surface_session::{SessionContext, WebSurfaceSession};
use crate::services::page_scripts::{
    initialization_scripts, is_loadable_url, normalize_video_input, THEATER_ENTER, THEATER_EXIT,
};
use crate::services::state_store::TabStateStoreTrait;
use crate::types::errors::ShellError;
use crate::types::event::ShellEvent;
use crate::types::surface::{SessionId, SurfaceBounds, SurfaceHost, SurfaceRequest};
use crate::types::tab::{ShellSnapshot, TabEntry, TabKind};

/// Trait defining the tab orchestration interface.
pub trait TabManagerTrait {
    fn select(&mut self, tab: TabKind) -> Result<(), ShellError>;
    fn evict(&mut self, tab: TabKind);
    fn go_back(&self);
    fn go_forward(&self);
    fn reload(&self);
    fn open_video(&mut self, input: &str) -> Result<(), ShellError>;
    fn set_fullscreen(&mut self, on: bool);
    fn handle_event(&mut self, event: ShellEvent);
    fn relayout(&mut self, bounds: SurfaceBounds);
    fn snapshot(&self) -> ShellSnapshot;
    fn shutdown(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabManagerOptions {
    /// Period of the video position capture.
    pub capture_interval: Duration,
    /// Reopen every tab at its saved URL instead of only resumable ones.
    pub restore_all_tabs: bool,
    pub start_tab: TabKind,
}

impl Default for TabManagerOptions {
    fn default() -> Self {
        Self {
            capture_interval: Duration::from_secs(5),
            restore_all_tabs: false,
            start_tab: TabKind::Chat,
        }
    }
}

/// Owns the materialized sessions and decides which tab is shown.
///
/// Sessions are created on first selection and torn down when the inactivity
/// tracker reports them idle. The selected tab is never torn down.
pub struct TabManager {
    host: Box<dyn SurfaceHost>,
    tracker: InactivityTracker,
    store: Arc<dyn TabStateStoreTrait>,
    ctx: SessionContext,
    options: TabManagerOptions,
    sessions: HashMap<TabKind, WebSurfaceSession>,
    selected: TabKind,
    fullscreen: bool,
    bounds: Option<SurfaceBounds>,
    shut_down: bool,
}

impl TabManager {
    pub fn new(
        host: Box<dyn SurfaceHost>,
        mut tracker: InactivityTracker,
        store: Arc<dyn TabStateStoreTrait>,
        ctx: SessionContext,
        options: TabManagerOptions,
    ) -> Self {
        let sink = Arc::clone(&ctx.sink);
        tracker.set_eviction_handler(Box::new(move |tab| sink.post(ShellEvent::Evict(tab))));
        tracker.start_background_scan(Arc::clone(&ctx.sink));

        let selected = options.start_tab;
        Self {
            host,
            tracker,
            store,
            ctx,
            options,
            sessions: HashMap::new(),
            selected,
            fullscreen: false,
            bounds: None,
            shut_down: false,
        }
    }

    pub fn selected(&self) -> TabKind {
        self.selected
    }

    pub fn is_materialized(&self, tab: TabKind) -> bool {
        self.sessions.contains_key(&tab)
    }

    pub fn session(&self, tab: TabKind) -> Option<&WebSurfaceSession> {
        self.sessions.get(&tab)
    }

    /// Materialized tabs in tab-bar order.
    pub fn materialized_tabs(&self) -> Vec<TabKind> {
        TabKind::ALL
            .into_iter()
            .filter(|tab| self.sessions.contains_key(tab))
            .collect()
    }

    pub fn tracker(&self) -> &InactivityTracker {
        &self.tracker
    }

    pub fn options(&self) -> &TabManagerOptions {
        &self.options
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// URL a newly materialized tab opens at.
    fn initial_url(&self, tab: TabKind) -> String {
        let default = tab.default_url().to_string();
        if !(tab.restores_last_url() || self.options.restore_all_tabs) {
            return default;
        }
        match self.store.load(tab) {
            Ok(Some(url)) if is_loadable_url(&url) => url,
            Ok(Some(url)) => {
                log::warn!("Ignoring unloadable saved URL for {}: {}", tab, url);
                default
            }
            Ok(None) => default,
            Err(e) => {
                log::warn!("Could not read saved state for {}: {}", tab, e);
                default
            }
        }
    }

    fn materialize(&mut self, tab: TabKind) -> Result<WebSurfaceSession, ShellError> {
        let url = self.initial_url(tab);
        let mut session = WebSurfaceSession::new(tab, self.ctx.clone());

        let surface = self.host.create_surface(SurfaceRequest {
            tab,
            session: session.id(),
            url: url.clone(),
            init_scripts: initialization_scripts(tab),
        })?;
        session.attach_surface(surface);

        let store = Arc::clone(&self.store);
        session.set_state_changed(Box::new(move |url| {
            if let Err(e) = store.save(tab, url) {
                log::warn!("Failed to persist {} state: {}", tab, e);
            }
        }));

        if let Some(bounds) = self.bounds {
            session.set_bounds(bounds);
        }
        if tab.supports_resume() {
            session.start_periodic_capture(self.options.capture_interval);
        }

        log::info!("Materialized {} at {}", tab, url);
        Ok(session)
    }

    /// The session of `tab` if it is still the one identified by `id`.
    fn live_session_mut(&mut self, tab: TabKind, id: SessionId) -> Option<&mut WebSurfaceSession> {
        match self.sessions.get_mut(&tab) {
            Some(session) if session.id() == id => Some(session),
            _ => {
                log::debug!("Discarding event from stale session {} of {}", id, tab);
                None
            }
        }
    }

    fn selected_session(&self) -> Option<&WebSurfaceSession> {
        self.sessions.get(&self.selected)
    }
}

impl TabManagerTrait for TabManager {
    /// Shows `tab`, creating its session first if needed.
    ///
    /// On surface creation failure the previous selection stays in place.
    fn select(&mut self, tab: TabKind) -> Result<(), ShellError> {
        if self.shut_down {
            return Err(ShellError::Runtime("Tab manager is shut down".to_string()));
        }

        if !self.sessions.contains_key(&tab) {
            let session = self.materialize(tab)?;
            self.sessions.insert(tab, session);
        }
        if self.fullscreen && tab != TabKind::Video {
            self.set_fullscreen(false);
        }

        for (kind, session) in &self.sessions {
            session.set_visible(*kind == tab);
        }
        self.selected = tab;
        self.tracker.record_access(tab);
        Ok(())
    }

    fn evict(&mut self, tab: TabKind) {
        if tab == self.selected {
            if self.sessions.contains_key(&tab) {
                log::debug!("Not evicting selected tab {}", tab);
                self.tracker.record_access(tab);
            }
            return;
        }

        if let Some(mut session) = self.sessions.remove(&tab) {
            session.cleanup();
            self.tracker.forget(tab);
            log::info!("Evicted idle tab {}", tab);
        }
    }

    fn go_back(&self) {
        if let Some(session) = self.selected_session() {
            session.go_back();
        }
    }

    fn go_forward(&self) {
        if let Some(session) = self.selected_session() {
            session.go_forward();
        }
    }

    fn reload(&self) {
        if let Some(session) = self.selected_session() {
            session.reload();
        }
    }

    /// Opens a video URL or bare video id in the video tab.
    fn open_video(&mut self, input: &str) -> Result<(), ShellError> {
        let Some(url) = normalize_video_input(input) else {
            log::warn!("Ignoring invalid video input: {:?}", input);
            return Ok(());
        };
        self.select(TabKind::Video)?;
        if let Some(session) = self.sessions.get(&TabKind::Video) {
            session.load_url(&url);
        }
        Ok(())
    }

    /// Enters or leaves fullscreen. Only the video tab can go fullscreen.
    fn set_fullscreen(&mut self, on: bool) {
        if on && self.selected != TabKind::Video {
            log::warn!("Fullscreen is only available on the video tab, not {}", self.selected);
            return;
        }
        self.fullscreen = on;
        if let Some(video) = self.sessions.get(&TabKind::Video) {
            video.run_script(if on { THEATER_ENTER } else { THEATER_EXIT });
        }
    }

    fn handle_event(&mut self, event: ShellEvent) {
        if self.shut_down {
            log::debug!("Shut down, ignoring {:?}", event);
            return;
        }

        match event {
            ShellEvent::Select(tab) => {
                if let Err(e) = self.select(tab) {
                    log::error!("Failed to open {}: {}", tab, e);
                }
            }
            ShellEvent::GoBack => self.go_back(),
            ShellEvent::GoForward => self.go_forward(),
            ShellEvent::Reload => self.reload(),
            ShellEvent::OpenVideo(input) => {
                if let Err(e) = self.open_video(&input) {
                    log::error!("Failed to open video: {}", e);
                }
            }
            ShellEvent::ToggleFullscreen => {
                let on = !self.fullscreen;
                self.set_fullscreen(on);
            }
            ShellEvent::ExitFullscreen => {
                if self.fullscreen {
                    self.set_fullscreen(false);
                }
            }
            ShellEvent::ToolbarReady => {}
            ShellEvent::NavigationFinished {
                tab,
                session,
                can_go_back,
                can_go_forward,
                url,
            } => {
                if let Some(s) = self.live_session_mut(tab, session) {
                    s.on_navigation_finished(can_go_back, can_go_forward, &url);
                }
            }
            ShellEvent::NavigationFailed {
                tab,
                session,
                can_go_back,
                can_go_forward,
                error,
            } => {
                if let Some(s) = self.live_session_mut(tab, session) {
                    s.on_navigation_failed(can_go_back, can_go_forward, &error);
                }
            }
            ShellEvent::NewWindowRequested { tab, session, url } => {
                if !is_loadable_url(&url) {
                    log::debug!("Ignoring new window request for {}", url);
                    return;
                }
                if let Some(s) = self.live_session_mut(tab, session) {
                    s.load_url(&url);
                }
            }
            ShellEvent::ScanTick { task } => {
                self.tracker.handle_scan_tick(task);
            }
            // The scan drops the record before posting; a record present now
            // means the tab was shown after the scan.
            ShellEvent::Evict(tab) if self.tracker.is_tracked(tab) => {
                log::debug!("Tab {} was used since the scan, keeping it", tab);
            }
            ShellEvent::Evict(tab) => self.evict(tab),
            ShellEvent::CaptureTick { tab, task } => {
                if let Some(s) = self.sessions.get_mut(&tab) {
                    s.capture_tick(task);
                }
            }
            ShellEvent::CaptureResult { tab, task, outcome } => match self.sessions.get_mut(&tab) {
                Some(s) => s.finish_capture(task, outcome),
                None => log::debug!("Discarding capture result for closed tab {}", tab),
            },
            ShellEvent::Shutdown => self.shutdown(),
        }
    }

    fn relayout(&mut self, bounds: SurfaceBounds) {
        self.bounds = Some(bounds);
        for session in self.sessions.values() {
            session.set_bounds(bounds);
        }
    }

    fn snapshot(&self) -> ShellSnapshot {
        let current = self.selected_session();
        ShellSnapshot {
            selected: self.selected,
            tabs: TabKind::ALL
                .into_iter()
                .map(|kind| TabEntry {
                    kind,
                    title: kind.title().to_string(),
                    icon: kind.icon().to_string(),
                    loaded: self.sessions.contains_key(&kind),
                    selected: kind == self.selected,
                })
                .collect(),
            can_go_back: current.map_or(false, |s| s.can_go_back()),
            can_go_forward: current.map_or(false, |s| s.can_go_forward()),
            fullscreen: self.fullscreen,
        }
    }

    /// Releases every session and stops the inactivity scan.
    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        for (_, mut session) in self.sessions.drain() {
            session.cleanup();
        }
        self.tracker.stop_background_scan();
        log::info!("Tab manager shut down");
    }
}

impl Drop for TabManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
