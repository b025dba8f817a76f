//! Web surface session: the per-tab owner of one embedded web surface.
//!
//! A session forwards navigation commands to its surface, mirrors the
//! surface's navigation state, and for resumable tabs periodically captures
//! the playback position so the tab can reopen where it was left.
//!
//! Capture runs in three steps, each on the event loop:
//! 1. the scheduler posts `CaptureTick { task }`;
//! 2. [`WebSurfaceSession::capture_tick`] issues the position query, whose
//!    completion posts `CaptureResult { task, outcome }`;
//! 3. [`WebSurfaceSession::finish_capture`] persists the URL.
//!
//! Steps 2 and 3 drop anything whose `task` is not the running capture task,
//! which is how results arriving after [`WebSurfaceSession::cleanup`] are
//! discarded.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::services::page_scripts::{compose_resume_url, parse_position, POSITION_QUERY};
use crate::services::scheduler::{Scheduler, TaskHandle};
use crate::types::errors::SurfaceError;
use crate::types::event::{EventSink, ShellEvent, TaskId};
use crate::types::surface::{SessionId, SurfaceBounds, WebSurface};
use crate::types::tab::TabKind;

/// Called with the URL to persist whenever the session's state changes.
pub type StateChangedCallback = Box<dyn FnMut(&str)>;

/// Services a session needs to schedule work and report back to the loop.
#[derive(Clone)]
pub struct SessionContext {
    pub scheduler: Arc<dyn Scheduler>,
    pub sink: Arc<dyn EventSink>,
}

pub struct WebSurfaceSession {
    id: SessionId,
    tab: TabKind,
    ctx: SessionContext,
    surface: Option<Box<dyn WebSurface>>,
    can_go_back: bool,
    can_go_forward: bool,
    current_url: String,
    on_state_changed: Option<StateChangedCallback>,
    capture: Option<TaskHandle>,
}

impl WebSurfaceSession {
    pub fn new(tab: TabKind, ctx: SessionContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            tab,
            ctx,
            surface: None,
            can_go_back: false,
            can_go_forward: false,
            current_url: String::new(),
            on_state_changed: None,
            capture: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tab(&self) -> TabKind {
        self.tab
    }

    pub fn can_go_back(&self) -> bool {
        self.can_go_back
    }

    pub fn can_go_forward(&self) -> bool {
        self.can_go_forward
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn capture_task(&self) -> Option<TaskId> {
        self.capture.as_ref().map(TaskHandle::id)
    }

    /// Hands the session the surface it controls.
    pub fn attach_surface(&mut self, surface: Box<dyn WebSurface>) {
        if let Some(mut previous) = self.surface.replace(surface) {
            log::warn!("Session for {} attached twice, detaching the previous surface", self.tab);
            previous.detach();
        }
    }

    pub fn set_state_changed(&mut self, callback: StateChangedCallback) {
        self.on_state_changed = Some(callback);
    }

    fn with_surface<F>(&self, action: &str, f: F)
    where
        F: FnOnce(&dyn WebSurface) -> Result<(), SurfaceError>,
    {
        match self.surface.as_deref() {
            Some(surface) => {
                if let Err(e) = f(surface) {
                    log::warn!("{} on {} failed: {}", action, self.tab, e);
                }
            }
            None => log::debug!("{} ignored, {} has no surface", action, self.tab),
        }
    }

    pub fn go_back(&self) {
        self.with_surface("Back", |s| s.go_back());
    }

    pub fn go_forward(&self) {
        self.with_surface("Forward", |s| s.go_forward());
    }

    pub fn reload(&self) {
        self.with_surface("Reload", |s| s.reload());
    }

    pub fn load_url(&self, url: &str) {
        self.with_surface("Load", |s| s.load_url(url));
    }

    pub fn run_script(&self, script: &str) {
        self.with_surface("Script", |s| s.run_script(script));
    }

    pub fn set_visible(&self, visible: bool) {
        self.with_surface("Visibility change", |s| s.set_visible(visible));
    }

    pub fn set_bounds(&self, bounds: SurfaceBounds) {
        self.with_surface("Resize", |s| s.set_bounds(bounds));
    }

    /// Mirrors a finished navigation and persists its URL.
    pub fn on_navigation_finished(&mut self, can_go_back: bool, can_go_forward: bool, url: &str) {
        self.can_go_back = can_go_back;
        self.can_go_forward = can_go_forward;
        self.current_url = url.to_string();
        self.notify_state_changed(url);
    }

    /// Mirrors the history flags after a failed load. The URL and the
    /// persisted state are left alone.
    pub fn on_navigation_failed(&mut self, can_go_back: bool, can_go_forward: bool, error: &str) {
        log::warn!("Navigation in {} failed: {}", self.tab, error);
        self.can_go_back = can_go_back;
        self.can_go_forward = can_go_forward;
    }

    fn notify_state_changed(&mut self, url: &str) {
        if let Some(callback) = self.on_state_changed.as_mut() {
            callback(url);
        }
    }

    /// The URL the surface shows now, or the last finished navigation.
    fn live_url(&self) -> String {
        self.surface
            .as_ref()
            .and_then(|s| s.current_url())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.current_url.clone())
    }

    /// Starts capturing every `interval`, replacing any running capture.
    pub fn start_periodic_capture(&mut self, interval: Duration) {
        self.stop_periodic_capture();
        let sink = self.ctx.sink.clone();
        let tab = self.tab;
        let handle = self.ctx.scheduler.every(
            interval,
            Box::new(move |task| sink.post(ShellEvent::CaptureTick { tab, task })),
        );
        log::debug!("Capture for {} started every {:?}", self.tab, interval);
        self.capture = Some(handle);
    }

    pub fn stop_periodic_capture(&mut self) {
        if let Some(mut task) = self.capture.take() {
            task.cancel();
        }
    }

    /// Handles one capture tick from the scheduler.
    pub fn capture_tick(&mut self, task: TaskId) {
        if self.capture_task() != Some(task) {
            log::debug!("Dropping tick from stale capture task {}", task);
            return;
        }
        let Some(surface) = self.surface.as_deref() else {
            return;
        };

        if !self.tab.supports_resume() {
            let url = self.live_url();
            if !url.is_empty() {
                self.current_url = url.clone();
                self.notify_state_changed(&url);
            }
            return;
        }

        let sink = self.ctx.sink.clone();
        let tab = self.tab;
        let issued = surface.evaluate_script(
            POSITION_QUERY,
            Box::new(move |outcome| sink.post(ShellEvent::CaptureResult { tab, task, outcome })),
        );
        if let Err(e) = issued {
            self.finish_capture(task, Err(e));
        }
    }

    /// Persists the outcome of a position query issued by capture `task`.
    pub fn finish_capture(&mut self, task: TaskId, outcome: Result<String, SurfaceError>) {
        if self.capture_task() != Some(task) || self.surface.is_none() {
            log::debug!("Discarding capture result of task {} for {}", task, self.tab);
            return;
        }

        let url = self.live_url();
        if url.is_empty() {
            return;
        }

        let position = match outcome {
            Ok(raw) => parse_position(&raw),
            Err(e) => {
                log::debug!("Position query in {} failed: {}", self.tab, e);
                None
            }
        };
        let to_save = position
            .and_then(|secs| compose_resume_url(&url, secs))
            .unwrap_or_else(|| url.clone());

        self.current_url = url;
        self.notify_state_changed(&to_save);
    }

    /// Releases everything the session holds. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        self.stop_periodic_capture();
        if let Some(mut surface) = self.surface.take() {
            surface.detach();
            log::debug!("Released surface of {}", self.tab);
        }
        self.on_state_changed = None;
    }
}

impl Drop for WebSurfaceSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}
