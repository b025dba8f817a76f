//! Messages handled on the UI event loop.
//!
//! Timers, scripting completions and web view observers run outside the
//! loop's call stack. None of them touch shell state directly: they post a
//! [`ShellEvent`] through an [`EventSink`] and the loop hands it to
//! [`TabManager::handle_event`](crate::managers::tab_manager::TabManager::handle_event).

use serde::Deserialize;
use uuid::Uuid;

use super::errors::SurfaceError;
use super::surface::SessionId;
use super::tab::TabKind;

/// Identity of one scheduled repeating task.
pub type TaskId = Uuid;

#[derive(Debug)]
pub enum ShellEvent {
    /// User picked a tab.
    Select(TabKind),
    GoBack,
    GoForward,
    Reload,
    /// User typed a video URL or id into the toolbar.
    OpenVideo(String),
    ToggleFullscreen,
    /// Leave fullscreen if active. Sent by the Escape key and by the video
    /// page when its player leaves theater mode.
    ExitFullscreen,
    /// The toolbar page finished loading and wants the current state.
    ToolbarReady,

    NavigationFinished {
        tab: TabKind,
        session: SessionId,
        can_go_back: bool,
        can_go_forward: bool,
        url: String,
    },
    NavigationFailed {
        tab: TabKind,
        session: SessionId,
        can_go_back: bool,
        can_go_forward: bool,
        error: String,
    },
    /// A page asked for a new window; it is loaded in place instead.
    NewWindowRequested {
        tab: TabKind,
        session: SessionId,
        url: String,
    },

    /// Inactivity scan timer fired.
    ScanTick { task: TaskId },
    /// The inactivity tracker reported `tab` as idle.
    Evict(TabKind),
    /// Position capture timer fired for `tab`.
    CaptureTick { tab: TabKind, task: TaskId },
    /// Position query issued by capture `task` completed.
    CaptureResult {
        tab: TabKind,
        task: TaskId,
        outcome: Result<String, SurfaceError>,
    },

    Shutdown,
}

/// Posts events onto the UI event loop. Implementations must be callable from
/// any thread.
pub trait EventSink: Send + Sync {
    fn post(&self, event: ShellEvent);
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<ShellEvent> {
    fn post(&self, event: ShellEvent) {
        if let Err(e) = self.send(event) {
            log::debug!("Event loop gone, dropping {:?}", e.0);
        }
    }
}

/// Messages posted by the toolbar page over IPC.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum ToolbarCommand {
    Select { tab: TabKind },
    Back,
    Forward,
    Reload,
    Fullscreen,
    OpenVideo { input: String },
    Ready,
}

impl ShellEvent {
    /// Parses a toolbar IPC message such as `{"cmd":"select","tab":"video"}`.
    pub fn from_toolbar_message(message: &str) -> Option<ShellEvent> {
        let command: ToolbarCommand = match serde_json::from_str(message) {
            Ok(command) => command,
            Err(e) => {
                log::warn!("Unrecognized toolbar message {:?}: {}", message, e);
                return None;
            }
        };
        Some(match command {
            ToolbarCommand::Select { tab } => ShellEvent::Select(tab),
            ToolbarCommand::Back => ShellEvent::GoBack,
            ToolbarCommand::Forward => ShellEvent::GoForward,
            ToolbarCommand::Reload => ShellEvent::Reload,
            ToolbarCommand::Fullscreen => ShellEvent::ToggleFullscreen,
            ToolbarCommand::OpenVideo { input } => ShellEvent::OpenVideo(input),
            ToolbarCommand::Ready => ShellEvent::ToolbarReady,
        })
    }
}

/// Messages posted by hosted pages through the injected scripts.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum PageCommand {
    ExitFullscreen,
}

impl ShellEvent {
    /// Parses a page IPC message. Pages may only ask to leave fullscreen.
    pub fn from_page_message(message: &str) -> Option<ShellEvent> {
        match serde_json::from_str::<PageCommand>(message) {
            Ok(PageCommand::ExitFullscreen) => Some(ShellEvent::ExitFullscreen),
            Err(e) => {
                log::debug!("Ignoring page message {:?}: {}", message, e);
                None
            }
        }
    }
}
