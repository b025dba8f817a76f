//! The rendering-surface capability the shell is built on.
//!
//! A [`SurfaceHost`] creates one [`WebSurface`] per materialized tab. The
//! surface reports navigation back to the event loop as
//! [`ShellEvent`](super::event::ShellEvent)s tagged with the owning
//! [`SessionId`], so a report arriving after the session was torn down can be
//! recognised and dropped.

use uuid::Uuid;

use super::errors::SurfaceError;
use super::tab::TabKind;

/// Identity of one web surface session. A re-materialized tab gets a new id.
pub type SessionId = Uuid;

/// Completion for [`WebSurface::evaluate_script`]. Receives the JSON-encoded
/// script result or the evaluation error. May be invoked from any thread.
pub type ScriptCallback = Box<dyn FnOnce(Result<String, SurfaceError>) + Send>;

/// Area of the window occupied by the content surfaces, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Everything the host needs to build a surface for a tab.
#[derive(Debug, Clone)]
pub struct SurfaceRequest {
    pub tab: TabKind,
    pub session: SessionId,
    pub url: String,
    /// Scripts the engine runs at document start on every page load.
    pub init_scripts: Vec<&'static str>,
}

/// An embedded web page renderer.
pub trait WebSurface {
    fn load_url(&self, url: &str) -> Result<(), SurfaceError>;
    fn go_back(&self) -> Result<(), SurfaceError>;
    fn go_forward(&self) -> Result<(), SurfaceError>;
    fn reload(&self) -> Result<(), SurfaceError>;
    /// URL currently displayed, if the engine can report it.
    fn current_url(&self) -> Option<String>;
    /// Evaluates `script` and hands its result to `on_result` asynchronously.
    fn evaluate_script(&self, script: &str, on_result: ScriptCallback) -> Result<(), SurfaceError>;
    /// Evaluates `script` without waiting for a result.
    fn run_script(&self, script: &str) -> Result<(), SurfaceError>;
    fn set_visible(&self, visible: bool) -> Result<(), SurfaceError>;
    fn set_bounds(&self, bounds: SurfaceBounds) -> Result<(), SurfaceError>;
    /// Stops loading, revokes navigation observers and hides the surface.
    /// After this call the surface must not post any further events.
    fn detach(&mut self);
}

/// The UI layer's factory for web surfaces.
pub trait SurfaceHost {
    fn create_surface(&mut self, request: SurfaceRequest) -> Result<Box<dyn WebSurface>, SurfaceError>;
}
