//! Native window using `wry` + `tao`.
//!
//! Architecture:
//! - One window holds a toolbar web view along the top and one child web view
//!   per materialized tab below it. Only the selected tab's view is visible.
//! - The toolbar talks to Rust over IPC (`window.ipc.postMessage`) and is
//!   refreshed through `window.__cg_update(state)` after every handled event.
//! - Web view callbacks, timers and script completions never touch shell
//!   state. They post a `ShellEvent` through the event loop proxy and the loop
//!   hands it to the tab manager.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tao::dpi::LogicalSize;
use tao::event::{ElementState, Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use tao::keyboard::Key;
use tao::window::{Fullscreen, Window, WindowBuilder};
use wry::dpi::{LogicalPosition, LogicalSize as WryLogicalSize, Position, Size};
use wry::{NewWindowResponse, PageLoadEvent, Rect, WebView, WebViewBuilder};

use crate::app::App;
use crate::managers::tab_manager::{TabManager, TabManagerTrait};
use crate::services::nav_history::NavHistory;
use crate::types::errors::{ShellError, SurfaceError};
use crate::types::event::{EventSink, ShellEvent};
use crate::types::surface::{
    ScriptCallback, SessionId, SurfaceBounds, SurfaceHost, SurfaceRequest, WebSurface,
};
use crate::types::tab::TabKind;

const TOOLBAR_HTML: &str = include_str!("../../resources/ui/toolbar.html");

/// Posts events to the tao loop from any thread.
struct ProxySink(Mutex<EventLoopProxy<ShellEvent>>);

impl EventSink for ProxySink {
    fn post(&self, event: ShellEvent) {
        let proxy = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = proxy.send_event(event) {
            log::debug!("Event loop closed, dropping event: {}", e);
        }
    }
}

fn to_rect(bounds: SurfaceBounds) -> Rect {
    Rect {
        position: Position::Logical(LogicalPosition::new(bounds.x, bounds.y)),
        size: Size::Logical(WryLogicalSize::new(bounds.width, bounds.height)),
    }
}

/// Splits the window into toolbar and content areas. Fullscreen gives the
/// whole window to the content.
fn layout(window: &Window, toolbar_height: f64, fullscreen: bool) -> (SurfaceBounds, SurfaceBounds) {
    let size: LogicalSize<f64> = window.inner_size().to_logical(window.scale_factor());
    let bar = if fullscreen { 0.0 } else { toolbar_height.min(size.height) };
    let toolbar = SurfaceBounds {
        x: 0.0,
        y: 0.0,
        width: size.width,
        height: bar,
    };
    let content = SurfaceBounds {
        x: 0.0,
        y: bar,
        width: size.width,
        height: (size.height - bar).max(0.0),
    };
    (toolbar, content)
}

fn lock_history(history: &Mutex<NavHistory>) -> MutexGuard<'_, NavHistory> {
    history.lock().unwrap_or_else(|e| e.into_inner())
}

/// A tab's child web view.
struct WrySurface {
    webview: WebView,
    attached: Arc<AtomicBool>,
    history: Arc<Mutex<NavHistory>>,
}

impl WrySurface {
    fn ensure_attached(&self) -> Result<(), SurfaceError> {
        if self.attached.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SurfaceError::Detached)
        }
    }
}

impl WebSurface for WrySurface {
    fn load_url(&self, url: &str) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        self.webview
            .load_url(url)
            .map_err(|e| SurfaceError::NavigationFailed(e.to_string()))
    }

    fn go_back(&self) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        lock_history(&self.history).request_back();
        self.run_script("history.back();")
    }

    fn go_forward(&self) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        lock_history(&self.history).request_forward();
        self.run_script("history.forward();")
    }

    fn reload(&self) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        lock_history(&self.history).request_reload();
        self.webview
            .reload()
            .map_err(|e| SurfaceError::NavigationFailed(e.to_string()))
    }

    fn current_url(&self) -> Option<String> {
        self.webview.url().ok()
    }

    fn evaluate_script(&self, script: &str, on_result: ScriptCallback) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        let slot = Mutex::new(Some(on_result));
        self.webview
            .evaluate_script_with_callback(script, move |result| {
                let callback = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
                if let Some(callback) = callback {
                    callback(Ok(result));
                }
            })
            .map_err(|e| SurfaceError::ScriptFailed(e.to_string()))
    }

    fn run_script(&self, script: &str) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        self.webview
            .evaluate_script(script)
            .map_err(|e| SurfaceError::ScriptFailed(e.to_string()))
    }

    fn set_visible(&self, visible: bool) -> Result<(), SurfaceError> {
        self.webview
            .set_visible(visible)
            .map_err(|e| SurfaceError::ScriptFailed(e.to_string()))
    }

    fn set_bounds(&self, bounds: SurfaceBounds) -> Result<(), SurfaceError> {
        self.webview
            .set_bounds(to_rect(bounds))
            .map_err(|e| SurfaceError::ScriptFailed(e.to_string()))
    }

    fn detach(&mut self) {
        if !self.attached.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.webview.evaluate_script("window.stop();");
        let _ = self.webview.set_visible(false);
    }
}

/// Builds child web views inside the main window.
struct WrySurfaceHost {
    window: Rc<Window>,
    sink: Arc<dyn EventSink>,
    content: Rc<Cell<SurfaceBounds>>,
    devtools: bool,
}

impl SurfaceHost for WrySurfaceHost {
    fn create_surface(&mut self, request: SurfaceRequest) -> Result<Box<dyn WebSurface>, SurfaceError> {
        let SurfaceRequest {
            tab,
            session,
            url,
            init_scripts,
        } = request;
        let attached = Arc::new(AtomicBool::new(true));
        let history = Arc::new(Mutex::new(NavHistory::new()));

        let mut builder = WebViewBuilder::new()
            .with_url(&url)
            .with_bounds(to_rect(self.content.get()))
            .with_devtools(self.devtools)
            .with_on_page_load_handler(page_load_handler(
                tab,
                session,
                Arc::clone(&self.sink),
                Arc::clone(&attached),
                Arc::clone(&history),
            ))
            .with_new_window_req_handler(new_window_handler(
                tab,
                session,
                Arc::clone(&self.sink),
                Arc::clone(&attached),
            ))
            .with_ipc_handler(page_ipc_handler(Arc::clone(&self.sink), Arc::clone(&attached)));
        for script in init_scripts {
            builder = builder.with_initialization_script(script);
        }

        let webview = builder
            .build_as_child(&*self.window)
            .map_err(|e| SurfaceError::CreationFailed(e.to_string()))?;

        log::debug!("Created web view for {} (session {})", tab, session);
        Ok(Box::new(WrySurface {
            webview,
            attached,
            history,
        }))
    }
}

fn page_load_handler(
    tab: TabKind,
    session: SessionId,
    sink: Arc<dyn EventSink>,
    attached: Arc<AtomicBool>,
    history: Arc<Mutex<NavHistory>>,
) -> impl Fn(PageLoadEvent, String) + 'static {
    move |event, url| {
        if !attached.load(Ordering::SeqCst) {
            return;
        }
        if let PageLoadEvent::Finished = event {
            let (can_go_back, can_go_forward) = {
                let mut history = lock_history(&history);
                history.page_loaded(&url);
                (history.can_go_back(), history.can_go_forward())
            };
            sink.post(ShellEvent::NavigationFinished {
                tab,
                session,
                can_go_back,
                can_go_forward,
                url,
            });
        }
    }
}

fn new_window_handler(
    tab: TabKind,
    session: SessionId,
    sink: Arc<dyn EventSink>,
    attached: Arc<AtomicBool>,
) -> impl Fn(String, wry::NewWindowFeatures) -> NewWindowResponse + 'static {
    move |url, _features| {
        if attached.load(Ordering::SeqCst) {
            sink.post(ShellEvent::NewWindowRequested { tab, session, url });
        }
        NewWindowResponse::Deny
    }
}

fn page_ipc_handler(
    sink: Arc<dyn EventSink>,
    attached: Arc<AtomicBool>,
) -> impl Fn(wry::http::Request<String>) + 'static {
    move |msg| {
        if !attached.load(Ordering::SeqCst) {
            return;
        }
        if let Some(event) = ShellEvent::from_page_message(msg.body()) {
            sink.post(event);
        }
    }
}

fn push_snapshot(toolbar: &WebView, tabs: &TabManager) {
    match serde_json::to_string(&tabs.snapshot()) {
        Ok(json) => {
            let script = format!("window.__cg_update && window.__cg_update({});", json);
            if let Err(e) = toolbar.evaluate_script(&script) {
                log::debug!("Toolbar update failed: {}", e);
            }
        }
        Err(e) => log::warn!("Failed to serialize tab state: {}", e),
    }
}

// ─── Main entry point ───

pub fn run() -> Result<(), ShellError> {
    let app = App::new(None, None)?;
    let settings = app.settings().clone();

    let event_loop = EventLoopBuilder::<ShellEvent>::with_user_event().build();
    let sink: Arc<dyn EventSink> = Arc::new(ProxySink(Mutex::new(event_loop.create_proxy())));

    let window = WindowBuilder::new()
        .with_title("ChatGate")
        .with_inner_size(LogicalSize::new(
            settings.window.width as f64,
            settings.window.height as f64,
        ))
        .with_maximized(settings.window.maximized)
        .build(&event_loop)
        .map_err(|e| ShellError::Runtime(format!("Failed to create window: {}", e)))?;
    let window = Rc::new(window);

    let toolbar_height = settings.window.toolbar_height as f64;
    let (toolbar_bounds, content_bounds) = layout(&window, toolbar_height, false);
    let content = Rc::new(Cell::new(content_bounds));

    let ipc_sink = Arc::clone(&sink);
    let toolbar = WebViewBuilder::new()
        .with_html(TOOLBAR_HTML)
        .with_bounds(to_rect(toolbar_bounds))
        .with_devtools(settings.general.devtools)
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            if let Some(event) = ShellEvent::from_toolbar_message(msg.body()) {
                ipc_sink.post(event);
            }
        })
        .build_as_child(&*window)
        .map_err(|e| ShellError::Runtime(format!("Failed to create toolbar: {}", e)))?;

    let host = WrySurfaceHost {
        window: Rc::clone(&window),
        sink: Arc::clone(&sink),
        content: Rc::clone(&content),
        devtools: settings.general.devtools,
    };
    let key_sink = Arc::clone(&sink);
    let mut tabs = app.build_tab_manager(Box::new(host), sink);
    tabs.relayout(content_bounds);
    if let Err(e) = app.startup(&mut tabs) {
        log::error!("Failed to open start tab: {}", e);
    }

    let mut fullscreen = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        let apply_layout = |tabs: &mut TabManager, fullscreen: bool| {
            let (bar, area) = layout(&window, toolbar_height, fullscreen);
            content.set(area);
            let _ = toolbar.set_bounds(to_rect(bar));
            let _ = toolbar.set_visible(!fullscreen);
            tabs.relayout(area);
        };

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                app.shutdown(&mut tabs);
                *control_flow = ControlFlow::Exit;
            }

            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => apply_layout(&mut tabs, fullscreen),

            // The toolbar is hidden while fullscreen, so Escape is the way out.
            Event::WindowEvent {
                event: WindowEvent::KeyboardInput { event, .. },
                ..
            } if fullscreen
                && event.state == ElementState::Pressed
                && event.logical_key == Key::Escape =>
            {
                key_sink.post(ShellEvent::ExitFullscreen);
            }

            Event::UserEvent(shell_event) => {
                let closing = matches!(shell_event, ShellEvent::Shutdown);
                tabs.handle_event(shell_event);
                if closing {
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                if tabs.is_fullscreen() != fullscreen {
                    fullscreen = tabs.is_fullscreen();
                    window.set_fullscreen(fullscreen.then(|| Fullscreen::Borderless(None)));
                    apply_layout(&mut tabs, fullscreen);
                }
                push_snapshot(&toolbar, &tabs);
            }

            _ => {}
        }
    })
}
