//! ChatGate: a desktop shell hosting a chat assistant, a video site and a
//! translator as switchable web tabs.
//!
//! Entry point: opens the main window when built with the `gui` feature.
//! Without it, runs a console demo of the tab lifecycle against simulated
//! web views and a simulated clock.

use chatgate::types::errors::ShellError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "gui")]
fn run() -> Result<(), ShellError> {
    chatgate::ui::webview_app::run()
}

#[cfg(not(feature = "gui"))]
fn run() -> Result<(), ShellError> {
    demo::run()
}

#[cfg(not(feature = "gui"))]
mod demo {
    use std::cell::RefCell;
    use std::sync::Arc;

    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    use chatgate::database::Database;
    use chatgate::managers::inactivity_tracker::{InactivityTracker, TrackerConfig};
    use chatgate::managers::surface_session::SessionContext;
    use chatgate::managers::tab_manager::{TabManager, TabManagerOptions, TabManagerTrait};
    use chatgate::services::clock::{Clock, ManualClock};
    use chatgate::services::scheduler::{ManualScheduler, Scheduler};
    use chatgate::services::state_store::{TabStateStore, TabStateStoreTrait};
    use chatgate::types::errors::{ShellError, SurfaceError};
    use chatgate::types::event::{EventSink, ShellEvent};
    use chatgate::types::surface::{
        ScriptCallback, SessionId, SurfaceBounds, SurfaceHost, SurfaceRequest, WebSurface,
    };
    use chatgate::types::tab::TabKind;

    /// Stand-in web view: every load finishes immediately and the video is
    /// always 42.5 seconds in.
    struct DemoSurface {
        tab: TabKind,
        session: SessionId,
        url: RefCell<String>,
        sink: Arc<dyn EventSink>,
    }

    impl DemoSurface {
        fn finish_load(&self, url: &str) {
            *self.url.borrow_mut() = url.to_string();
            self.sink.post(ShellEvent::NavigationFinished {
                tab: self.tab,
                session: self.session,
                can_go_back: false,
                can_go_forward: false,
                url: url.to_string(),
            });
        }
    }

    impl WebSurface for DemoSurface {
        fn load_url(&self, url: &str) -> Result<(), SurfaceError> {
            println!("  [{}] load {}", self.tab, url);
            self.finish_load(url);
            Ok(())
        }

        fn go_back(&self) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn go_forward(&self) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn reload(&self) -> Result<(), SurfaceError> {
            let url = self.url.borrow().clone();
            self.finish_load(&url);
            Ok(())
        }

        fn current_url(&self) -> Option<String> {
            Some(self.url.borrow().clone())
        }

        fn evaluate_script(&self, _script: &str, on_result: ScriptCallback) -> Result<(), SurfaceError> {
            on_result(Ok("42.5".to_string()));
            Ok(())
        }

        fn run_script(&self, _script: &str) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn set_visible(&self, _visible: bool) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn set_bounds(&self, _bounds: SurfaceBounds) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn detach(&mut self) {
            println!("  [{}] surface released", self.tab);
        }
    }

    struct DemoHost {
        sink: Arc<dyn EventSink>,
    }

    impl SurfaceHost for DemoHost {
        fn create_surface(&mut self, request: SurfaceRequest) -> Result<Box<dyn WebSurface>, SurfaceError> {
            println!("  [{}] surface created", request.tab);
            let surface = DemoSurface {
                tab: request.tab,
                session: request.session,
                url: RefCell::new(String::new()),
                sink: Arc::clone(&self.sink),
            };
            surface.finish_load(&request.url);
            Ok(Box::new(surface))
        }
    }

    fn section(name: &str) {
        println!("───────────────────────────────────────────────────────────────");
        println!("  {}", name);
        println!("───────────────────────────────────────────────────────────────");
    }

    fn pump(tabs: &mut TabManager, rx: &mut UnboundedReceiver<ShellEvent>) {
        while let Ok(event) = rx.try_recv() {
            tabs.handle_event(event);
        }
    }

    fn print_tabs(tabs: &TabManager) {
        let loaded: Vec<String> = tabs.materialized_tabs().iter().map(|t| t.to_string()).collect();
        println!("  selected = {}, loaded = [{}]", tabs.selected(), loaded.join(", "));
    }

    pub fn run() -> Result<(), ShellError> {
        println!();
        println!("ChatGate v{} (demo mode)", env!("CARGO_PKG_VERSION"));
        println!();

        let clock = Arc::new(ManualClock::new(0));
        let scheduler = Arc::new(ManualScheduler::new());
        let db = Arc::new(Database::open_in_memory()?);
        let store = Arc::new(TabStateStore::new(db, clock.clone() as Arc<dyn Clock>));

        let (tx, mut rx) = unbounded_channel::<ShellEvent>();
        let sink: Arc<dyn EventSink> = Arc::new(tx);

        let tracker = InactivityTracker::new(
            clock.clone(),
            scheduler.clone() as Arc<dyn Scheduler>,
            TrackerConfig::default(),
        );
        let ctx = SessionContext {
            scheduler: scheduler.clone(),
            sink: Arc::clone(&sink),
        };
        let mut tabs = TabManager::new(
            Box::new(DemoHost { sink }),
            tracker,
            store.clone(),
            ctx,
            TabManagerOptions::default(),
        );

        section("Lazy materialization");
        tabs.select(TabKind::Chat)?;
        pump(&mut tabs, &mut rx);
        tabs.select(TabKind::Video)?;
        tabs.open_video("dQw4w9WgXcQ")?;
        pump(&mut tabs, &mut rx);
        print_tabs(&tabs);

        section("Resume position capture");
        scheduler.fire_all();
        pump(&mut tabs, &mut rx);
        pump(&mut tabs, &mut rx);
        println!("  saved video URL: {}", store.load(TabKind::Video)?.unwrap_or_default());

        section("Inactivity eviction");
        clock.advance(31 * 60);
        tabs.select(TabKind::Video)?;
        scheduler.fire_all();
        pump(&mut tabs, &mut rx);
        pump(&mut tabs, &mut rx);
        print_tabs(&tabs);

        section("Shutdown");
        tabs.shutdown();
        println!("  active timers: {}", scheduler.active_count());
        println!();
        Ok(())
    }
}
