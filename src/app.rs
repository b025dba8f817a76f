//! App core for ChatGate.
//!
//! Holds the long-lived services (settings, database, state store, clock and
//! the timer runtime) and builds the tab manager the UI layer drives.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::database::connection::Database;
use crate::managers::inactivity_tracker::{InactivityTracker, TrackerConfig};
use crate::managers::surface_session::SessionContext;
use crate::managers::tab_manager::{TabManager, TabManagerOptions, TabManagerTrait};
use crate::platform;
use crate::services::clock::{Clock, SystemClock};
use crate::services::scheduler::{Scheduler, TokioScheduler};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::state_store::TabStateStore;
use crate::types::errors::ShellError;
use crate::types::event::EventSink;
use crate::types::settings::ShellSettings;
use crate::types::surface::SurfaceHost;

const DATABASE_FILE: &str = "chatgate.db";

/// Central application struct holding the shell's services.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub db: Arc<Database>,
    pub store: Arc<TabStateStore>,
    pub clock: Arc<dyn Clock>,
    pub scheduler: Arc<dyn Scheduler>,
    runtime: Runtime,
}

impl App {
    /// Opens the state database and loads settings.
    ///
    /// `None` paths use the platform data and config directories. Unreadable
    /// settings fall back to defaults with a warning.
    pub fn new(data_dir: Option<PathBuf>, settings_path: Option<PathBuf>) -> Result<Self, ShellError> {
        let data_dir = data_dir.unwrap_or_else(platform::get_data_dir);
        fs::create_dir_all(&data_dir)
            .map_err(|e| ShellError::Runtime(format!("Failed to create data directory: {}", e)))?;

        let db = Arc::new(Database::open(data_dir.join(DATABASE_FILE))?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(TabStateStore::new(Arc::clone(&db), Arc::clone(&clock)));

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("chatgate-timers")
            .enable_time()
            .build()
            .map_err(|e| ShellError::Runtime(format!("Failed to start timer runtime: {}", e)))?;
        let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(runtime.handle().clone()));

        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            log::warn!("Using default settings: {}", e);
        }

        log::debug!("State database at {}", data_dir.join(DATABASE_FILE).display());

        Ok(Self {
            settings_engine,
            db,
            store,
            clock,
            scheduler,
            runtime,
        })
    }

    pub fn settings(&self) -> &ShellSettings {
        self.settings_engine.get_settings()
    }

    pub fn runtime_handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        let perf = &self.settings().performance;
        TrackerConfig {
            inactivity_threshold: perf.inactivity_threshold(),
            scan_interval: perf.scan_interval(),
        }
    }

    pub fn tab_manager_options(&self) -> TabManagerOptions {
        let settings = self.settings();
        TabManagerOptions {
            capture_interval: settings.performance.capture_interval(),
            restore_all_tabs: settings.general.restore_all_tabs,
            start_tab: settings.general.start_tab,
        }
    }

    /// Builds the tab manager on top of the app's services.
    pub fn build_tab_manager(&self, host: Box<dyn SurfaceHost>, sink: Arc<dyn EventSink>) -> TabManager {
        let tracker = InactivityTracker::new(
            Arc::clone(&self.clock),
            Arc::clone(&self.scheduler),
            self.tracker_config(),
        );
        let ctx = SessionContext {
            scheduler: Arc::clone(&self.scheduler),
            sink,
        };
        TabManager::new(host, tracker, self.store.clone(), ctx, self.tab_manager_options())
    }

    /// Startup sequence: show the configured start tab.
    pub fn startup(&self, tabs: &mut TabManager) -> Result<(), ShellError> {
        let start = self.settings().general.start_tab;
        log::info!("Starting on {} tab", start);
        tabs.select(start)
    }

    /// Shutdown sequence: release every surface and stop the timers.
    pub fn shutdown(&self, tabs: &mut TabManager) {
        tabs.shutdown();
    }
}
