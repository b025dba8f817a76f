//! Inactivity tracker.
//!
//! Records when each tab was last shown and, on every scan, reports tabs idle
//! for at least the configured threshold. The tracker only decides which tabs
//! are cold; tearing down their surfaces is the tab manager's job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::services::clock::Clock;
use crate::services::scheduler::{Scheduler, TaskHandle};
use crate::types::event::{EventSink, ShellEvent, TaskId};
use crate::types::tab::TabKind;

/// Receives each tab found idle by a scan.
pub type EvictionHandler = Box<dyn FnMut(TabKind)>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub inactivity_threshold: Duration,
    pub scan_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold: Duration::from_secs(30 * 60),
            scan_interval: Duration::from_secs(60),
        }
    }
}

/// Trait defining the inactivity tracking interface.
pub trait InactivityTrackerTrait {
    fn record_access(&mut self, tab: TabKind);
    fn forget(&mut self, tab: TabKind);
    fn set_eviction_handler(&mut self, handler: EvictionHandler);
    fn scan(&mut self) -> Vec<TabKind>;
    fn start_background_scan(&mut self, sink: Arc<dyn EventSink>);
    fn stop_background_scan(&mut self);
    fn handle_scan_tick(&mut self, task: TaskId) -> Vec<TabKind>;
}

pub struct InactivityTracker {
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    config: TrackerConfig,
    last_access: HashMap<TabKind, i64>,
    on_evict: Option<EvictionHandler>,
    scan_task: Option<TaskHandle>,
}

impl InactivityTracker {
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>, config: TrackerConfig) -> Self {
        Self {
            clock,
            scheduler,
            config,
            last_access: HashMap::new(),
            on_evict: None,
            scan_task: None,
        }
    }

    pub fn config(&self) -> TrackerConfig {
        self.config
    }

    pub fn last_access(&self, tab: TabKind) -> Option<i64> {
        self.last_access.get(&tab).copied()
    }

    pub fn is_tracked(&self, tab: TabKind) -> bool {
        self.last_access.contains_key(&tab)
    }

    /// Tracked tabs in ascending order.
    pub fn tracked_tabs(&self) -> Vec<TabKind> {
        let mut tabs: Vec<TabKind> = self.last_access.keys().copied().collect();
        tabs.sort();
        tabs
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_task.is_some()
    }

    pub fn scan_task(&self) -> Option<TaskId> {
        self.scan_task.as_ref().map(TaskHandle::id)
    }
}

impl InactivityTrackerTrait for InactivityTracker {
    fn record_access(&mut self, tab: TabKind) {
        self.last_access.insert(tab, self.clock.now());
    }

    fn forget(&mut self, tab: TabKind) {
        self.last_access.remove(&tab);
    }

    /// Registers the eviction callback. Only one handler is kept.
    fn set_eviction_handler(&mut self, handler: EvictionHandler) {
        if self.on_evict.is_some() {
            log::warn!("Eviction handler registered twice, replacing the previous one");
        }
        self.on_evict = Some(handler);
    }

    /// Reports and drops every record idle for at least the threshold.
    fn scan(&mut self) -> Vec<TabKind> {
        let now = self.clock.now();
        let threshold =
            i64::try_from(self.config.inactivity_threshold.as_secs()).unwrap_or(i64::MAX);

        let mut stale: Vec<TabKind> = self
            .last_access
            .iter()
            .filter(|(_, last)| now.saturating_sub(**last) >= threshold)
            .map(|(&tab, _)| tab)
            .collect();
        stale.sort();

        for tab in &stale {
            self.last_access.remove(tab);
            log::info!("Tab {} idle for {}s or more, requesting eviction", tab, threshold);
            match self.on_evict.as_mut() {
                Some(handler) => handler(*tab),
                None => log::debug!("No eviction handler registered, dropping record for {}", tab),
            }
        }
        stale
    }

    /// Starts posting scan ticks to `sink`. No-op while already scanning.
    fn start_background_scan(&mut self, sink: Arc<dyn EventSink>) {
        if self.scan_task.is_some() {
            return;
        }
        let handle = self.scheduler.every(
            self.config.scan_interval,
            Box::new(move |task| sink.post(ShellEvent::ScanTick { task })),
        );
        log::debug!(
            "Inactivity scan started (every {:?}, threshold {:?})",
            self.config.scan_interval,
            self.config.inactivity_threshold
        );
        self.scan_task = Some(handle);
    }

    fn stop_background_scan(&mut self) {
        if let Some(mut task) = self.scan_task.take() {
            task.cancel();
            log::debug!("Inactivity scan stopped");
        }
    }

    /// Runs a scan for a tick from the current scan task; stale ticks are ignored.
    fn handle_scan_tick(&mut self, task: TaskId) -> Vec<TabKind> {
        if self.scan_task() != Some(task) {
            log::debug!("Ignoring tick from stopped scan task {}", task);
            return Vec::new();
        }
        self.scan()
    }
}

impl Drop for InactivityTracker {
    fn drop(&mut self) {
        self.stop_background_scan();
    }
}
