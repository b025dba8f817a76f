use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::tab::TabKind;

/// Top-level shell settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShellSettings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub performance: PerformanceSettings,
    #[serde(default)]
    pub window: WindowSettings,
}

/// General shell behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSettings {
    /// Tab selected when the window opens.
    pub start_tab: TabKind,
    /// Reopen every tab at its last URL, not only the video tab.
    pub restore_all_tabs: bool,
    pub devtools: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            start_tab: TabKind::Chat,
            restore_all_tabs: false,
            devtools: false,
        }
    }
}

/// Memory reclamation and persistence timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSettings {
    /// Idle time after which a background tab's surface is released.
    pub inactivity_threshold_secs: u64,
    pub scan_interval_secs: u64,
    /// How often the video position is captured.
    pub capture_interval_secs: u64,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            inactivity_threshold_secs: 30 * 60,
            scan_interval_secs: 60,
            capture_interval_secs: 5,
        }
    }
}

impl PerformanceSettings {
    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_secs(self.inactivity_threshold_secs)
    }

    /// Scan period, never shorter than one second.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    /// Capture period, never shorter than one second.
    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs(self.capture_interval_secs.max(1))
    }
}

/// Main window geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    /// Open the window covering the visible screen area.
    pub maximized: bool,
    /// Height of the toolbar strip above the tab content.
    pub toolbar_height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            maximized: true,
            toolbar_height: 44,
        }
    }
}
