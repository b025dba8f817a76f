// ChatGate platform paths
//
// - Linux:   ~/.config/chatgate, ~/.local/share/chatgate
// - macOS:   ~/Library/Application Support/ChatGate (config and data)
// - Windows: %APPDATA%\ChatGate (config and data)

use std::path::PathBuf;

#[cfg(target_os = "linux")]
const APP_DIR_NAME: &str = "chatgate";

#[cfg(not(target_os = "linux"))]
const APP_DIR_NAME: &str = "ChatGate";

fn fallback_base() -> PathBuf {
    std::env::temp_dir()
}

/// Returns the platform-specific configuration directory for ChatGate.
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(fallback_base)
        .join(APP_DIR_NAME)
}

/// Returns the platform-specific data directory for ChatGate.
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(fallback_base).join(APP_DIR_NAME)
}
