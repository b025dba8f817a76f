use thiserror::Error;

// === SurfaceError ===

/// Errors reported by an embedded web surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    /// The platform web view could not be created.
    #[error("Surface creation failed: {0}")]
    CreationFailed(String),
    /// A script could not be evaluated or returned an error.
    #[error("Script evaluation failed: {0}")]
    ScriptFailed(String),
    /// A navigation command or page load failed.
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),
    /// The surface was already detached from its session.
    #[error("Surface detached")]
    Detached,
}

// === StateError ===

/// Errors related to persisted tab state.
#[derive(Debug, Error)]
pub enum StateError {
    /// Database operation failed.
    #[error("State database error: {0}")]
    DatabaseError(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
}

// === ShellError ===

/// Top-level errors surfaced by the shell during startup and tab selection.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The database could not be opened or migrated.
    #[error("Database error: {0}")]
    Database(String),
    /// The timer runtime could not be started.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<rusqlite::Error> for ShellError {
    fn from(e: rusqlite::Error) -> Self {
        ShellError::Database(e.to_string())
    }
}
