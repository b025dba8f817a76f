//! ChatGate: a desktop shell hosting a chat assistant, a video site and a
//! translator as switchable web tabs in one window.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod services;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;
