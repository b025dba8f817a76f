// ChatGate state managers
// Managers own the shell's mutable state: sessions, selection and idle tracking.

pub mod inactivity_tracker;
pub mod surface_session;
pub mod tab_manager;
