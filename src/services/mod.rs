// ChatGate services
// Services provide the shell's building blocks: time, timers, persistence, settings and page scripts.

pub mod clock;
pub mod nav_history;
pub mod page_scripts;
pub mod scheduler;
pub mod settings_engine;
pub mod state_store;
