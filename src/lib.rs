// Library surface for the binary, headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod evaluator;
pub mod judge;
pub mod report;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod timer;
pub mod timings;
pub mod ui;
pub mod util;
