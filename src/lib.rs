// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod generator;
pub mod presenter;
pub mod results;
pub mod round;
pub mod runtime;
pub mod screen;
pub mod session;
pub mod shape;
