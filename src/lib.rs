// Library surface shared by the CLI and integration tests.
pub mod aggregate;
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod import;
pub mod migration;
pub mod session;
pub mod sessionizer;
pub mod store;
pub mod summary;
pub mod util;

pub use engine::{EngineState, LoadOutcome, StatsEngine};
pub use error::{Result, StatsError};
