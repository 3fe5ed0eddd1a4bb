//! # CA Runtime Library
//!
//! Host process pieces for the confirmation subsystem, exposed for testing.
//! The main entry point is the `main.rs` binary.
//!
//! - `config` - defaults, JSON file and `CA_*` environment overrides
//! - `logging` - tracing subscriber with `EnvFilter`
//! - `runtime` - service and sweeper lifecycle

pub mod config;
pub mod logging;
pub mod runtime;

pub use config::{load_config, LoggingConfig, RuntimeConfig};
pub use logging::init_logging;
pub use runtime::CaRuntime;
