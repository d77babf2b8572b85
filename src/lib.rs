pub mod args;
pub mod config;
pub mod error;
pub mod probe;

// Re-export commonly used types
pub use args::Args;
pub use config::RunConfig;
pub use error::TraceError;
pub use probe::{TraceOutcome, Tracer};

// Re-export external dependencies commonly used across modules
pub use anyhow::Result;
pub use std::net::IpAddr;
pub use std::time::Duration;
