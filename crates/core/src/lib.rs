pub mod config;
pub mod error;
pub mod journal;

pub use config::{DatabaseConfig, FailurePolicy, IngestConfig, InvocationMode, ParserConfig};
pub use error::*;
pub use journal::*;
