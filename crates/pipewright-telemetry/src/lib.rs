//! Structured logging for services hosting Pipewright chains.
//!
//! Pipewright chains emit `tracing` events when a pre-step group
//! short-circuits, when post-steps are skipped for a cancelled request and
//! when a misassembled chain fails a request. This crate installs a
//! `tracing-subscriber` that renders those events as JSON (production) or
//! pretty text (development).
//!
//! # Example
//!
//! ```rust,ignore
//! use pipewright_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!("chains ready");
//! ```

#![doc(html_root_url = "https://docs.rs/pipewright-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
