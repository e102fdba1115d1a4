//! Job processing worker.
//!
//! This crate provides:
//! - The per-message state machine (strategy dispatch, staged progress,
//!   result persistence, failure containment)
//! - The polling worker loop with graceful shutdown
//! - Structured per-job logging

pub mod config;
pub mod error;
pub mod executor;
pub mod handler;
pub mod logging;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{Lifecycle, ShutdownHandle, WorkerLoop};
pub use handler::MessageHandler;
pub use logging::JobLogger;
