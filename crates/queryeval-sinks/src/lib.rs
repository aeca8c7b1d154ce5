//! queryeval-sinks: Submission sinks and configuration.
//!
//! Implements the `SubmissionSink` trait for an in-memory mock and a
//! simulated remote endpoint, and loads the queryeval configuration file.

pub mod config;
pub mod mock;
pub mod simulated;

pub use config::{create_sink, load_config, load_config_from, QueryevalConfig, SinkConfig};
pub use mock::MockSink;
pub use queryeval_core::error::SubmitError;
pub use simulated::SimulatedSink;
