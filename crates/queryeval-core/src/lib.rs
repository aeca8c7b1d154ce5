//! queryeval-core: Annotation session engine, data model, and statistics.
//!
//! This crate defines the task and response model, the navigation and
//! submission state machine, and the timing bookkeeping that the rest of
//! queryeval builds on.

pub mod clock;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod form;
pub mod model;
pub mod parser;
pub mod records;
pub mod report;
pub mod session;
pub mod statistics;
pub mod traits;
