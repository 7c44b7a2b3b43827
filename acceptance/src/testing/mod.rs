//! Testing Framework
//!
//! Declarative alerts, silences and expectation windows, and the collectors
//! reconciling them against what was delivered.

pub mod alert;
pub mod collector;
pub mod interval;
pub mod report;

// Re-export main types
pub use alert::{SilenceHandle, TestAlert, TestSilence, alert, alerts_equal, batches_equal, expand_batch};
pub use collector::Collector;
pub use interval::Interval;
pub use report::{Expectation, Observation, Report, Satisfied};
