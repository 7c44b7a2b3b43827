//! Configuration Management
//!
//! This module provides the per-test options and their builder.

pub mod builder;
pub mod options;

// Re-export main types
pub use builder::AcceptanceOptsBuilder;
pub use options::AcceptanceOpts;
