//! Failure collection point for recoverable operational errors
//!
//! Scheduled actions run concurrently; whatever goes wrong inside them is
//! funneled here instead of aborting sibling actions. The orchestrator
//! drains the log at the end of the run.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::HarnessError;

/// A recoverable error recorded during a run
#[derive(Debug)]
pub struct Failure {
    /// Relative time at which the failing operation ran, if known
    pub at: Option<f64>,
    pub context: String,
    pub error: HarnessError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.at {
            Some(at) => write!(f, "[t={at:.3}] {}: {}", self.context, self.error),
            None => write!(f, "{}: {}", self.context, self.error),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    failures: Arc<Mutex<Vec<Failure>>>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, at: Option<f64>, context: impl Into<String>, error: HarnessError) {
        let failure = Failure {
            at,
            context: context.into(),
            error,
        };
        tracing::error!("❌ {}", failure);
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }

    pub fn len(&self) -> usize {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every recorded failure, leaving the log empty
    pub fn drain(&self) -> Vec<Failure> {
        std::mem::take(&mut *self.failures.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
