//! Alertmanager Acceptance Harness
//!
//! Runs real Alertmanager processes against a scripted timeline and checks
//! that the notifications they deliver arrive within the expected windows.
//!
//! ## Main Interface
//!
//! The primary interface is [`AcceptanceTest`]: declare instances and
//! collectors, schedule pushes and silences on the relative time axis,
//! state expectations, then [`run`](AcceptanceTest::run) it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ::acceptance::*;
//!
//! # async fn example() -> HarnessResult<()> {
//! let mut test = AcceptanceTest::new(AcceptanceOpts::default());
//! let collector = test.collector("webhook").await?;
//! let am = test.alertmanager(&webhook_config("default", &collector.url(), "1s", "1s"))?;
//!
//! let firing = alert([("alertname", "test1")]).active(1.0, None);
//! am.push(1.0, &[firing.clone()]);
//! collector.expect(Interval::between(2.0, 2.5), &[firing]);
//!
//! test.run().await?.assert_passed();
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod acceptance;
pub mod clock;
pub mod config;
pub mod error;
pub mod failures;
pub mod runtime;
pub mod scenarios;
pub mod scheduler;
pub mod testing;

// Main interfaces - re-exported at crate root for convenience
pub use acceptance::{AcceptanceTest, TestOutcome, TestState};
pub use config::{AcceptanceOpts, AcceptanceOptsBuilder};
pub use error::{HarnessError, HarnessResult};

// Supporting types
pub use clock::VirtualClock;
pub use failures::{Failure, FailureLog};
pub use runtime::{AlertmanagerApi, ApiClient, ManagedInstance, WebhookReceiver};
pub use scenarios::{TestScenarios, webhook_config};
pub use scheduler::ActionScheduler;
pub use testing::{Collector, Interval, Report, SilenceHandle, TestAlert, TestSilence, alert};
