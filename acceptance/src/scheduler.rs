//! Action Scheduler
//!
//! Registry of `(relative time, operation)` pairs. At run time every
//! operation gets its own task which sleeps until the operation's time and
//! then runs it; `run` returns once all of them have finished.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::task::JoinSet;

use crate::clock::VirtualClock;
use crate::error::{HarnessError, HarnessResult};
use crate::failures::FailureLog;

type Operation = Box<dyn FnOnce() -> BoxFuture<'static, HarnessResult<()>> + Send>;

struct ScheduledAction {
    at: f64,
    label: String,
    operation: Operation,
}

/// Cloneable handle; clones register into the same registry
#[derive(Clone)]
pub struct ActionScheduler {
    clock: VirtualClock,
    failures: FailureLog,
    actions: Arc<Mutex<Vec<ScheduledAction>>>,
}

impl ActionScheduler {
    pub fn new(clock: VirtualClock, failures: FailureLog) -> Self {
        Self {
            clock,
            failures,
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register `operation` to run at relative time `at`. Entries at the
    /// same time accumulate; times the clock cannot represent are rejected.
    pub fn schedule<F, Fut>(&self, at: f64, label: impl Into<String>, operation: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = HarnessResult<()>> + Send + 'static,
    {
        let label = label.into();
        if self.clock.deadline(at).is_none() {
            self.failures
                .record(None, format!("schedule {label}"), HarnessError::InvalidTime { at });
            return;
        }

        let operation: Operation = Box::new(move || operation().boxed());
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ScheduledAction { at, label, operation });
    }

    pub fn len(&self) -> usize {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latest relative time of any registered action
    pub fn latest(&self) -> Option<f64> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|action| action.at)
            .reduce(f64::max)
    }

    /// Fire every registered action at its time and wait for all of them.
    ///
    /// Errors and panics are recorded on the failure log; they never stop
    /// sibling actions.
    pub async fn run(&self) {
        let mut actions = std::mem::take(&mut *self.actions.lock().unwrap_or_else(PoisonError::into_inner));
        actions.sort_by(|a, b| a.at.total_cmp(&b.at));

        tracing::info!("⏱️ Firing {} scheduled actions", actions.len());

        let mut tasks = JoinSet::new();

        for ScheduledAction { at, label, operation } in actions {
            let clock = self.clock;
            let failures = self.failures.clone();

            tasks.spawn(async move {
                clock.sleep_until(at).await;
                tracing::debug!("▶️ t={:.3} {} (fired at t={:.3})", at, label, clock.now());

                let outcome = AssertUnwindSafe(async move { operation().await })
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => failures.record(Some(at), label, e),
                    Err(panic) => failures.record(
                        Some(at),
                        label,
                        HarnessError::ActionPanicked {
                            message: panic_message(panic.as_ref()),
                        },
                    ),
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("⚠️ Scheduled action task did not complete: {}", e);
            }
        }

        tracing::info!("✅ All scheduled actions completed");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use chrono::Utc;

    fn scheduler() -> (ActionScheduler, VirtualClock, FailureLog) {
        let clock = VirtualClock::new();
        let failures = FailureLog::new();
        (ActionScheduler::new(clock, failures.clone()), clock, failures)
    }

    #[tokio::test]
    async fn test_actions_never_fire_early() {
        let (scheduler, clock, failures) = scheduler();
        let fired = Arc::new(Mutex::new(Vec::new()));

        for at in [0.15, 0.05, 0.1, 0.1] {
            let fired = fired.clone();
            scheduler.schedule(at, format!("record {at}"), move || async move {
                fired.lock().unwrap().push((at, Utc::now()));
                Ok(())
            });
        }
        assert_eq!(scheduler.len(), 4);
        assert_eq!(scheduler.latest(), Some(0.15));

        scheduler.run().await;

        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 4);
        for (at, when) in fired.iter() {
            assert!(*when >= clock.expand(*at), "action at {at} fired early");
        }
        assert!(scheduler.is_empty());
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_run_waits_for_slowest_action() {
        let (scheduler, clock, _) = scheduler();
        let done = Arc::new(Mutex::new(false));

        let flag = done.clone();
        scheduler.schedule(0.1, "slow", move || async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            *flag.lock().unwrap() = true;
            Ok(())
        });
        scheduler.schedule(0.0, "fast", || async { Ok(()) });

        scheduler.run().await;

        assert!(*done.lock().unwrap());
        assert!(clock.now() >= 0.25);
    }

    #[tokio::test]
    async fn test_same_time_actions_run_concurrently() {
        let (scheduler, _, _) = scheduler();
        let sleep = Duration::from_millis(200);

        for i in 0..5 {
            scheduler.schedule(0.0, format!("sleeper {i}"), move || async move {
                tokio::time::sleep(sleep).await;
                Ok(())
            });
        }

        let started = Instant::now();
        scheduler.run().await;
        let elapsed = started.elapsed();

        assert!(elapsed >= sleep);
        assert!(elapsed < sleep * 3, "actions ran sequentially: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_siblings() {
        let (scheduler, _, failures) = scheduler();
        let ran = Arc::new(Mutex::new(0));

        scheduler.schedule(0.0, "failing", || async {
            Err(HarnessError::NotRunning {
                instance: "am0".to_string(),
            })
        });
        scheduler.schedule(0.0, "panicking", || async {
            let explode = true;
            if explode {
                panic!("boom");
            }
            Ok(())
        });
        for _ in 0..3 {
            let ran = ran.clone();
            scheduler.schedule(0.02, "counting", move || async move {
                *ran.lock().unwrap() += 1;
                Ok(())
            });
        }

        scheduler.run().await;

        assert_eq!(*ran.lock().unwrap(), 3);
        let recorded = failures.drain();
        assert_eq!(recorded.len(), 2);
        assert!(recorded.iter().any(|f| f.context == "failing" && f.at == Some(0.0)));
        assert!(
            recorded
                .iter()
                .any(|f| f.context == "panicking"
                    && matches!(&f.error, HarnessError::ActionPanicked { message } if message == "boom"))
        );
    }

    #[tokio::test]
    async fn test_non_finite_time_is_rejected() {
        let (scheduler, _, failures) = scheduler();
        scheduler.schedule(f64::INFINITY, "never", || async { Ok(()) });
        scheduler.schedule(f64::NAN, "never", || async { Ok(()) });

        assert!(scheduler.is_empty());
        assert_eq!(failures.len(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_time_is_rejected() {
        let (scheduler, _, failures) = scheduler();
        let fired = Arc::new(Mutex::new(false));

        let flag = fired.clone();
        scheduler.schedule(1e20, "far future", move || async move {
            *flag.lock().unwrap() = true;
            Ok(())
        });
        assert!(scheduler.is_empty());

        let started = Instant::now();
        scheduler.run().await;
        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(!*fired.lock().unwrap());

        let failures = failures.drain();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].error, HarnessError::InvalidTime { at } if at == 1e20));
    }
}
