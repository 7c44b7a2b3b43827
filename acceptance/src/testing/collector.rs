//! Collector
//!
//! A logical notification destination. It accumulates expected batches
//! (each with the window it should arrive in) during test declaration and
//! real observations after the run, then reconciles the two.

use std::sync::{Mutex, PoisonError};

use chrono::TimeDelta;
use shared::Alert;

use super::alert::{TestAlert, batches_equal, expand_batch};
use super::interval::Interval;
use super::report::{Expectation, Observation, Report, Satisfied};
use crate::clock::VirtualClock;
use crate::config::AcceptanceOpts;
use crate::error::HarnessResult;
use crate::runtime::WebhookReceiver;

#[derive(Debug, Default)]
struct CollectorState {
    expectations: Vec<Expectation>,
    observations: Vec<Observation>,
}

#[derive(Debug)]
pub struct Collector {
    name: String,
    clock: VirtualClock,
    tolerance_secs: f64,
    tolerance_delta: TimeDelta,
    fail_on_unexpected: bool,
    receiver: Option<WebhookReceiver>,
    state: Mutex<CollectorState>,
}

impl Collector {
    /// Collector without a notification endpoint; observations are only
    /// added through [`record`](Self::record)
    pub fn detached(name: impl Into<String>, clock: VirtualClock, opts: &AcceptanceOpts) -> Self {
        Self {
            name: name.into(),
            clock,
            tolerance_secs: opts.tolerance_secs(),
            tolerance_delta: opts.tolerance_delta(),
            fail_on_unexpected: opts.fail_on_unexpected,
            receiver: None,
            state: Mutex::new(CollectorState::default()),
        }
    }

    /// Collector backed by its own webhook receiver
    pub async fn with_webhook(name: impl Into<String>, clock: VirtualClock, opts: &AcceptanceOpts) -> HarnessResult<Self> {
        let mut collector = Self::detached(name, clock, opts);
        let receiver = WebhookReceiver::start().await?;
        tracing::info!("📡 Collector '{}' receiving on {}", collector.name, receiver.url());
        collector.receiver = Some(receiver);
        Ok(collector)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Webhook URL to configure as notification target; empty for detached
    /// collectors
    pub fn url(&self) -> String {
        self.receiver.as_ref().map(WebhookReceiver::url).unwrap_or_default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Expect `alerts` to be delivered as one notification within `interval`
    pub fn expect(&self, interval: Interval, alerts: &[TestAlert]) {
        let batch = expand_batch(alerts, &self.clock);
        self.state().expectations.push(Expectation { interval, batch });
    }

    /// Upper bound of the latest expectation window, 0 when nothing is expected
    pub fn latest_expected_time(&self) -> f64 {
        self.state()
            .expectations
            .iter()
            .map(|e| e.interval.latest())
            .fold(0.0, f64::max)
    }

    /// Record a batch observed at relative time `at`
    pub fn record(&self, at: f64, batch: Vec<Alert>) {
        self.state().observations.push(Observation { observed_at: at, batch });
    }

    /// Pull everything the webhook receiver got and record it at the
    /// relative time it arrived. Returns the number of new observations.
    pub fn observe(&self) -> usize {
        let Some(receiver) = &self.receiver else {
            return 0;
        };

        let received = receiver.drain();
        let count = received.len();
        for notification in received {
            let at = self.clock.relativize(notification.received_at);
            tracing::debug!(
                "📥 Collector '{}' observed {} alerts at {:.3}",
                self.name,
                notification.message.alerts.len(),
                at
            );
            self.record(at, notification.message.alerts);
        }
        count
    }

    /// Match observations to expectations.
    ///
    /// Expectations are processed by ascending start of their window. Each
    /// takes the earliest unused observation that lies within its
    /// tolerance-widened window and carries an equal batch; an observation
    /// satisfies at most one expectation.
    pub fn reconcile(&self) -> Report {
        let state = self.state();

        let mut expectations: Vec<&Expectation> = state.expectations.iter().collect();
        expectations.sort_by(|a, b| a.interval.earliest().total_cmp(&b.interval.earliest()));

        let mut used = vec![false; state.observations.len()];
        let mut satisfied = Vec::new();
        let mut unsatisfied = Vec::new();

        for expectation in expectations {
            let candidate = state
                .observations
                .iter()
                .enumerate()
                .filter(|(i, o)| {
                    !used[*i]
                        && expectation.interval.contains(o.observed_at, self.tolerance_secs)
                        && batches_equal(&expectation.batch, &o.batch, self.tolerance_delta)
                })
                .min_by(|(_, a), (_, b)| a.observed_at.total_cmp(&b.observed_at));

            match candidate {
                Some((i, observation)) => {
                    used[i] = true;
                    satisfied.push(Satisfied {
                        expectation: expectation.clone(),
                        observed_at: observation.observed_at,
                    });
                }
                None => unsatisfied.push(expectation.clone()),
            }
        }

        let unexpected = state
            .observations
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(o, _)| o.clone())
            .collect();

        Report {
            collector: self.name.clone(),
            satisfied,
            unsatisfied,
            unexpected,
            fail_on_unexpected: self.fail_on_unexpected,
        }
    }

    /// Stop the webhook receiver, if any
    pub fn shutdown(&self) {
        if let Some(receiver) = &self.receiver {
            receiver.shutdown();
        }
    }
}
