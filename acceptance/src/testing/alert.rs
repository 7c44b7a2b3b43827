//! Declarative alerts and silences
//!
//! Test authors describe alerts and silences in relative time; they are
//! expanded to absolute timestamps through the test's clock when pushed or
//! expected.

use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, TimeDelta, Utc};
use shared::{Alert, LabelSet, Matcher, Silence, render_labels};

use crate::clock::VirtualClock;
use crate::error::{HarnessError, HarnessResult};

/// Alert declared on the relative time axis
#[derive(Debug, Clone, PartialEq)]
pub struct TestAlert {
    labels: LabelSet,
    annotations: LabelSet,
    starts_at: Option<f64>,
    ends_at: Option<f64>,
}

/// Shorthand for [`TestAlert::new`]
pub fn alert<I, K, V>(labels: I) -> TestAlert
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    TestAlert::new(labels)
}

impl TestAlert {
    pub fn new<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: collect_pairs(labels),
            annotations: LabelSet::new(),
            starts_at: None,
            ends_at: None,
        }
    }

    pub fn annotate<I, K, V>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.annotations.extend(collect_pairs(annotations));
        self
    }

    /// Active from `starts_at`, resolved at `ends_at` if given
    pub fn active(mut self, starts_at: f64, ends_at: Option<f64>) -> Self {
        self.starts_at = Some(starts_at);
        self.ends_at = ends_at;
        self
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Wire representation with absolute timestamps
    pub fn to_alert(&self, clock: &VirtualClock) -> Alert {
        Alert {
            labels: self.labels.clone(),
            annotations: self.annotations.clone(),
            starts_at: self.starts_at.map(|rel| clock.expand(rel)),
            ends_at: self.ends_at.map(|rel| clock.expand(rel)),
            generator_url: None,
        }
    }
}

fn collect_pairs<I, K, V>(pairs: I) -> LabelSet
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// Expand a batch of declared alerts
pub fn expand_batch(alerts: &[TestAlert], clock: &VirtualClock) -> Vec<Alert> {
    alerts.iter().map(|a| a.to_alert(clock)).collect()
}

fn times_equal(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>, tolerance: TimeDelta) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() <= tolerance,
        _ => false,
    }
}

/// Labels and annotations identical, timestamps within tolerance
pub fn alerts_equal(a: &Alert, b: &Alert, tolerance: TimeDelta) -> bool {
    a.labels == b.labels
        && a.annotations == b.annotations
        && times_equal(a.starts_at, b.starts_at, tolerance)
        && times_equal(a.ends_at, b.ends_at, tolerance)
}

/// Order-insensitive batch equality; every alert must pair with a distinct
/// equal alert of the other batch.
pub fn batches_equal(expected: &[Alert], got: &[Alert], tolerance: TimeDelta) -> bool {
    if expected.len() != got.len() {
        return false;
    }

    let mut used = vec![false; got.len()];
    expected.iter().all(|e| {
        let found = got
            .iter()
            .enumerate()
            .find(|(i, g)| !used[*i] && alerts_equal(e, g, tolerance))
            .map(|(i, _)| i);
        match found {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Silence declared on the relative time axis
///
/// The identifier is a single-assignment cell filled in by the scheduled
/// action that creates the silence. Actions referencing the silence later
/// (deletion) must be scheduled no earlier than the creation; the scheduler
/// does not enforce this.
#[derive(Debug)]
pub struct TestSilence {
    matchers: Vec<Matcher>,
    starts_at: f64,
    ends_at: f64,
    created_by: String,
    comment: String,
    id: OnceLock<String>,
}

/// Shared handle to a declared silence
pub type SilenceHandle = Arc<TestSilence>;

impl TestSilence {
    pub fn new(starts_at: f64, ends_at: f64) -> Self {
        Self {
            matchers: Vec::new(),
            starts_at,
            ends_at,
            created_by: "acceptance@example.com".to_string(),
            comment: "acceptance test silence".to_string(),
            id: OnceLock::new(),
        }
    }

    pub fn matcher<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.matchers.push(Matcher {
            name: name.into(),
            value: value.into(),
            is_regex: false,
        });
        self
    }

    pub fn regex_matcher<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.matchers.push(Matcher {
            name: name.into(),
            value: value.into(),
            is_regex: true,
        });
        self
    }

    pub fn comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn handle(self) -> SilenceHandle {
        Arc::new(self)
    }

    /// Identifier assigned by the instance, once the silence was set
    pub fn id(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    /// Store the identifier handed out by the instance. Setting the same
    /// identifier again is a no-op.
    pub fn assign_id(&self, id: String) -> HarnessResult<()> {
        let stored = self.id.get_or_init(|| id.clone());
        if *stored == id {
            Ok(())
        } else {
            Err(HarnessError::SilenceIdChanged {
                previous: stored.clone(),
                current: id,
            })
        }
    }

    /// Wire representation; carries the identifier when already assigned so
    /// that setting it again updates the existing silence
    pub fn to_silence(&self, clock: &VirtualClock) -> Silence {
        Silence {
            id: self.id.get().cloned(),
            matchers: self.matchers.clone(),
            starts_at: clock.expand(self.starts_at),
            ends_at: clock.expand(self.ends_at),
            created_by: self.created_by.clone(),
            comment: self.comment.clone(),
        }
    }
}

impl fmt::Display for TestSilence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matchers: LabelSet = self
            .matchers
            .iter()
            .map(|m| {
                let op = if m.is_regex { "~" } else { "" };
                (format!("{}{op}", m.name), m.value.clone())
            })
            .collect();
        write!(f, "{} [{:.3}, {:.3}]", render_labels(&matchers), self.starts_at, self.ends_at)
    }
}
