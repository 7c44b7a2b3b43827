//! Reconciliation report of one collector

use std::fmt;

use shared::Alert;

use super::interval::Interval;

/// An expected batch together with its window
#[derive(Debug, Clone)]
pub struct Expectation {
    pub interval: Interval,
    pub batch: Vec<Alert>,
}

/// A received batch with the relative time it arrived
#[derive(Debug, Clone)]
pub struct Observation {
    pub observed_at: f64,
    pub batch: Vec<Alert>,
}

/// An expectation that was satisfied, and by which observation
#[derive(Debug, Clone)]
pub struct Satisfied {
    pub expectation: Expectation,
    pub observed_at: f64,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub collector: String,
    pub satisfied: Vec<Satisfied>,
    pub unsatisfied: Vec<Expectation>,
    pub unexpected: Vec<Observation>,
    /// Whether unexpected observations fail this report
    pub fail_on_unexpected: bool,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.unsatisfied.is_empty() && !(self.fail_on_unexpected && !self.unexpected.is_empty())
    }

    pub fn expectation_count(&self) -> usize {
        self.satisfied.len() + self.unsatisfied.len()
    }
}

fn write_batch(f: &mut fmt::Formatter<'_>, batch: &[Alert]) -> fmt::Result {
    if batch.is_empty() {
        return writeln!(f, "      (no alerts)");
    }
    for alert in batch {
        writeln!(f, "      - {alert}")?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "PASSED" } else { "FAILED" };
        writeln!(f, "collector {:?}: {}", self.collector, verdict)?;
        writeln!(
            f,
            "  satisfied {}/{} expectations",
            self.satisfied.len(),
            self.expectation_count()
        )?;

        for s in &self.satisfied {
            writeln!(f, "  [ ✓ ] {} observed at {:.3}", s.expectation.interval, s.observed_at)?;
        }

        for e in &self.unsatisfied {
            writeln!(f, "  [ ✗ ] {} expected but not observed:", e.interval)?;
            write_batch(f, &e.batch)?;
        }

        if !self.unexpected.is_empty() {
            let note = if self.fail_on_unexpected { "" } else { " (not failing)" };
            writeln!(f, "  {} unexpected notifications{}:", self.unexpected.len(), note)?;
            for o in &self.unexpected {
                writeln!(f, "    at {:.3}:", o.observed_at)?;
                write_batch(f, &o.batch)?;
            }
        }

        Ok(())
    }
}
