//! Test Orchestrator
//!
//! An [`AcceptanceTest`] owns every managed instance and collector of one
//! test. Authors declare instances, collectors, scheduled operations and
//! expectations against it, then consume it with [`AcceptanceTest::run`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::clock::VirtualClock;
use crate::config::AcceptanceOpts;
use crate::error::HarnessResult;
use crate::failures::{Failure, FailureLog};
use crate::runtime::ManagedInstance;
use crate::scheduler::ActionScheduler;
use crate::testing::{Collector, Report};

/// Lifecycle phase of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
    Built,
    Running,
    Reconciling,
    TornDown,
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestState::Built => "built",
            TestState::Running => "running",
            TestState::Reconciling => "reconciling",
            TestState::TornDown => "torn down",
        };
        f.write_str(name)
    }
}

pub struct AcceptanceTest {
    opts: AcceptanceOpts,
    clock: VirtualClock,
    failures: FailureLog,
    scheduler: ActionScheduler,
    instances: Vec<Arc<ManagedInstance>>,
    collectors: Vec<Arc<Collector>>,
    state: TestState,
}

impl AcceptanceTest {
    /// New test whose relative time 0 is now
    pub fn new(opts: AcceptanceOpts) -> Self {
        let clock = VirtualClock::new();
        let failures = FailureLog::new();
        let scheduler = ActionScheduler::new(clock, failures.clone());

        tracing::info!("🧪 Acceptance test created (base time {})", clock.base_time());

        Self {
            opts,
            clock,
            failures,
            scheduler,
            instances: Vec::new(),
            collectors: Vec::new(),
            state: TestState::Built,
        }
    }

    pub fn clock(&self) -> VirtualClock {
        self.clock
    }

    /// Declare a managed instance running with configuration `document`
    pub fn alertmanager(&mut self, document: &str) -> HarnessResult<Arc<ManagedInstance>> {
        let name = format!("am{}", self.instances.len());
        let instance = Arc::new(ManagedInstance::new(
            name,
            document,
            self.opts.clone(),
            self.clock,
            self.scheduler.clone(),
        )?);
        self.instances.push(instance.clone());
        Ok(instance)
    }

    /// Declare a collector with its own webhook endpoint
    pub async fn collector(&mut self, name: &str) -> HarnessResult<Arc<Collector>> {
        let collector = Arc::new(Collector::with_webhook(name, self.clock, &self.opts).await?);
        self.collectors.push(collector.clone());
        Ok(collector)
    }

    /// Run an arbitrary operation at relative time `at`
    pub fn schedule<F, Fut>(&self, at: f64, label: impl Into<String>, operation: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = HarnessResult<()>> + Send + 'static,
    {
        self.scheduler.schedule(at, label, operation);
    }

    fn transition(&mut self, next: TestState) {
        tracing::info!("🔀 Test {} -> {}", self.state, next);
        self.state = next;
    }

    /// Start every instance, fire all scheduled operations, wait for the
    /// latest expectation window to close and reconcile each collector.
    ///
    /// Only failures to start an instance abort the run; everything else
    /// ends up in the returned [`TestOutcome`].
    pub async fn run(mut self) -> HarnessResult<TestOutcome> {
        self.transition(TestState::Running);

        let mut launch_error = None;
        for instance in &self.instances {
            if let Err(e) = instance.start().await {
                tracing::error!("❌ Failed to start {}: {}", instance.name(), e);
                launch_error = Some(e);
                break;
            }
        }
        if let Some(e) = launch_error {
            self.teardown();
            return Err(e);
        }

        self.scheduler.run().await;

        self.transition(TestState::Reconciling);

        let deadline = self
            .collectors
            .iter()
            .map(|collector| collector.latest_expected_time())
            .fold(0.0, f64::max);
        tracing::info!("⏳ Waiting for expectation windows to close at t={:.3}", deadline);
        self.clock.sleep_until(deadline).await;

        let reports: Vec<Report> = self
            .collectors
            .iter()
            .map(|collector| {
                collector.observe();
                let report = collector.reconcile();
                if report.passed() {
                    tracing::info!("✅ {}", report);
                } else {
                    tracing::warn!("⚠️ {}", report);
                }
                report
            })
            .collect();

        self.teardown();

        Ok(TestOutcome {
            reports,
            failures: self.failures.drain(),
        })
    }

    fn teardown(&mut self) {
        for instance in &self.instances {
            if instance.is_running() {
                if let Err(e) = instance.terminate() {
                    tracing::warn!("⚠️ Failed to terminate {}: {}", instance.name(), e);
                }
            }
            instance.log_output();
            instance.cleanup();
        }

        for collector in &self.collectors {
            collector.shutdown();
        }

        self.transition(TestState::TornDown);
    }
}

/// Result of a completed run
#[derive(Debug)]
pub struct TestOutcome {
    pub reports: Vec<Report>,
    pub failures: Vec<Failure>,
}

impl TestOutcome {
    /// Every collector passed and no operation failed
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.reports.iter().all(Report::passed)
    }

    /// Human-readable rendering of all reports and failures
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// Panic with the summary unless the test passed
    pub fn assert_passed(&self) {
        assert!(self.passed(), "acceptance test failed:\n{}", self.summary());
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            writeln!(f, "{report}")?;
        }

        if self.failures.is_empty() {
            writeln!(f, "no operational failures")?;
        } else {
            writeln!(f, "{} operational failures:", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  - {failure}")?;
            }
        }

        let verdict = if self.passed() { "PASSED" } else { "FAILED" };
        write!(f, "acceptance test {verdict}")
    }
}
