//! Test helper wiring
//!
//! Assembles clock, scheduler, failure log, one collector and one managed
//! instance talking to a [`FakeAlertmanager`].

use std::sync::Arc;
use std::time::Duration;

use acceptance::{
    AcceptanceOpts, ActionScheduler, ApiClient, Collector, FailureLog, ManagedInstance, Report, VirtualClock,
};

use super::FakeAlertmanager;

pub struct Pipeline {
    pub clock: VirtualClock,
    pub failures: FailureLog,
    pub scheduler: ActionScheduler,
    pub collector: Collector,
    pub instance: Arc<ManagedInstance>,
}

impl Pipeline {
    pub async fn new(tolerance: Duration) -> Self {
        let opts = AcceptanceOpts::builder().tolerance(tolerance).build();
        let clock = VirtualClock::new();
        let failures = FailureLog::new();
        let scheduler = ActionScheduler::new(clock, failures.clone());

        let collector = Collector::with_webhook("webhook", clock, &opts).await.unwrap();
        let fake = FakeAlertmanager::start(collector.url()).await;
        let client = ApiClient::new(fake.address, opts.request_timeout).unwrap();

        let instance = Arc::new(
            ManagedInstance::with_client(
                "fake0",
                fake.address,
                "route: {}\n",
                opts,
                clock,
                scheduler.clone(),
                Arc::new(client),
            )
            .unwrap(),
        );

        Self {
            clock,
            failures,
            scheduler,
            collector,
            instance,
        }
    }

    /// Fire everything, then reconcile what the collector received
    pub async fn run(&self) -> Report {
        self.scheduler.run().await;
        self.clock.sleep_until(self.collector.latest_expected_time()).await;
        self.collector.observe();
        let report = self.collector.reconcile();
        self.instance.cleanup();
        self.collector.shutdown();
        report
    }
}
