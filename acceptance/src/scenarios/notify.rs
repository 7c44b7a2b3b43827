//! Notification Delivery
//!
//! A single firing alert must be delivered exactly once after `group_wait`.

use super::webhook_config;
use crate::acceptance::{AcceptanceTest, TestOutcome};
use crate::config::AcceptanceOpts;
use crate::error::HarnessResult;
use crate::testing::{Interval, alert};

/// Push one alert at t=1 and expect it at the webhook after the 1s group wait
pub async fn single_alert(opts: AcceptanceOpts) -> HarnessResult<TestOutcome> {
    tracing::info!("🧪 Notify: single alert, single notification");

    let mut test = AcceptanceTest::new(opts);
    let collector = test.collector("webhook").await?;
    let am = test.alertmanager(&webhook_config("default", &collector.url(), "1s", "1s"))?;

    let firing = alert([("alertname", "test1")]).active(1.0, None);
    am.push(1.0, &[firing.clone()]);

    collector.expect(Interval::between(2.0, 2.5), &[firing]);

    test.run().await
}
