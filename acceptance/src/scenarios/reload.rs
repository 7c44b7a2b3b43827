//! Configuration Reload
//!
//! Rewriting the configuration and signalling the instance moves delivery
//! to a different receiver without restarting it.

use super::webhook_config;
use crate::acceptance::{AcceptanceTest, TestOutcome};
use crate::config::AcceptanceOpts;
use crate::error::HarnessResult;
use crate::testing::{Interval, alert};

pub async fn reroute(opts: AcceptanceOpts) -> HarnessResult<TestOutcome> {
    tracing::info!("🧪 Reload: reroute to a second receiver at runtime");

    let mut test = AcceptanceTest::new(opts);
    let before = test.collector("before").await?;
    let after = test.collector("after").await?;
    let am = test.alertmanager(&webhook_config("before", &before.url(), "1s", "1s"))?;

    let firing = alert([("alertname", "test1")]).active(1.0, None);
    am.push(1.0, &[firing.clone()]);

    am.configure_at(3.0, webhook_config("after", &after.url(), "1s", "1s"));
    am.reload_at(3.1);

    before.expect(Interval::between(2.0, 2.5), &[firing.clone()]);
    after.expect(Interval::between(4.1, 4.6), &[firing]);

    test.run().await
}
