//! Silencing
//!
//! A silenced alert is held back while its sibling is delivered; once the
//! silence is deleted the next flush of the group carries both.

use super::webhook_config;
use crate::acceptance::{AcceptanceTest, TestOutcome};
use crate::config::AcceptanceOpts;
use crate::error::HarnessResult;
use crate::testing::{Interval, TestSilence, alert};

pub async fn set_and_delete(opts: AcceptanceOpts) -> HarnessResult<TestOutcome> {
    tracing::info!("🧪 Silence: set before push, delete after first flush");

    let mut test = AcceptanceTest::new(opts);
    let collector = test.collector("webhook").await?;
    let am = test.alertmanager(&webhook_config("default", &collector.url(), "1s", "1s"))?;

    let silenced = alert([("alertname", "test1")]).active(1.0, None);
    let delivered = alert([("alertname", "test2")]).active(1.0, None);

    let silence = TestSilence::new(0.0, 60.0)
        .matcher("alertname", "test1")
        .comment("held back by the silence scenario")
        .handle();

    am.set_silence(0.5, &silence);
    am.push(1.0, &[silenced.clone(), delivered.clone()]);
    am.delete_silence(3.0, &silence);

    collector.expect(Interval::between(2.0, 2.5), &[delivered.clone()]);
    collector.expect(Interval::between(3.0, 4.5), &[silenced, delivered]);

    test.run().await
}
