//! Test Scenarios
//!
//! Built-in acceptance scenarios runnable from the command line. Each one
//! drives real Alertmanager processes and reconciles the notifications
//! they deliver.

pub mod notify;
pub mod reload;
pub mod silence;

use crate::acceptance::TestOutcome;
use crate::config::AcceptanceOpts;
use crate::error::{HarnessError, HarnessResult};

/// Render an instance configuration routing every alert to one webhook
///
/// `group_wait` and `group_interval` are kept short so notifications arrive
/// within a few seconds of the alerts being pushed.
pub fn webhook_config(receiver: &str, url: &str, group_wait: &str, group_interval: &str) -> String {
    format!(
        r#"route:
  receiver: "{receiver}"
  group_wait: {group_wait}
  group_interval: {group_interval}
  repeat_interval: 1h

receivers:
- name: "{receiver}"
  webhook_configs:
  - url: "{url}"
    send_resolved: true
"#
    )
}

pub struct TestScenarios {
    opts: AcceptanceOpts,
}

impl TestScenarios {
    pub fn new(opts: AcceptanceOpts) -> Self {
        Self { opts }
    }

    /// Run a specific scenario by name, returning whether all of its
    /// collectors passed
    pub async fn run_scenario(&self, name: &str) -> HarnessResult<bool> {
        let outcomes = match name {
            "notify" => vec![notify::single_alert(self.opts.clone()).await?],
            "silence" => vec![silence::set_and_delete(self.opts.clone()).await?],
            "reload" => vec![reload::reroute(self.opts.clone()).await?],

            "all" => {
                tracing::info!("🧪 Running full acceptance suite");
                vec![
                    notify::single_alert(self.opts.clone()).await?,
                    silence::set_and_delete(self.opts.clone()).await?,
                    reload::reroute(self.opts.clone()).await?,
                ]
            }

            _ => {
                return Err(HarnessError::UnknownScenario(format!(
                    "'{}'. Available: {}",
                    name,
                    Self::available_scenarios().join(", ")
                )));
            }
        };

        Ok(log_outcomes(name, &outcomes))
    }

    /// Get list of available scenarios
    pub fn available_scenarios() -> Vec<&'static str> {
        vec!["notify", "silence", "reload", "all"]
    }
}

fn log_outcomes(name: &str, outcomes: &[TestOutcome]) -> bool {
    let passed = outcomes.iter().all(TestOutcome::passed);
    for outcome in outcomes {
        tracing::info!("📋 {}\n{}", name, outcome.summary());
    }
    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_webhook_config_embeds_url() {
        let config = webhook_config("default", "http://127.0.0.1:4242/", "1s", "2s");
        assert!(config.contains(r#"receiver: "default""#));
        assert!(config.contains(r#"- url: "http://127.0.0.1:4242/""#));
        assert!(config.contains("group_wait: 1s"));
        assert!(config.contains("group_interval: 2s"));
    }

    #[tokio::test]
    async fn test_unknown_scenario() {
        let scenarios = TestScenarios::new(AcceptanceOpts::default());
        let err = scenarios.run_scenario("nope").await.unwrap_err();
        assert_matches!(err, HarnessError::UnknownScenario(ref message) if message.contains("notify, silence, reload, all"));
    }
}
