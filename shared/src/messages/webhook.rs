//! Notification payload posted to webhook receivers

use serde::{Deserialize, Serialize};

use crate::types::{Alert, LabelSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMessage {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub group_key: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub receiver: String,

    #[serde(default)]
    pub group_labels: LabelSet,

    #[serde(default)]
    pub common_labels: LabelSet,

    #[serde(default)]
    pub common_annotations: LabelSet,

    #[serde(default, rename = "externalURL")]
    pub external_url: String,

    #[serde(default)]
    pub alerts: Vec<Alert>,
}

impl WebhookMessage {
    /// Wrap alerts in a minimal firing notification
    pub fn firing(receiver: &str, alerts: Vec<Alert>) -> Self {
        Self {
            version: "4".to_string(),
            group_key: String::new(),
            status: "firing".to_string(),
            receiver: receiver.to_string(),
            group_labels: LabelSet::new(),
            common_labels: LabelSet::new(),
            common_annotations: LabelSet::new(),
            external_url: String::new(),
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_notification() {
        let raw = r#"{
            "version": "4",
            "groupKey": "{}:{alertname=\"test1\"}",
            "status": "firing",
            "receiver": "default",
            "groupLabels": {"alertname": "test1"},
            "commonLabels": {"alertname": "test1"},
            "commonAnnotations": {},
            "externalURL": "http://localhost:9093",
            "alerts": [
                {
                    "status": "firing",
                    "labels": {"alertname": "test1"},
                    "annotations": {},
                    "startsAt": "2016-01-01T10:00:01Z",
                    "endsAt": "0001-01-01T00:00:00Z",
                    "generatorURL": ""
                }
            ]
        }"#;

        let msg: WebhookMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.receiver, "default");
        assert_eq!(msg.alerts.len(), 1);
        assert_eq!(msg.alerts[0].name(), Some("test1"));
        assert_eq!(msg.alerts[0].ends_at, None);
    }
}
