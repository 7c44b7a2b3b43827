//! Core alert and silence types exchanged with the system under test

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label or annotation set, ordered so that rendering is stable
pub type LabelSet = BTreeMap<String, String>;

/// A single alert as accepted by the ingestion API and echoed back in
/// webhook notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default)]
    pub labels: LabelSet,

    #[serde(default)]
    pub annotations: LabelSet,

    #[serde(
        default,
        deserialize_with = "optional_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub starts_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "optional_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub ends_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        rename = "generatorURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub generator_url: Option<String>,
}

impl Alert {
    pub fn new(labels: LabelSet) -> Self {
        Self {
            labels,
            annotations: LabelSet::new(),
            starts_at: None,
            ends_at: None,
            generator_url: None,
        }
    }

    /// Value of the `alertname` label, if present
    pub fn name(&self) -> Option<&str> {
        self.labels.get("alertname").map(String::as_str)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_labels(&self.labels))?;
        if !self.annotations.is_empty() {
            write!(f, " {}", render_labels(&self.annotations))?;
        }
        match self.starts_at {
            Some(ts) => write!(f, " [{}", ts.format("%H:%M:%S%.3f"))?,
            None => write!(f, " [-")?,
        }
        match self.ends_at {
            Some(ts) => write!(f, " .. {}]", ts.format("%H:%M:%S%.3f")),
            None => write!(f, " .. -]"),
        }
    }
}

/// Render a label set as `{a="1", b="2"}`
pub fn render_labels(labels: &LabelSet) -> String {
    let pairs: Vec<String> = labels
        .iter()
        .map(|(name, value)| format!("{name}={value:?}"))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

/// Matcher selecting alerts by label value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub is_regex: bool,
}

/// Silence as accepted by the silence API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Silence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub matchers: Vec<Matcher>,

    pub starts_at: DateTime<Utc>,

    pub ends_at: DateTime<Utc>,

    pub created_by: String,

    pub comment: String,
}

/// Go-based services encode "unset" timestamps as the zero time
/// (`0001-01-01T00:00:00Z`); treat those as absent.
fn optional_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(raw.filter(|ts| ts.year() > 1))
}
