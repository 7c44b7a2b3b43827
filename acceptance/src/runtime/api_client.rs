//! REST API Client for Alertmanager
//!
//! Thin client bound to one instance's listen address. The trait is the
//! seam scheduled actions talk through, so tests can substitute a mock.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use shared::{Alert, ApiResponse, ApiStatus, Silence, SilenceCreated};

use crate::error::{HarnessError, HarnessResult};

/// Alert and silence API of one instance
///
/// Implementations must tolerate concurrent calls: actions scheduled at the
/// same relative time share one client.
#[mockall::automock]
#[async_trait]
pub trait AlertmanagerApi: Send + Sync {
    /// Submit alerts to the ingestion endpoint
    async fn push_alerts(&self, alerts: &[Alert]) -> HarnessResult<()>;

    /// Create or update a silence, returning its identifier
    async fn set_silence(&self, silence: &Silence) -> HarnessResult<String>;

    /// Delete (expire) the silence with the given identifier
    async fn delete_silence(&self, id: &str) -> HarnessResult<()>;
}

/// HTTP client for the v1 API
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(address: SocketAddr, timeout: Duration) -> HarnessResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: format!("http://{address}"),
            client,
        })
    }

    /// Check status and decode the response envelope. A successful empty
    /// body counts as a success envelope without data.
    async fn decode<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> HarnessResult<ApiResponse<T>> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() && body.trim().is_empty() {
            return Ok(ApiResponse {
                status: ApiStatus::Success,
                data: None,
                error_type: None,
                error: None,
            });
        }

        if !status.is_success() && serde_json::from_str::<ApiResponse<serde_json::Value>>(&body).is_err() {
            return Err(HarnessError::ApiStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AlertmanagerApi for ApiClient {
    async fn push_alerts(&self, alerts: &[Alert]) -> HarnessResult<()> {
        tracing::debug!("📤 Pushing {} alerts to {}", alerts.len(), self.base_url);

        let url = format!("{}/api/v1/alerts", self.base_url);
        let response = self.client.post(&url).json(alerts).send().await?;

        Self::decode::<serde_json::Value>(&url, response).await?.into_result()?;
        Ok(())
    }

    async fn set_silence(&self, silence: &Silence) -> HarnessResult<String> {
        let url = format!("{}/api/v1/silences", self.base_url);
        let response = self.client.post(&url).json(silence).send().await?;

        let created = Self::decode::<SilenceCreated>(&url, response).await?.into_data()?;

        tracing::debug!("🔇 Silence {} set on {}", created.silence_id, self.base_url);
        Ok(created.silence_id)
    }

    async fn delete_silence(&self, id: &str) -> HarnessResult<()> {
        let url = format!("{}/api/v1/silence/{}", self.base_url, id);
        let response = self.client.delete(&url).send().await?;

        Self::decode::<serde_json::Value>(&url, response).await?.into_result()?;
        tracing::debug!("🔊 Silence {} deleted on {}", id, self.base_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{delete, post};
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<String>>>;

    /// Minimal stand-in for the v1 API
    async fn fake_api() -> (SocketAddr, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));

        async fn alerts(State(seen): State<Seen>, Json(alerts): Json<Vec<Alert>>) -> Json<serde_json::Value> {
            for alert in alerts {
                seen.lock().unwrap().push(format!("alert {}", alert.name().unwrap_or_default()));
            }
            Json(serde_json::json!({"status": "success"}))
        }

        async fn silences(State(seen): State<Seen>, Json(silence): Json<Silence>) -> Json<serde_json::Value> {
            seen.lock().unwrap().push(format!("silence {}", silence.matchers[0].value));
            if silence.matchers[0].value == "no-data" {
                return Json(serde_json::json!({"status": "success"}));
            }
            Json(serde_json::json!({"status": "success", "data": {"silenceId": 17}}))
        }

        async fn expire(State(seen): State<Seen>, Path(id): Path<String>) -> (StatusCode, Json<serde_json::Value>) {
            seen.lock().unwrap().push(format!("delete {id}"));
            if id == "17" {
                (StatusCode::OK, Json(serde_json::json!({"status": "success"})))
            } else {
                (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({"status": "error", "errorType": "not_found", "error": "no such silence"})),
                )
            }
        }

        let app = Router::new()
            .route("/api/v1/alerts", post(alerts))
            .route("/api/v1/silences", post(silences))
            .route("/api/v1/silence/:id", delete(expire))
            .with_state(seen.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, seen)
    }

    fn alert(name: &str) -> Alert {
        Alert::new(BTreeMap::from([("alertname".to_string(), name.to_string())]))
    }

    fn silence_on(value: &str) -> Silence {
        Silence {
            id: None,
            matchers: vec![shared::Matcher {
                name: "alertname".to_string(),
                value: value.to_string(),
                is_regex: false,
            }],
            starts_at: chrono::Utc::now(),
            ends_at: chrono::Utc::now() + chrono::TimeDelta::minutes(5),
            created_by: "acceptance".to_string(),
            comment: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_push_set_and_delete() {
        let (addr, seen) = fake_api().await;
        let client = ApiClient::new(addr, Duration::from_secs(5)).unwrap();

        client.push_alerts(&[alert("a1"), alert("a2")]).await.unwrap();

        let id = client.set_silence(&silence_on("a1")).await.unwrap();
        assert_eq!(id, "17");

        client.delete_silence(&id).await.unwrap();

        let err = client.delete_silence("99").await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::SharedError(shared::SharedError::ApiError { ref error_type, .. }) if error_type == "not_found"
        ));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["alert a1", "alert a2", "silence a1", "delete 17", "delete 99"]
        );
    }

    #[tokio::test]
    async fn test_set_silence_without_id_is_an_error() {
        let (addr, _seen) = fake_api().await;
        let client = ApiClient::new(addr, Duration::from_secs(5)).unwrap();

        let err = client.set_silence(&silence_on("no-data")).await.unwrap_err();
        assert!(matches!(err, HarnessError::SharedError(shared::SharedError::MissingData)));
    }

    #[tokio::test]
    async fn test_unreachable_instance_is_an_error() {
        let addr = crate::runtime::address::free_address().unwrap();
        let client = ApiClient::new(addr, Duration::from_secs(1)).unwrap();

        let err = client.push_alerts(&[alert("a1")]).await.unwrap_err();
        assert!(matches!(err, HarnessError::HttpError(_)));
    }
}
