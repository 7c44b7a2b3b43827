//! In-process stand-in for the v1 API
//!
//! Forwards every pushed batch straight to a webhook, minus the alerts
//! matched by an active silence. Only equality matchers are honoured.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::{Alert, Matcher, Silence, WebhookMessage};
use tokio::net::TcpListener;

#[derive(Default)]
struct FakeState {
    webhook_url: String,
    silences: HashMap<String, Vec<Matcher>>,
    next_id: u64,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeAlertmanager {
    pub address: SocketAddr,
}

impl FakeAlertmanager {
    pub async fn start(webhook_url: String) -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            webhook_url,
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/api/v1/alerts", post(push_alerts))
            .route("/api/v1/silences", post(set_silence))
            .route("/api/v1/silence/:id", delete(delete_silence))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { address }
    }
}

fn silenced(alert: &Alert, silences: &HashMap<String, Vec<Matcher>>) -> bool {
    silences.values().any(|matchers| {
        matchers
            .iter()
            .all(|m| alert.labels.get(&m.name).is_some_and(|v| *v == m.value))
    })
}

async fn push_alerts(State(state): State<Shared>, Json(alerts): Json<Vec<Alert>>) -> Json<Value> {
    let (url, delivered) = {
        let state = state.lock().unwrap();
        let delivered: Vec<Alert> = alerts.into_iter().filter(|a| !silenced(a, &state.silences)).collect();
        (state.webhook_url.clone(), delivered)
    };

    if !delivered.is_empty() {
        reqwest::Client::new()
            .post(url)
            .json(&WebhookMessage::firing("default", delivered))
            .send()
            .await
            .unwrap();
    }

    Json(json!({"status": "success"}))
}

async fn set_silence(State(state): State<Shared>, Json(silence): Json<Silence>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    let id = match silence.id {
        Some(id) => id,
        None => {
            state.next_id += 1;
            format!("sil-{}", state.next_id)
        }
    };
    state.silences.insert(id.clone(), silence.matchers);

    Json(json!({"status": "success", "data": {"silenceId": id}}))
}

async fn delete_silence(State(state): State<Shared>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    match state.lock().unwrap().silences.remove(&id) {
        Some(_) => (StatusCode::OK, Json(json!({"status": "success"}))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "error", "errorType": "not_found", "error": "silence not found"})),
        ),
    }
}
