//! HTTP contract tests against an in-process backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use knowguide_connect::session::{
    interpret_session_reply, ChannelObserver, ConnectionController, ConnectionState,
    ControllerOptions, Credentials, HoldingsSyncStatus, InitiationOutcome, PollConfig, SessionApi,
    SessionStartReply, BACKEND_OFFLINE_MESSAGE, HOLDINGS_SYNCED_MESSAGE,
};
use knowguide_connect::{ConnectApiClient, ConnectError};
use knowguide_core::{Currency, InvestorProfile};

#[derive(Default)]
struct Backend {
    logins: Mutex<Vec<Value>>,
    status_calls: AtomicUsize,
    /// Status queries answered "still on the login page" before login succeeds
    pending_polls: usize,
    holdings_missing: bool,
}

async fn connect(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    backend.logins.lock().unwrap().push(body.clone());
    match body["username"].as_str() {
        Some("locked") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Login Automation Failed: account locked"})),
        )
            .into_response(),
        Some("busy") => (
            StatusCode::OK,
            Json(json!({"error": "Browser session already active"})),
        )
            .into_response(),
        Some("maintenance") => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            "<html><body>Down for maintenance</body></html>",
        )
            .into_response(),
        _ => (
            StatusCode::OK,
            Json(json!({"message": "Login submitted. Check status.", "error": null})),
        )
            .into_response(),
    }
}

async fn status(State(backend): State<Arc<Backend>>) -> Json<Value> {
    let n = backend.status_calls.fetch_add(1, Ordering::SeqCst);
    if n < backend.pending_polls {
        Json(json!({"logged_in": false, "message": "Current URL: https://app.example/log-in"}))
    } else {
        Json(json!({"logged_in": true, "message": "Login Detected"}))
    }
}

async fn holdings(State(backend): State<Arc<Backend>>) -> (StatusCode, Json<Value>) {
    if backend.holdings_missing {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Browser not active"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "raw_text": "Portfolio\nBHP Group 120\nVanguard Australian Shares 10",
            "message": "Data extracted. Parsing required."
        })),
    )
}

async fn recommend(Json(profile): Json<Value>) -> (StatusCode, Json<Value>) {
    if profile["currency"] == "USD" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Currency USD is not supported yet"})),
        );
    }
    let assets = profile["assets"].as_array().cloned().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "risk_profile": format!("{} horizon", profile["horizon"].as_str().unwrap_or("?")),
            "universe": assets,
            "allocations": {"VAS.AX": 0.6, "VGS.AX": 0.4},
        })),
    )
}

async fn spawn_backend(backend: Backend) -> (String, Arc<Backend>) {
    let backend = Arc::new(backend);
    let app = Router::new()
        .route("/api/connect-superhero", post(connect))
        .route("/api/superhero-status", get(status))
        .route("/api/superhero-holdings", get(holdings))
        .route("/api/recommend", post(recommend))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), backend)
}

fn client(base_url: &str) -> ConnectApiClient {
    ConnectApiClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn start_session_sends_credentials() {
    let (url, backend) = spawn_backend(Backend::default()).await;
    let reply = client(&url)
        .start_session(&Credentials::new("jane@example.com", "pw"))
        .await
        .unwrap();

    assert_eq!(reply, SessionStartReply::Started);
    let logins = backend.logins.lock().unwrap();
    assert_eq!(
        logins.as_slice(),
        &[json!({"username": "jane@example.com", "password": "pw"})]
    );
}

#[tokio::test]
async fn start_session_reports_backend_refusal() {
    let (url, _backend) = spawn_backend(Backend::default()).await;
    let reply = client(&url)
        .start_session(&Credentials::new("locked", "pw"))
        .await
        .unwrap();

    assert_eq!(
        reply,
        SessionStartReply::Rejected {
            error: Some("Login Automation Failed: account locked".to_string())
        }
    );
}

#[tokio::test]
async fn start_session_error_field_on_success_is_a_refusal() {
    let (url, _backend) = spawn_backend(Backend::default()).await;
    let reply = client(&url)
        .start_session(&Credentials::new("busy", "pw"))
        .await
        .unwrap();

    assert_eq!(
        reply,
        SessionStartReply::Rejected {
            error: Some("Browser session already active".to_string())
        }
    );
}

#[tokio::test]
async fn start_session_non_json_body_is_a_transport_error() {
    let (url, _backend) = spawn_backend(Backend::default()).await;
    let err = client(&url)
        .start_session(&Credentials::new("maintenance", "pw"))
        .await
        .unwrap_err();

    assert!(err.is_transport(), "unexpected error: {err:?}");
    assert_eq!(
        interpret_session_reply(Err(err)),
        InitiationOutcome::Failed {
            message: BACKEND_OFFLINE_MESSAGE.to_string()
        }
    );
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&url)
        .start_session(&Credentials::new("jane", "pw"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn status_and_holdings_decode() {
    let (url, _backend) = spawn_backend(Backend {
        pending_polls: 1,
        ..Backend::default()
    })
    .await;
    let api = client(&url);

    let first = api.login_status().await.unwrap();
    assert!(!first.logged_in);
    assert_eq!(
        first.message.as_deref(),
        Some("Current URL: https://app.example/log-in")
    );
    assert!(api.login_status().await.unwrap().logged_in);

    let payload = api.holdings().await.unwrap();
    assert!(payload.raw_text.unwrap().contains("BHP Group"));
}

#[tokio::test]
async fn holdings_error_status_is_an_api_error() {
    let (url, _backend) = spawn_backend(Backend {
        holdings_missing: true,
        ..Backend::default()
    })
    .await;

    let err = client(&url).holdings().await.unwrap_err();
    match err {
        ConnectError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Browser not active");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn recommend_passes_result_through() {
    let (url, _backend) = spawn_backend(Backend::default()).await;
    let api = client(&url);

    let result = api.recommend(&InvestorProfile::default()).await.unwrap();
    assert_eq!(result.risk_profile(), Some(&json!("medium horizon")));
    assert_eq!(result.as_value()["allocations"]["VAS.AX"], json!(0.6));

    let usd = InvestorProfile {
        currency: Currency::Usd,
        ..InvestorProfile::default()
    };
    match api.recommend(&usd).await.unwrap_err() {
        ConnectError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Currency USD is not supported yet");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn invalid_profile_is_rejected_locally() {
    let (url, _backend) = spawn_backend(Backend::default()).await;
    let empty = InvestorProfile {
        assets: Vec::new(),
        ..InvestorProfile::default()
    };
    let err = client(&url).recommend(&empty).await.unwrap_err();
    assert!(matches!(err, ConnectError::Core(_)));
}

#[tokio::test]
async fn controller_runs_full_flow_over_http() {
    let (url, backend) = spawn_backend(Backend {
        pending_polls: 2,
        ..Backend::default()
    })
    .await;

    let (observer, mut updates) = ChannelObserver::new();
    let controller = ConnectionController::new(
        Arc::new(client(&url)),
        ControllerOptions::default()
            .with_poll_config(PollConfig::default().with_interval(Duration::from_millis(20)))
            .with_observer(Arc::new(observer)),
    );
    controller.start().unwrap();
    controller
        .submit(Credentials::new("jane@example.com", "pw"))
        .unwrap();

    let synced = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(snapshot) = updates.recv().await {
            if snapshot.holdings == HoldingsSyncStatus::Synced {
                return snapshot;
            }
        }
        panic!("observer channel closed");
    })
    .await
    .expect("holdings were not synced in time");

    assert_eq!(synced.state, ConnectionState::Connected);
    assert_eq!(synced.message, HOLDINGS_SYNCED_MESSAGE);
    assert!(!controller.is_polling());
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);
}
