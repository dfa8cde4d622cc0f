//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::PgPool;
use storyline_core::clock::Clock;
use storyline_core::config::StoryConfig;
use storyline_core::rng::DeterministicRng;
use storyline_store::pg_identity_store::PgIdentityStore;
use storyline_store::pg_story_repository::PgStoryRepository;
use storyline_test_support::{FixedClock, MockRng, RecordingNotifier};
use tower::ServiceExt;

use storyline_api::routes;
use storyline_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router over real Postgres stores with a deterministic
/// clock and RNG. Returns the notifier so tests can inspect completions.
pub fn build_test_app(pool: PgPool) -> (Router, Arc<RecordingNotifier>) {
    build_test_app_with_config(pool, StoryConfig::default())
}

/// Same as [`build_test_app`] with custom story tunables.
pub fn build_test_app_with_config(
    pool: PgPool,
    config: StoryConfig,
) -> (Router, Arc<RecordingNotifier>) {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
    let notifier = Arc::new(RecordingNotifier::new());
    let app_state = AppState::new(
        fixed_clock(),
        rng,
        Arc::new(PgStoryRepository::new(pool.clone())),
        Arc::new(PgIdentityStore::new(pool)),
        notifier.clone(),
        config,
    );

    (routes::app(app_state), notifier)
}

/// Send a request with an optional JSON body and return the status and body
/// (`Null` when the body is empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Register a user through the API.
pub async fn register(app: &Router, display_name: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/users",
        Some(&serde_json::json!({
            "display_name": display_name,
            "external_id": format!("ext-{display_name}"),
            "first_name": display_name,
            "last_name": "Writer",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
