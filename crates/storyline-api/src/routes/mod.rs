//! Route modules, one per resource.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod stories;
pub mod turns;
pub mod users;

/// Builds the full application router. Layers are added by the caller.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/users", users::router())
        .nest("/api/v1/turns", turns::router())
        .nest("/api/v1/stories", stories::router())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use storyline_core::clock::Clock;
    use storyline_core::config::StoryConfig;
    use storyline_core::rng::DeterministicRng;
    use storyline_test_support::{
        FixedClock, InMemoryIdentityStore, InMemoryStoryRepository, MockRng, RecordingNotifier,
    };
    use tower::ServiceExt;

    use crate::state::AppState;

    /// State backed by in-memory doubles, with handles kept for assertions.
    pub(crate) struct TestContext {
        pub(crate) state: AppState,
        pub(crate) repo: Arc<InMemoryStoryRepository>,
        pub(crate) identity: Arc<InMemoryIdentityStore>,
        pub(crate) notifier: Arc<RecordingNotifier>,
    }

    pub(crate) fn context() -> TestContext {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
        let repo = Arc::new(InMemoryStoryRepository::new());
        let identity = Arc::new(InMemoryIdentityStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let state = AppState::new(
            clock,
            rng,
            repo.clone(),
            identity.clone(),
            notifier.clone(),
            StoryConfig::default(),
        );
        TestContext {
            state,
            repo,
            identity,
            notifier,
        }
    }

    /// Sends one request and returns the status and JSON body (`Null` when
    /// the body is empty).
    pub(crate) async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
