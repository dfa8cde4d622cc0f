//! Routes for user registration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::Serialize;
use storyline_core::error::DomainError;
use storyline_core::identity::NewUser;
use storyline_core::story::UserId;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterUserResponse {
    /// The new user's identifier.
    pub user_id: UserId,
    /// The registered display name.
    pub display_name: String,
}

/// POST /
#[instrument(skip(state, request), fields(display_name = %request.display_name))]
async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> Result<(StatusCode, Json<RegisterUserResponse>), ApiError> {
    if request.display_name.trim().is_empty() {
        return Err(DomainError::Validation("display_name must not be empty".into()).into());
    }
    let display_name = request.display_name.clone();
    let user_id = state.identity_store.register(request).await?;

    info!(user_id = %user_id, "handling register_user request");

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse {
            user_id,
            display_name,
        }),
    ))
}

/// Returns the router for user registration.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(register_user))
}
