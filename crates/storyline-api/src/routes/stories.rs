//! Routes for originating, extending, releasing, and viewing stories.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use storyline_core::story::StoryId;
use storyline_stories::application::line_editor::{self, SubmitOutcome};
use storyline_stories::application::lock_manager;
use storyline_stories::application::query_handlers::{self, StoryView};
use storyline_stories::domain::commands;
use storyline_stories::domain::lock_policy::LockPolicy;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct OriginateStoryRequest {
    /// The writer starting the story.
    pub display_name: String,
    /// The opening line.
    pub text: String,
    /// Line limit; the configured default when omitted.
    #[serde(default)]
    pub max_lines: Option<u32>,
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct OriginateStoryResponse {
    /// The new story.
    pub story_id: StoryId,
}

/// Request body for POST /{id}/lines.
#[derive(Debug, Deserialize)]
pub struct SubmitLineRequest {
    /// The writer holding the lock.
    pub display_name: String,
    /// The line to append.
    pub text: String,
}

/// Request body for POST /{id}/release.
#[derive(Debug, Deserialize)]
pub struct ReleaseLockRequest {
    /// The writer giving the story up.
    pub display_name: String,
}

/// POST /
#[instrument(skip(state, request), fields(display_name = %request.display_name))]
async fn originate_story(
    State(state): State<AppState>,
    Json(request): Json<OriginateStoryRequest>,
) -> Result<(StatusCode, Json<OriginateStoryResponse>), ApiError> {
    let author = state.identity_store.resolve(&request.display_name).await?;
    let command = commands::OriginateStory {
        correlation_id: Uuid::new_v4(),
        max_lines: request.max_lines.unwrap_or(state.config.max_lines_default),
        author,
        text: request.text,
    };

    info!(correlation_id = %command.correlation_id, "handling originate_story command");

    let story_id = line_editor::handle_originate_story(
        &command,
        state.story_repository.as_ref(),
        state.identity_store.as_ref(),
        state.notifier.as_ref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(OriginateStoryResponse { story_id }),
    ))
}

/// POST /{id}/lines
#[instrument(skip(state, request), fields(display_name = %request.display_name))]
async fn submit_line(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Json(request): Json<SubmitLineRequest>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    let user_id = state.identity_store.resolve(&request.display_name).await?;
    let command = commands::SubmitLine {
        correlation_id: Uuid::new_v4(),
        story_id: StoryId(story_id),
        user_id,
        text: request.text,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_line command");

    let outcome = line_editor::handle_submit_line(
        &command,
        state.story_repository.as_ref(),
        state.identity_store.as_ref(),
        state.notifier.as_ref(),
    )
    .await?;

    Ok(Json(outcome))
}

/// POST /{id}/release
#[instrument(skip(state, request), fields(display_name = %request.display_name))]
async fn release_lock(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Json(request): Json<ReleaseLockRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.identity_store.resolve(&request.display_name).await?;
    let command = commands::ReleaseLock {
        correlation_id: Uuid::new_v4(),
        story_id: StoryId(story_id),
        user_id,
    };

    info!(correlation_id = %command.correlation_id, "handling release_lock command");

    lock_manager::handle_release_lock(
        &command,
        &LockPolicy::from_config(&state.config),
        state.clock.as_ref(),
        state.story_repository.as_ref(),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_story(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
) -> Result<Json<StoryView>, ApiError> {
    let view = query_handlers::get_story_by_id(
        StoryId(story_id),
        state.story_repository.as_ref(),
        state.identity_store.as_ref(),
    )
    .await?;

    Ok(Json(view))
}

/// Returns the router for stories.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(originate_story))
        .route("/{id}", get(get_story))
        .route("/{id}/lines", post(submit_line))
        .route("/{id}/release", post(release_lock))
}
