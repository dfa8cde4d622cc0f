//! Routes for turn assignment.

use std::collections::BTreeSet;

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use storyline_core::story::StoryId;
use storyline_stories::application::turns::{self, TurnAssignment};
use storyline_stories::domain::commands;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /next.
#[derive(Debug, Deserialize)]
pub struct NextTurnRequest {
    /// The writer asking for work.
    pub display_name: String,
    /// The story the writer is leaving, released before selection.
    #[serde(default)]
    pub previous_story_id: Option<StoryId>,
    /// Stories the writer has already been shown this session.
    #[serde(default)]
    pub seen_story_ids: BTreeSet<StoryId>,
}

/// POST /next
#[instrument(skip(state, request), fields(display_name = %request.display_name))]
async fn next_turn(
    State(state): State<AppState>,
    Json(request): Json<NextTurnRequest>,
) -> Result<Json<TurnAssignment>, ApiError> {
    let user_id = state.identity_store.resolve(&request.display_name).await?;
    let command = commands::NextTurn {
        correlation_id: Uuid::new_v4(),
        user_id,
        previous_story_id: request.previous_story_id,
        seen_story_ids: request.seen_story_ids,
    };

    info!(correlation_id = %command.correlation_id, "handling next_turn command");

    let assignment = turns::handle_next_turn(
        &command,
        &state.config,
        state.clock.as_ref(),
        state.rng.as_ref(),
        state.story_repository.as_ref(),
        state.identity_store.as_ref(),
    )
    .await?;

    Ok(Json(assignment))
}

/// Returns the router for turn assignment.
pub fn router() -> Router<AppState> {
    Router::new().route("/next", post(next_turn))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::StatusCode;
    use storyline_core::repository::StoryRepository;
    use storyline_core::story::SeedLine;

    use crate::routes::test_support::{context, send};

    #[tokio::test]
    async fn test_next_turn_without_stories_invites_origination() {
        // Arrange
        let ctx = context();
        ctx.identity.add("alice");
        let app = router().with_state(ctx.state);

        // Act
        let (status, json) = send(
            app,
            "POST",
            "/next",
            Some(serde_json::json!({ "display_name": "alice" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["mode"], "origination");
        assert_eq!(json["max_lines"], 5);
    }

    #[tokio::test]
    async fn test_next_turn_assigns_and_locks_story() {
        // Arrange
        let ctx = context();
        let alice = ctx.identity.add("alice");
        let id = ctx
            .repo
            .create(5, SeedLine::prompt("I am an invisible man."))
            .await
            .unwrap();
        let app = router().with_state(ctx.state);

        // Act
        let (status, json) = send(
            app,
            "POST",
            "/next",
            Some(serde_json::json!({ "display_name": "alice", "seen_story_ids": [] })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["mode"], "continuation");
        assert_eq!(json["story_id"], id.0);
        assert_eq!(json["previous_line"], "I am an invisible man.");
        assert!(json["previous_author"].is_null());
        assert_eq!(json["line_number"], 2);
        assert!(ctx.repo.fetch(id).await.unwrap().is_locked_by(alice));
    }

    #[tokio::test]
    async fn test_next_turn_unknown_user_returns_404() {
        let ctx = context();
        let app = router().with_state(ctx.state);

        let (status, json) = send(
            app,
            "POST",
            "/next",
            Some(serde_json::json!({ "display_name": "ghost" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "user_not_found");
    }
}
