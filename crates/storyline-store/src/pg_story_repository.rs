//! `PostgreSQL` implementation of the `StoryRepository` trait.
//!
//! `update` runs inside a transaction that holds a row lock on the story
//! (`SELECT ... FOR UPDATE`) from the read through the commit, so concurrent
//! decisions on the same story are serialized by the database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgExecutor, PgRow};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use storyline_core::error::DomainError;
use storyline_core::repository::{StoryDecision, StoryRepository, StoryWrite};
use storyline_core::story::{Line, LockState, SeedLine, Story, StoryId, UserId};

/// PostgreSQL-backed story repository.
#[derive(Debug, Clone)]
pub struct PgStoryRepository {
    pool: PgPool,
}

impl PgStoryRepository {
    /// Creates a new `PgStoryRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn infra(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

fn to_u32(value: i32, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::Infrastructure(format!("negative {column}: {value}")))
}

fn to_i32(value: u32, column: &str) -> Result<i32, DomainError> {
    i32::try_from(value)
        .map_err(|_| DomainError::Infrastructure(format!("{column} out of range: {value}")))
}

/// Builds a story without lines from a `stories` row.
fn story_from_row(row: &PgRow) -> Result<Story, DomainError> {
    let id: i64 = row.try_get("id").map_err(infra)?;
    let max_lines: i32 = row.try_get("max_lines").map_err(infra)?;
    let locked_by: Option<Uuid> = row.try_get("locked_by").map_err(infra)?;
    let locked_at: Option<DateTime<Utc>> = row.try_get("locked_at").map_err(infra)?;

    let lock = match (locked_by, locked_at) {
        (Some(holder), Some(acquired_at)) => Some(LockState {
            holder: UserId(holder),
            acquired_at,
        }),
        _ => None,
    };

    Ok(Story {
        id: StoryId(id),
        max_lines: to_u32(max_lines, "max_lines")?,
        lines: Vec::new(),
        lock,
    })
}

fn line_from_row(row: &PgRow) -> Result<Line, DomainError> {
    let index: i32 = row.try_get("line_idx").map_err(infra)?;
    let author: Option<Uuid> = row.try_get("author").map_err(infra)?;
    Ok(Line {
        index: to_u32(index, "line_idx")?,
        text: row.try_get("text").map_err(infra)?,
        author: author.map(UserId),
    })
}

async fn load_lines<'e, E: PgExecutor<'e>>(
    executor: E,
    story_id: StoryId,
) -> Result<Vec<Line>, DomainError> {
    let rows = sqlx::query(
        "SELECT line_idx, text, author FROM story_lines WHERE story_id = $1 ORDER BY line_idx",
    )
    .bind(story_id.0)
    .fetch_all(executor)
    .await
    .map_err(infra)?;

    rows.iter().map(line_from_row).collect()
}

async fn insert_line<'e, E: PgExecutor<'e>>(
    executor: E,
    story_id: StoryId,
    line: &Line,
) -> Result<(), DomainError> {
    sqlx::query("INSERT INTO story_lines (story_id, line_idx, text, author) VALUES ($1, $2, $3, $4)")
        .bind(story_id.0)
        .bind(to_i32(line.index, "line_idx")?)
        .bind(&line.text)
        .bind(line.author.map(|a| a.0))
        .execute(executor)
        .await
        .map_err(infra)?;
    Ok(())
}

#[async_trait]
impl StoryRepository for PgStoryRepository {
    async fn fetch(&self, id: StoryId) -> Result<Story, DomainError> {
        let row = sqlx::query("SELECT id, max_lines, locked_by, locked_at FROM stories WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?
            .ok_or(DomainError::StoryNotFound(id))?;

        let mut story = story_from_row(&row)?;
        story.lines = load_lines(&self.pool, id).await?;
        Ok(story)
    }

    async fn create(&self, max_lines: u32, seed: SeedLine) -> Result<StoryId, DomainError> {
        if max_lines == 0 {
            return Err(DomainError::Validation("max_lines must be positive".into()));
        }
        if seed.text.trim().is_empty() {
            return Err(DomainError::Validation("line text must not be empty".into()));
        }

        let mut tx = self.pool.begin().await.map_err(infra)?;
        let id: i64 = sqlx::query("INSERT INTO stories (max_lines) VALUES ($1) RETURNING id")
            .bind(to_i32(max_lines, "max_lines")?)
            .fetch_one(&mut *tx)
            .await
            .map_err(infra)?
            .try_get("id")
            .map_err(infra)?;
        let story_id = StoryId(id);
        let first = Line {
            index: 0,
            text: seed.text,
            author: seed.author,
        };
        insert_line(&mut *tx, story_id, &first).await?;
        tx.commit().await.map_err(infra)?;

        debug!(story_id = %story_id, max_lines, "story row created");
        Ok(story_id)
    }

    async fn update(&self, id: StoryId, decide: StoryDecision<'_>) -> Result<Story, DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        let row = sqlx::query(
            "SELECT id, max_lines, locked_by, locked_at FROM stories WHERE id = $1 FOR UPDATE",
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(infra)?
        .ok_or(DomainError::StoryNotFound(id))?;
        let mut story = story_from_row(&row)?;
        story.lines = load_lines(&mut *tx, id).await?;

        // Dropping `tx` on any early return rolls the transaction back.
        let write = decide(&story)?;
        story.apply(&write)?;

        match &write {
            StoryWrite::Unchanged => {}
            StoryWrite::SetLock(lock) => {
                sqlx::query("UPDATE stories SET locked_by = $2, locked_at = $3 WHERE id = $1")
                    .bind(id.0)
                    .bind(lock.map(|l| l.holder.0))
                    .bind(lock.map(|l| l.acquired_at))
                    .execute(&mut *tx)
                    .await
                    .map_err(infra)?;
            }
            StoryWrite::AppendLine(line) => {
                insert_line(&mut *tx, id, line).await?;
                sqlx::query("UPDATE stories SET locked_by = NULL, locked_at = NULL WHERE id = $1")
                    .bind(id.0)
                    .execute(&mut *tx)
                    .await
                    .map_err(infra)?;
            }
        }

        tx.commit().await.map_err(infra)?;
        Ok(story)
    }

    async fn list_incomplete(&self) -> Result<Vec<Story>, DomainError> {
        let rows = sqlx::query(
            "SELECT s.id, s.max_lines, s.locked_by, s.locked_at FROM stories s \
             WHERE (SELECT COUNT(*) FROM story_lines l WHERE l.story_id = s.id) < s.max_lines \
             ORDER BY s.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        let mut stories = BTreeMap::new();
        for row in &rows {
            let story = story_from_row(row)?;
            stories.insert(story.id.0, story);
        }
        if stories.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = stories.keys().copied().collect();
        let line_rows = sqlx::query(
            "SELECT story_id, line_idx, text, author FROM story_lines \
             WHERE story_id = ANY($1) ORDER BY story_id, line_idx",
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await
        .map_err(infra)?;

        for row in &line_rows {
            let story_id: i64 = row.try_get("story_id").map_err(infra)?;
            if let Some(story) = stories.get_mut(&story_id) {
                story.lines.push(line_from_row(row)?);
            }
        }

        Ok(stories.into_values().collect())
    }

    async fn has_story_starting_with(&self, text: &str) -> Result<bool, DomainError> {
        sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM story_lines WHERE line_idx = 0 AND text = $1) AS found",
        )
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(infra)?
        .try_get("found")
        .map_err(infra)
    }
}
