//! Storyline API server entry point.

use std::sync::{Arc, Mutex};

use sqlx::postgres::PgPoolOptions;
use storyline_api::config::ServerConfig;
use storyline_api::error::AppError;
use storyline_api::notifier::LogNotifier;
use storyline_api::routes;
use storyline_api::state::AppState;
use storyline_api::telemetry;
use storyline_core::clock::{Clock, SystemClock};
use storyline_core::rng::{DeterministicRng, SystemRng};
use storyline_store::pg_identity_store::PgIdentityStore;
use storyline_store::pg_story_repository::PgStoryRepository;
use storyline_store::schema;
use storyline_stories::application::seeding::{self, DEFAULT_PROMPTS};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ServerConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!(
        max_lines_default = config.story.max_lines_default,
        lock_sunset_seconds = config.story.lock_sunset_seconds,
        "Starting Storyline API server"
    );

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    schema::run_migrations(&pool).await?;

    let story_repository = Arc::new(PgStoryRepository::new(pool.clone()));
    let identity_store = Arc::new(PgIdentityStore::new(pool));
    let notifier = Arc::new(LogNotifier);
    if config.seed_prompts {
        seeding::seed_prompts(
            &DEFAULT_PROMPTS,
            config.story.max_lines_default,
            story_repository.as_ref(),
            identity_store.as_ref(),
            notifier.as_ref(),
        )
        .await?;
    }

    // Build application state.
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(SystemRng::new()));
    let app_state = AppState::new(
        clock,
        rng,
        story_repository,
        identity_store,
        notifier,
        config.story,
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
