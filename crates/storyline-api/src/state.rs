//! Shared application state.

use std::sync::{Arc, Mutex};

use storyline_core::clock::Clock;
use storyline_core::config::StoryConfig;
use storyline_core::identity::IdentityStore;
use storyline_core::notifier::CompletionNotifier;
use storyline_core::repository::StoryRepository;
use storyline_core::rng::DeterministicRng;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for lock timestamps and expiry.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// RNG for the selector's draw.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Story persistence.
    pub story_repository: Arc<dyn StoryRepository>,
    /// User lookup and registration.
    pub identity_store: Arc<dyn IdentityStore>,
    /// Destination for completed stories.
    pub notifier: Arc<dyn CompletionNotifier>,
    /// Story tunables.
    pub config: StoryConfig,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        story_repository: Arc<dyn StoryRepository>,
        identity_store: Arc<dyn IdentityStore>,
        notifier: Arc<dyn CompletionNotifier>,
        config: StoryConfig,
    ) -> Self {
        Self {
            clock,
            rng,
            story_repository,
            identity_store,
            notifier,
            config,
        }
    }
}
