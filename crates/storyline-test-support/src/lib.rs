//! In-memory backends and test doubles for the Storyline service.

mod clock;
mod identity;
mod notifier;
mod repository;
mod rng;

pub use clock::FixedClock;
pub use identity::InMemoryIdentityStore;
pub use notifier::{FailingNotifier, RecordingNotifier};
pub use repository::{FailingStoryRepository, InMemoryStoryRepository};
pub use rng::{MockRng, SequenceRng};
