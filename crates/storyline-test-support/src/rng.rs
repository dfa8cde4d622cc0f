//! Scripted `DeterministicRng` doubles for steering the selector's draw.

use storyline_core::rng::DeterministicRng;

/// Always draws the lowest index, so the selector takes its first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }
}

/// Replays a fixed list of draws, clamping each into the requested range.
/// Once the list runs out every further draw returns `min`.
#[derive(Debug, Clone, Default)]
pub struct SequenceRng {
    draws: std::collections::VecDeque<u32>,
}

impl SequenceRng {
    /// Scripts the given draws in order.
    #[must_use]
    pub fn new(draws: Vec<u32>) -> Self {
        Self {
            draws: draws.into(),
        }
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.draws
            .pop_front()
            .map_or(min, |draw| draw.clamp(min, max.max(min)))
    }
}
