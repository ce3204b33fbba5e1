use std::collections::HashMap;

use super::question::Difficulty;
use super::session::CompletionSet;

/// Per-question countdown state: question index -> remaining whole seconds.
///
/// Entries are created lazily the first time a question becomes current and
/// are never reset by navigation; a completed question's entry is frozen at
/// zero. Remaining seconds stay within [0, duration] at all times.
#[derive(Debug, Default)]
pub struct TimerBank {
    remaining: HashMap<usize, u32>,
}

impl TimerBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the countdown for a question to the full duration for
    /// its difficulty. Idempotent: re-entering a question keeps its clock.
    pub fn start(&mut self, index: usize, difficulty: Difficulty) {
        self.remaining
            .entry(index)
            .or_insert_with(|| difficulty.duration_secs());
    }

    /// Decrements the countdown by one second, floored at zero. No-op for
    /// completed questions and for clocks already at zero. Returns the
    /// remaining seconds after the tick.
    pub fn tick(&mut self, index: usize, completed: &CompletionSet) -> u32 {
        if completed.contains(index) {
            return self.remaining(index).unwrap_or(0);
        }
        match self.remaining.get_mut(&index) {
            Some(secs) => {
                *secs = secs.saturating_sub(1);
                *secs
            }
            None => 0,
        }
    }

    /// Freezes a question's clock at zero on successful submission. The
    /// prior value is overwritten, not deleted.
    pub fn freeze(&mut self, index: usize) {
        self.remaining.insert(index, 0);
    }

    /// Remaining seconds, if the clock has been started
    pub fn remaining(&self, index: usize) -> Option<u32> {
        self.remaining.get(&index).copied()
    }

    /// True when the question's countdown has run out. A never-started
    /// clock reads as expired, matching the forward-navigation rule.
    pub fn is_expired(&self, index: usize) -> bool {
        self.remaining(index).unwrap_or(0) == 0
    }
}
