//! Section feed state machine: decides when incremental loading is exhausted.

/// State of one section's paginated grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    /// A load was triggered and the busy indicator may be active.
    Loading,
    /// The busy indicator cleared; the card list can be observed.
    Stable,
    /// No more items will appear: stagnation budget spent, or the section is empty.
    Exhausted,
}

/// Tracks card counts across load triggers.
///
/// Growth resets the stagnation counter; a non-growing observation increments
/// it. The section is exhausted after `max_failed_attempts` consecutive
/// non-growing observations, or on the first observation if nothing was ever listed.
#[derive(Debug, Clone)]
pub struct GrowthTracker {
    max_failed_attempts: u32,
    last_seen: usize,
    no_growth: u32,
    state: DiscoveryState,
}

impl GrowthTracker {
    pub fn new(max_failed_attempts: u32) -> Self {
        Self {
            max_failed_attempts: max_failed_attempts.max(1),
            last_seen: 0,
            no_growth: 0,
            state: DiscoveryState::Loading,
        }
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Largest card count observed so far.
    pub fn last_seen(&self) -> usize {
        self.last_seen
    }

    /// Consecutive observations without growth.
    pub fn no_growth(&self) -> u32 {
        self.no_growth
    }

    /// A scroll/pagination action was issued.
    pub fn triggered(&mut self) {
        if self.state != DiscoveryState::Exhausted {
            self.state = DiscoveryState::Loading;
        }
    }

    /// The busy indicator cleared (or was never shown).
    pub fn settled(&mut self) {
        if self.state == DiscoveryState::Loading {
            self.state = DiscoveryState::Stable;
        }
    }

    /// Records the card count seen after a load settled and returns the new state.
    pub fn observe(&mut self, count: usize) -> DiscoveryState {
        if self.state == DiscoveryState::Exhausted {
            return self.state;
        }
        if count == 0 && self.last_seen == 0 {
            self.state = DiscoveryState::Exhausted;
        } else if count > self.last_seen {
            self.last_seen = count;
            self.no_growth = 0;
            self.state = DiscoveryState::Stable;
        } else {
            self.no_growth += 1;
            self.state = if self.no_growth >= self.max_failed_attempts {
                DiscoveryState::Exhausted
            } else {
                DiscoveryState::Stable
            };
        }
        self.state
    }
}
