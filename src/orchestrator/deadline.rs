//! Run-scoped deadline (spec.md §4.8 "Deadline", §9 "cooperative
//! cancellation via a shared deadline value checked at task entry").

use std::time::{Duration, Instant};

/// The minimum remaining budget a step/task requires before starting; below
/// this, the caller logs `skip reason=deadline` and returns without a
/// network call (spec.md §5 "Deadline reached").
pub const GRACE: Duration = Duration::from_secs(5);

/// `start_ts + hard_kill_sec`, shared by reference across lanes and worker
/// tasks within one run.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    hard_kill: Duration,
}

impl Deadline {
    pub fn starting_now(hard_kill: Duration) -> Self {
        Self {
            start: Instant::now(),
            hard_kill,
        }
    }

    pub fn time_left(&self) -> Duration {
        self.hard_kill.saturating_sub(self.start.elapsed())
    }

    /// `true` once fewer than [`GRACE`] remain.
    pub fn expired(&self) -> bool {
        self.time_left() < GRACE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_has_time_left() {
        let deadline = Deadline::starting_now(Duration::from_secs(60));
        assert!(!deadline.expired());
        assert!(deadline.time_left() <= Duration::from_secs(60));
    }

    #[test]
    fn zero_budget_deadline_is_immediately_expired() {
        let deadline = Deadline::starting_now(Duration::from_secs(0));
        assert!(deadline.expired());
    }
}
