use std::time::Duration;

/// Decision returned after a round ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundDecision {
    /// No further rounds: either nothing is pending or the budget is spent.
    Stop,
    /// Run another round after the given delay.
    NextAfter(Duration),
}

/// Fixed-delay round policy.
#[derive(Debug, Clone, Copy)]
pub struct RoundPolicy {
    /// Maximum number of rounds (including the first).
    pub max_rounds: u32,
    /// Pause between consecutive rounds.
    pub delay: Duration,
}

impl Default for RoundPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            delay: Duration::from_secs(10),
        }
    }
}

impl RoundPolicy {
    /// `round` is 1-based (1 = first round just finished); `pending` is the
    /// number of years still without success.
    pub fn decide(&self, round: u32, pending: usize) -> RoundDecision {
        if pending == 0 || round >= self.max_rounds {
            return RoundDecision::Stop;
        }
        RoundDecision::NextAfter(self.delay)
    }
}
