//! Round-based retry policy for batch runs.
//!
//! Every pending year is attempted once per global round; the policy decides
//! whether another round follows and how long to wait before it. Higher layers
//! (scheduler) share it so tests can run with zero delay.

mod policy;

pub use policy::{RoundDecision, RoundPolicy};
