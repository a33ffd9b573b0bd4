//! Caller-contract violations.
//!
//! Nothing in this crate does I/O beyond reading the monotonic clock, so the
//! only failures are arguments that would otherwise divide by zero or produce
//! an empty fold.

use thiserror::Error;

/// Error returned when a caller breaks an operation's precondition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PhitError {
    /// `route(0)`: there is no destination to pick.
    #[error("route requires at least one destination")]
    NoDestinations,

    /// `next_range(0)`: the half-open range `[0, 0)` is empty.
    #[error("range upper bound must be greater than zero")]
    EmptyRange,

    /// `compound_sample(0)`: nothing to fold.
    #[error("compound sample requires at least one read")]
    NoReads,

    /// A configuration value outside its valid domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
