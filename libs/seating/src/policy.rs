//! Fixed protocol constants and the tunable policies

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SeatHold;

/// Lifetime of a seat hold. Not configurable.
pub const HOLD_TTL: Duration = Duration::from_secs(5 * 60);

/// How often seat-selection clients are expected to refresh availability
pub const AVAILABILITY_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// What happens when a user asks to hold a seat they already hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReholdPolicy {
    /// Insert another hold row next to the existing one
    #[default]
    Duplicate,
    /// Replace the caller's existing holds on those seats with fresh ones
    Refresh,
    /// Treat the caller's own live holds as taken
    Reject,
}

/// Same-user re-hold behaviour used when nothing else is configured
pub const DEFAULT_REHOLD_POLICY: ReholdPolicy = ReholdPolicy::Duplicate;

/// What cancelling a booking does to trip capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// Give the seats back to the trip's available-seat counter and drop
    /// the owner's holds on them
    #[default]
    ReclaimCapacity,
    /// Only flip the status; the counter stays decremented
    RetainCapacity,
}

/// Policy bundle handed to the seating components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Policies {
    #[serde(default)]
    pub rehold: ReholdPolicy,
    #[serde(default)]
    pub cancellation: CancellationPolicy,
}

/// Expiry instant of a hold placed at `now`
pub fn hold_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + TimeDelta::seconds(HOLD_TTL.as_secs() as i64)
}

/// A hold stops counting once its expiry instant is reached
pub fn is_expired(hold: &SeatHold, now: DateTime<Utc>) -> bool {
    hold.reserved_until <= now
}
