//! Wall-clock admission and jitter.
//!
//! [`PostingWindow`] decides whether an instant falls inside the daytime
//! window of a fixed civil time zone, independent of the host's local zone.
//! [`DelayRange`] picks the random pause taken before a post goes out.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use rand::Rng;
use std::time::Duration;

/// Hours `[start_hour, end_hour)` in `tz` during which posting is allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostingWindow {
    pub tz: Tz,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl PostingWindow {
    /// Hour of `instant` on the window's wall clock.
    pub fn local_hour(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.tz).hour()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let hour = self.local_hour(instant);
        let allowed = self.start_hour <= hour && hour < self.end_hour;
        tracing::debug!(hour, allowed, tz = %self.tz, "Evaluated posting window");
        allowed
    }
}

/// Inclusive range of minutes to sleep before posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_minutes: u64,
    pub max_minutes: u64,
}

impl DelayRange {
    /// Pick a whole number of minutes uniformly from `[min, max]`.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Duration {
        let minutes = rng.random_range(self.min_minutes..=self.max_minutes);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}
