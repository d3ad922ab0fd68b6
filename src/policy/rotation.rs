//! Daily and monthly window rotation.
//!
//! Rotation compares the current calendar date against the last recorded
//! boundary with "greater than", never against a fixed trigger time. A
//! process that was offline at midnight therefore rotates on its next check,
//! and crossing several boundaries at once still yields a single reset.

use crate::state::models::{MetricsState, MonthStamp, Window};
use chrono::{DateTime, TimeZone};

/// Which windows a rotation check reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rotation {
    /// The daily window was reset.
    pub daily: bool,

    /// The monthly window was reset.
    pub monthly: bool,
}

impl Rotation {
    /// Whether any window was reset.
    pub fn any(&self) -> bool {
        self.daily || self.monthly
    }
}

/// Rotate windows whose boundary has passed, returning the new state.
///
/// The calendar date is taken in `now`'s own time zone, so callers choose
/// where midnight falls by choosing the offset of `now`.
pub fn maybe_rotate<Tz: TimeZone>(now: &DateTime<Tz>, mut state: MetricsState) -> MetricsState {
    rotate_in_place(&mut state, now);
    state
}

/// Rotate windows in place and report which ones were reset.
///
/// A clock that has moved backwards never rotates and never rewinds a marker.
pub fn rotate_in_place<Tz: TimeZone>(state: &mut MetricsState, now: &DateTime<Tz>) -> Rotation {
    let today = now.date_naive();
    let this_month = MonthStamp::of(today);
    let mut rotation = Rotation::default();

    if state.last_daily_reset.map_or(true, |last| today > last) {
        state.daily = Window::default();
        state.last_daily_reset = Some(today);
        rotation.daily = true;
    }

    if state
        .last_monthly_reset
        .map_or(true, |last| this_month > last)
    {
        state.monthly = Window::default();
        state.last_monthly_reset = Some(this_month);
        rotation.monthly = true;
    }

    rotation
}
