//! Persisted metrics aggregate and the snapshot handed to reporting code.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Identifier of a bot user.
///
/// Chat platforms hand out numeric ids, but older records stored them as
/// strings, so both shapes are accepted and kept distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    /// 64-bit numeric identifier.
    Numeric(i64),
    /// Free-form string identifier.
    Text(String),
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId::Numeric(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::Text(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId::Text(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(id) => write!(f, "{}", id),
            UserId::Text(id) => f.write_str(id),
        }
    }
}

/// Counters for one accounting window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Distinct users seen in this window.
    pub users: BTreeSet<UserId>,

    /// Download events recorded in this window.
    pub downloads: u64,
}

impl Window {
    /// Add a user to the window. Returns `true` if the user was new.
    pub fn insert_user(&mut self, user: UserId) -> bool {
        self.users.insert(user)
    }

    /// Count one download.
    pub fn add_download(&mut self) {
        self.downloads = self.downloads.saturating_add(1);
    }

    /// Number of distinct users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

/// A calendar month, ordered by (year, month). Serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MonthStamp {
    year: i32,
    month: u32,
}

impl MonthStamp {
    /// Build a stamp, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month a date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1-based.
    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthStamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {:?}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|e| format!("invalid year in {:?}: {}", s, e))?;
        let month: u32 = month
            .parse()
            .map_err(|e| format!("invalid month in {:?}: {}", s, e))?;
        Self::new(year, month).ok_or_else(|| format!("month out of range in {:?}", s))
    }
}

impl From<MonthStamp> for String {
    fn from(stamp: MonthStamp) -> Self {
        stamp.to_string()
    }
}

impl TryFrom<String> for MonthStamp {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The single persisted aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsState {
    /// Current day's window.
    pub daily: Window,

    /// Current month's window.
    pub monthly: Window,

    /// Date the daily window was last reset (`None` = never rotated).
    pub last_daily_reset: Option<NaiveDate>,

    /// Month the monthly window was last reset (`None` = never rotated).
    pub last_monthly_reset: Option<MonthStamp>,
}

impl MetricsState {
    /// Create a fresh state with empty windows and no reset markers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit in both windows.
    pub fn record_visit(&mut self, user: UserId) {
        self.daily.insert_user(user.clone());
        self.monthly.insert_user(user);
    }

    /// Record a download in both windows. A download also counts as a visit.
    pub fn record_download(&mut self, user: UserId) {
        self.record_visit(user);
        self.daily.add_download();
        self.monthly.add_download();
    }
}

/// Point-in-time counts for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Distinct users today.
    pub daily_users: usize,
    /// Downloads today.
    pub daily_downloads: u64,
    /// Distinct users this month.
    pub monthly_users: usize,
    /// Downloads this month.
    pub monthly_downloads: u64,
}

impl From<&MetricsState> for Snapshot {
    fn from(state: &MetricsState) -> Self {
        Self {
            daily_users: state.daily.user_count(),
            daily_downloads: state.daily.downloads,
            monthly_users: state.monthly.user_count(),
            monthly_downloads: state.monthly.downloads,
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Daily Stats")?;
        writeln!(f, "Users: {}", self.daily_users)?;
        writeln!(f, "Downloads: {}", self.daily_downloads)?;
        writeln!(f)?;
        writeln!(f, "Monthly Stats")?;
        writeln!(f, "Users: {}", self.monthly_users)?;
        write!(f, "Downloads: {}", self.monthly_downloads)
    }
}
