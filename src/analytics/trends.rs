//! Daily vote counts over the trailing window.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Utc};
use tracing::debug;

use crate::models::VotingTrend;
use crate::store::DataStore;

/// Which calendar a vote's timestamp is assigned to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayBoundary {
    /// The host's local time zone, DST included.
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DayBoundary {
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("UTC offset of {minutes} minutes is out of range"))?;
        Ok(DayBoundary::Fixed(offset))
    }

    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            DayBoundary::Local => at.with_timezone(&Local).date_naive(),
            DayBoundary::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }
}

/// Shape of the trend query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendWindow {
    pub span: Duration,
    pub max_buckets: usize,
    pub boundary: DayBoundary,
}

impl Default for TrendWindow {
    fn default() -> Self {
        TrendWindow {
            span: Duration::days(7),
            max_buckets: 7,
            boundary: DayBoundary::Local,
        }
    }
}

impl TrendWindow {
    /// Oldest instant inside the window, clamped to the earliest representable one.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.span)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.start(now) <= at && at <= now
    }
}

/// Buckets vote timestamps by calendar day.
///
/// Timestamps outside `[now - span, now]` are ignored. Buckets come out in
/// chronological order and only the latest `max_buckets` days are kept.
pub fn bin_voting_trends(
    stamps: &[DateTime<Utc>],
    now: DateTime<Utc>,
    window: &TrendWindow,
) -> Vec<VotingTrend> {
    let mut in_window: Vec<DateTime<Utc>> = stamps
        .iter()
        .copied()
        .filter(|at| window.contains(*at, now))
        .collect();
    in_window.sort_unstable();

    let mut trends = in_window
        .into_iter()
        .map(|at| window.boundary.date_of(at))
        .fold(Vec::<VotingTrend>::new(), |mut trends, date| {
            match trends.last_mut() {
                Some(last) if last.date == date => last.vote_count += 1,
                _ => trends.push(VotingTrend {
                    date,
                    vote_count: 1,
                }),
            }
            trends
        });

    let excess = trends.len().saturating_sub(window.max_buckets);
    trends.drain(..excess);
    trends
}

/// Reads the votes cast inside the window and bins them.
pub async fn fetch_voting_trends<S>(
    store: &S,
    now: DateTime<Utc>,
    window: &TrendWindow,
) -> Result<Vec<VotingTrend>>
where
    S: DataStore + ?Sized,
{
    let stamps = store.list_votes_since(window.start(now)).await?;
    let trends = bin_voting_trends(&stamps, now, window);
    debug!(votes = stamps.len(), buckets = trends.len(), "Binned voting trends");
    Ok(trends)
}
