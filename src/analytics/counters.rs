use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::models::Category;
use crate::store::DataStore;

/// The three headline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScalarCounts {
    pub total_votes: u64,
    pub total_clips: u64,
    pub active_categories: u64,
}

/// Counts categories that have not yet expired at `now`.
pub fn count_active_categories(categories: &[Category], now: DateTime<Utc>) -> u64 {
    categories.iter().filter(|c| c.is_active(now)).count() as u64
}

/// Reads the three counters concurrently. A counter whose read fails is
/// reported and reads as zero; the others are unaffected.
pub async fn fetch_scalar_counts<S>(store: &S, now: DateTime<Utc>) -> ScalarCounts
where
    S: DataStore + ?Sized,
{
    let (votes, clips, active) = tokio::join!(
        store.count_votes(),
        store.count_clips(),
        store.count_active_categories(now),
    );

    ScalarCounts {
        total_votes: or_zero(votes, "total_votes"),
        total_clips: or_zero(clips, "total_clips"),
        active_categories: or_zero(active, "active_categories"),
    }
}

fn or_zero(result: anyhow::Result<u64>, counter: &str) -> u64 {
    result.unwrap_or_else(|e| {
        warn!(counter, error = %e, "Counter read failed, reporting 0");
        0
    })
}
