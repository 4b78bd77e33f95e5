//! Record types read from the store and the summaries derived from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A time-bounded voting pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Category {
    /// A category is active until its expiration instant has passed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at > now)
    }
}

/// An audio clip together with the category name the store resolved for it.
///
/// Both category fields are optional because the owning category may have
/// been deleted; such clips drop out of every per-category aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub id: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
}

/// A single vote cast on a clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub id: String,
    pub clip_id: String,
    pub created_at: DateTime<Utc>,
}

/// Popularity figures for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category_id: String,
    pub category_name: String,
    pub total_clips: u64,
    pub total_votes: u64,
}

/// Votes cast on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VotingTrend {
    pub date: NaiveDate,
    pub vote_count: u64,
}

/// Everything the dashboard shows, computed fresh on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: Option<DateTime<Utc>>,
    pub total_battles: u64,
    pub total_votes: u64,
    pub total_clips: u64,
    pub active_categories: u64,
    pub popular_categories: Vec<CategoryStats>,
    pub voting_trends: Vec<VotingTrend>,
    pub loading: bool,
}

impl DashboardSnapshot {
    /// The placeholder published before the first refresh completes.
    pub fn loading() -> Self {
        DashboardSnapshot {
            loading: true,
            ..Default::default()
        }
    }
}
