use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info};

use super::battles::fetch_total_battles;
use super::counters::fetch_scalar_counts;
use super::popularity::fetch_popular_categories;
use super::trends::{TrendWindow, fetch_voting_trends};
use crate::config::AnalyticsConfig;
use crate::models::DashboardSnapshot;
use crate::store::DataStore;

/// Computes [`DashboardSnapshot`]s from a [`DataStore`].
///
/// Every computation is a read followed by a pure reduction, so a refresh can
/// be abandoned at any await point without leaving anything behind.
pub struct AnalyticsAggregator<S> {
    store: S,
    top_categories: usize,
    trend_window: TrendWindow,
}

impl<S: DataStore> AnalyticsAggregator<S> {
    pub fn new(store: S, config: &AnalyticsConfig) -> Result<Self> {
        Ok(Self {
            store,
            top_categories: config.top_categories,
            trend_window: config.trend_window()?,
        })
    }

    /// Computes a snapshot as of now.
    pub async fn compute(&self) -> DashboardSnapshot {
        self.compute_at(Utc::now()).await
    }

    /// Runs the four computations concurrently and assembles the snapshot.
    ///
    /// Never fails: a computation whose reads fail is logged and contributes
    /// zeros or empty lists while the others keep their results.
    #[tracing::instrument(skip(self))]
    pub async fn compute_at(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        let (counts, battles, popular, trends) = tokio::join!(
            fetch_scalar_counts(&self.store, now),
            fetch_total_battles(&self.store),
            fetch_popular_categories(&self.store, self.top_categories),
            fetch_voting_trends(&self.store, now, &self.trend_window),
        );

        let snapshot = DashboardSnapshot {
            generated_at: Some(now),
            total_battles: or_default(battles, "battle estimate"),
            total_votes: counts.total_votes,
            total_clips: counts.total_clips,
            active_categories: counts.active_categories,
            popular_categories: or_default(popular, "category ranking"),
            voting_trends: or_default(trends, "voting trends"),
            loading: false,
        };

        info!(
            total_battles = snapshot.total_battles,
            total_votes = snapshot.total_votes,
            total_clips = snapshot.total_clips,
            active_categories = snapshot.active_categories,
            popular = snapshot.popular_categories.len(),
            trend_days = snapshot.voting_trends.len(),
            "Dashboard computed"
        );
        snapshot
    }

    /// Publishes a loading placeholder, then the computed snapshot.
    pub async fn refresh(&self, state: &watch::Sender<DashboardSnapshot>) {
        state.send_replace(DashboardSnapshot::loading());
        let snapshot = self.compute().await;
        state.send_replace(snapshot);
    }
}

fn or_default<T: Default>(result: Result<T>, computation: &str) -> T {
    result.unwrap_or_else(|e| {
        error!(computation, error = %format!("{e:#}"), "Computation failed, using empty result");
        T::default()
    })
}
