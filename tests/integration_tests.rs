mod common;

use battle_analytics::analytics::AnalyticsAggregator;
use battle_analytics::config::{AnalyticsConfig, MAX_TREND_WINDOW_DAYS};
use battle_analytics::models::{CategoryStats, DashboardSnapshot, VotingTrend};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use common::MemoryStore;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

fn utc_config() -> AnalyticsConfig {
    AnalyticsConfig {
        utc_offset_minutes: Some(0),
        ..AnalyticsConfig::default()
    }
}

async fn dashboard(store: MemoryStore) -> DashboardSnapshot {
    AnalyticsAggregator::new(store, &utc_config())
        .unwrap()
        .compute_at(now())
        .await
}

#[tokio::test]
async fn test_empty_store() {
    let snapshot = dashboard(MemoryStore::default()).await;

    assert_eq!(
        snapshot,
        DashboardSnapshot {
            generated_at: Some(now()),
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_single_category_with_three_clips() {
    let mut store = MemoryStore::default();
    store.add_category("lofi", "Lo-fi", Some(now() + Duration::days(3)));
    for clip in ["c1", "c2", "c3"] {
        store.add_clip(clip, "lofi");
    }
    for (clip, hours_ago) in [("c1", 1), ("c1", 2), ("c2", 3), ("c3", 4), ("c3", 30)] {
        store.add_vote(clip, now() - Duration::hours(hours_ago));
    }

    let snapshot = dashboard(store).await;

    assert_eq!(snapshot.total_battles, 3);
    assert_eq!(snapshot.total_votes, 5);
    assert_eq!(snapshot.total_clips, 3);
    assert_eq!(snapshot.active_categories, 1);
    assert_eq!(
        snapshot.popular_categories,
        vec![CategoryStats {
            category_id: "lofi".to_string(),
            category_name: "Lo-fi".to_string(),
            total_clips: 3,
            total_votes: 5,
        }]
    );
    assert_eq!(
        snapshot.voting_trends,
        vec![
            VotingTrend {
                date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
                vote_count: 1,
            },
            VotingTrend {
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                vote_count: 4,
            },
        ]
    );
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_vote_on_clip_of_deleted_category() {
    let mut store = MemoryStore::default();
    store.add_category("live", "Live", Some(now() + Duration::days(1)));
    store.add_clip("kept", "live");
    store.add_clip("orphan", "deleted");
    store.add_vote("kept", now() - Duration::hours(1));
    store.add_vote("orphan", now() - Duration::hours(2));

    let snapshot = dashboard(store).await;

    assert_eq!(snapshot.popular_categories.len(), 1);
    assert_eq!(snapshot.popular_categories[0].total_votes, 1);
    // trends do not depend on category resolution
    let trend_total: u64 = snapshot.voting_trends.iter().map(|t| t.vote_count).sum();
    assert_eq!(trend_total, 2);
    assert_eq!(snapshot.total_votes, 2);
}

#[tokio::test]
async fn test_trends_cover_only_the_trailing_week() {
    let mut store = MemoryStore::default();
    store.add_category("a", "A", Some(now() + Duration::days(1)));
    store.add_clip("c", "a");
    for days_ago in 0..10 {
        store.add_vote("c", now() - Duration::days(days_ago));
    }
    store.add_vote("c", now() - Duration::days(40));

    let snapshot = dashboard(store).await;
    let dates: Vec<NaiveDate> = snapshot.voting_trends.iter().map(|t| t.date).collect();

    assert_eq!(dates.len(), 7);
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(dates.first(), NaiveDate::from_ymd_opt(2026, 10, 10).as_ref());
    assert_eq!(dates.last(), NaiveDate::from_ymd_opt(2026, 10, 16).as_ref());
    assert_eq!(snapshot.total_votes, 11);
}

#[tokio::test]
async fn test_expired_categories_still_count_battles() {
    let mut store = MemoryStore::default();
    store.add_category("old", "Old", Some(now() - Duration::days(30)));
    store.add_category("new", "New", Some(now() + Duration::days(30)));
    for clip in ["o1", "o2", "o3", "o4"] {
        store.add_clip(clip, "old");
    }
    store.add_clip("n1", "new");
    store.add_clip("n2", "new");

    let snapshot = dashboard(store).await;

    assert_eq!(snapshot.total_battles, 6 + 1);
    assert_eq!(snapshot.active_categories, 1);
}

#[tokio::test]
async fn test_failed_reads_degrade_only_their_sections() {
    let mut store = MemoryStore::default();
    store.add_category("a", "A", Some(now() + Duration::days(1)));
    store.add_clip("c1", "a");
    store.add_clip("c2", "a");
    store.add_vote("c1", now());
    store.votes_unavailable = true;

    let snapshot = dashboard(store).await;

    assert_eq!(snapshot.total_votes, 0);
    assert!(snapshot.popular_categories.is_empty());
    assert!(snapshot.voting_trends.is_empty());
    assert_eq!(snapshot.total_clips, 2);
    assert_eq!(snapshot.total_battles, 1);
    assert_eq!(snapshot.active_categories, 1);
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let mut store = MemoryStore::default();
    for (id, name) in [("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")] {
        store.add_category(id, name, Some(now() + Duration::days(1)));
        store.add_clip(&format!("{id}1"), id);
        store.add_clip(&format!("{id}2"), id);
    }
    store.add_vote("b1", now() - Duration::hours(5));
    store.add_vote("c2", now() - Duration::days(2));

    let aggregator = AnalyticsAggregator::new(store, &utc_config()).unwrap();
    let first = aggregator.compute_at(now()).await;
    let second = aggregator.compute_at(now()).await;

    assert_eq!(first, second);
    let ids: Vec<_> = first
        .popular_categories
        .iter()
        .map(|s| s.category_id.as_str())
        .collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
}

#[tokio::test]
async fn test_out_of_range_window_is_refused_up_front() {
    let config = AnalyticsConfig {
        trend_window_days: 200_000_000,
        ..utc_config()
    };
    assert!(AnalyticsAggregator::new(MemoryStore::default(), &config).is_err());

    let longest = AnalyticsConfig {
        trend_window_days: MAX_TREND_WINDOW_DAYS,
        ..utc_config()
    };
    let mut store = MemoryStore::default();
    store.add_category("a", "A", Some(now() + Duration::days(1)));
    store.add_clip("c", "a");
    store.add_vote("c", now() - Duration::days(3000));
    store.add_vote("c", now());

    let snapshot = AnalyticsAggregator::new(store, &longest)
        .unwrap()
        .compute_at(now())
        .await;

    assert_eq!(snapshot.voting_trends.len(), 2);
}
