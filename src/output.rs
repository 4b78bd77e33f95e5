//! Output formatting and persistence for dashboard snapshots.
//!
//! Supports pretty-printing, JSON serialization, a plain-text dashboard and
//! CSV append of the headline numbers.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::models::DashboardSnapshot;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

const BAR_WIDTH: u64 = 40;

/// One CSV row per refresh.
#[derive(Debug, Serialize)]
pub struct HistoryRecord {
    pub generated_at: Option<DateTime<Utc>>,
    pub total_battles: u64,
    pub total_votes: u64,
    pub total_clips: u64,
    pub active_categories: u64,
    pub top_category: Option<String>,
    pub votes_last_week: u64,
}

impl From<&DashboardSnapshot> for HistoryRecord {
    fn from(snapshot: &DashboardSnapshot) -> Self {
        HistoryRecord {
            generated_at: snapshot.generated_at,
            total_battles: snapshot.total_battles,
            total_votes: snapshot.total_votes,
            total_clips: snapshot.total_clips,
            active_categories: snapshot.active_categories,
            top_category: snapshot
                .popular_categories
                .first()
                .map(|c| c.category_name.clone()),
            votes_last_week: snapshot.voting_trends.iter().map(|t| t.vote_count).sum(),
        }
    }
}

/// Logs a snapshot using Rust's debug pretty-print format.
pub fn print_pretty(snapshot: &DashboardSnapshot) {
    debug!("{:#?}", snapshot);
}

/// Logs a snapshot as pretty-printed JSON.
pub fn print_json(snapshot: &DashboardSnapshot) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

/// Renders the dashboard as plain text. Empty sections get an explicit
/// placeholder line instead of an empty table or chart.
pub fn render_text(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    if snapshot.loading {
        out.push_str("Loading analytics...\n");
        return out;
    }

    for (label, value) in [
        ("Total battles", snapshot.total_battles),
        ("Total votes", snapshot.total_votes),
        ("Total clips", snapshot.total_clips),
        ("Active categories", snapshot.active_categories),
    ] {
        out.push_str(&format!("{label:<18} {value:>10}\n"));
    }

    out.push_str("\nPopular categories\n");
    if snapshot.popular_categories.is_empty() {
        out.push_str("  No categories with clips yet\n");
    }
    for (rank, stats) in snapshot.popular_categories.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {:<24} {:>6} votes {:>5} clips\n",
            rank + 1,
            stats.category_name,
            stats.total_votes,
            stats.total_clips
        ));
    }

    out.push_str("\nVotes per day\n");
    if snapshot.voting_trends.is_empty() {
        out.push_str("  No recent voting data\n");
    }
    let peak = snapshot
        .voting_trends
        .iter()
        .map(|t| t.vote_count)
        .max()
        .unwrap_or(0);
    for trend in &snapshot.voting_trends {
        let bar = trend.vote_count.saturating_mul(BAR_WIDTH).div_ceil(peak.max(1));
        out.push_str(&format!(
            "  {} {:>6} {}\n",
            trend.date.format("%Y-%m-%d"),
            trend.vote_count,
            "#".repeat(bar as usize)
        ));
    }

    out
}

/// Appends the snapshot's [`HistoryRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, snapshot: &DashboardSnapshot) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(HistoryRecord::from(snapshot))?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryStats, VotingTrend};
    use chrono::NaiveDate;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn populated() -> DashboardSnapshot {
        DashboardSnapshot {
            generated_at: Some(Utc::now()),
            total_battles: 3,
            total_votes: 5,
            total_clips: 3,
            active_categories: 1,
            popular_categories: vec![CategoryStats {
                category_id: "a".to_string(),
                category_name: "Ambient".to_string(),
                total_clips: 3,
                total_votes: 5,
            }],
            voting_trends: vec![
                VotingTrend {
                    date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
                    vote_count: 1,
                },
                VotingTrend {
                    date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                    vote_count: 4,
                },
            ],
            loading: false,
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&DashboardSnapshot::default());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&populated()).unwrap();
    }

    #[test]
    fn test_render_empty_dashboard_shows_no_data() {
        let text = render_text(&DashboardSnapshot::default());

        assert!(text.contains("No categories with clips yet"));
        assert!(text.contains("No recent voting data"));
    }

    #[test]
    fn test_render_loading_state() {
        assert_eq!(render_text(&DashboardSnapshot::loading()), "Loading analytics...\n");
    }

    #[test]
    fn test_render_populated_dashboard() {
        let text = render_text(&populated());

        assert!(text.starts_with("Total battles               3\nTotal votes                 5\n"));
        assert!(text.contains("Active categories           1\n"));
        assert!(text.contains("1. Ambient"));
        assert!(text.contains("2026-10-16"));
        assert!(!text.contains("No voting data"));
        // the busiest day gets the full-width bar
        assert!(text.contains(&"#".repeat(BAR_WIDTH as usize)));
    }

    #[test]
    fn test_history_record_summarises_snapshot() {
        let record = HistoryRecord::from(&populated());

        assert_eq!(record.top_category.as_deref(), Some("Ambient"));
        assert_eq!(record.votes_last_week, 5);
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("battle_analytics_test_header.csv");
        let _ = fs::remove_file(&path);

        append_record(&path, &populated()).unwrap();
        append_record(&path, &DashboardSnapshot::default()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content
            .lines()
            .filter(|l| l.contains("generated_at"))
            .count();
        assert_eq!(header_count, 1);

        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }
}
