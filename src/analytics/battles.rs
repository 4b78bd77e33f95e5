//! Potential head-to-head matchups: every unordered pair of distinct clips
//! within one category is one battle.

use anyhow::Result;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{AudioClip, Category};
use crate::store::DataStore;

/// Unordered pairs among `n` clips, `n·(n−1)/2`. Zero for `n <= 1`.
pub fn battle_pairs(n: u64) -> u64 {
    if n < 2 {
        return 0;
    }
    let pairs = u128::from(n) * u128::from(n - 1) / 2;
    u64::try_from(pairs).unwrap_or(u64::MAX)
}

/// Sums [`battle_pairs`] over per-category clip counts.
pub fn total_battles<I>(clip_counts: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    clip_counts
        .into_iter()
        .map(battle_pairs)
        .fold(0, u64::saturating_add)
}

/// Number of clips owned by each category id.
pub fn clips_per_category(clips: &[AudioClip]) -> HashMap<&str, u64> {
    clips
        .iter()
        .filter_map(|clip| clip.category_id.as_deref())
        .fold(HashMap::new(), |mut counts, category_id| {
            *counts.entry(category_id).or_insert(0) += 1;
            counts
        })
}

/// Battle estimate across every listed category, expired ones included.
/// Clips pointing at a category that is not listed contribute nothing.
pub fn estimate_battles(categories: &[Category], clips: &[AudioClip]) -> u64 {
    let counts = clips_per_category(clips);
    total_battles(
        categories
            .iter()
            .map(|category| counts.get(category.id.as_str()).copied().unwrap_or(0)),
    )
}

/// Reads categories and clips and recomputes the estimate from scratch.
pub async fn fetch_total_battles<S>(store: &S) -> Result<u64>
where
    S: DataStore + ?Sized,
{
    let (categories, clips) = tokio::try_join!(store.list_categories(), store.list_clips())?;
    let total = estimate_battles(&categories, &clips);
    debug!(
        categories = categories.len(),
        clips = clips.len(),
        total,
        "Estimated battles"
    );
    Ok(total)
}
