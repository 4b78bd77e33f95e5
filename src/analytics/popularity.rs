//! Category popularity ranking.
//!
//! Votes reference clips, clips reference categories. The ranking joins the
//! two hops explicitly: one pass over the clips builds the per-category clip
//! tally together with a `clip -> category` lookup table, a second pass folds
//! the votes through that table. Clips or votes that do not resolve to a
//! named category are left out.

use anyhow::Result;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{AudioClip, CategoryStats, Vote};
use crate::store::DataStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClipTally<'a> {
    name: &'a str,
    clips: u64,
}

/// Result of the first join step.
#[derive(Debug, Default)]
pub struct ClipIndex<'a> {
    tallies: HashMap<&'a str, ClipTally<'a>>,
    category_of_clip: HashMap<&'a str, &'a str>,
    skipped: usize,
}

impl<'a> ClipIndex<'a> {
    /// Folds `clips` into per-category tallies and the clip lookup table.
    pub fn build(clips: &'a [AudioClip]) -> Self {
        clips.iter().fold(ClipIndex::default(), |mut index, clip| {
            let (Some(category_id), Some(name)) =
                (clip.category_id.as_deref(), clip.category_name.as_deref())
            else {
                index.skipped += 1;
                return index;
            };

            index
                .tallies
                .entry(category_id)
                .or_insert(ClipTally { name, clips: 0 })
                .clips += 1;
            index.category_of_clip.insert(clip.id.as_str(), category_id);
            index
        })
    }

    /// The category a clip belongs to, if it resolved.
    pub fn category_of(&self, clip_id: &str) -> Option<&'a str> {
        self.category_of_clip.get(clip_id).copied()
    }

    /// Clips that had no category id or no resolvable category name.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Second join step: vote totals keyed by category id. The second
    /// element is the number of votes whose clip did not resolve.
    pub fn votes_by_category(&self, votes: &[Vote]) -> (HashMap<&'a str, u64>, usize) {
        votes
            .iter()
            .fold((HashMap::new(), 0), |(mut counts, unresolved), vote| {
                match self.category_of(&vote.clip_id) {
                    Some(category_id) => {
                        *counts.entry(category_id).or_insert(0) += 1;
                        (counts, unresolved)
                    }
                    None => (counts, unresolved + 1),
                }
            })
    }
}

/// Ranks categories by votes received, most first, keeping at most `limit`.
///
/// Only categories that own at least one resolvable clip can appear. Ties on
/// the vote count are broken by category name, then id, both ascending.
pub fn rank_categories(clips: &[AudioClip], votes: &[Vote], limit: usize) -> Vec<CategoryStats> {
    let index = ClipIndex::build(clips);
    let (vote_counts, unresolved) = index.votes_by_category(votes);

    debug!(
        categories = index.tallies.len(),
        skipped_clips = index.skipped(),
        unresolved_votes = unresolved,
        "Joined votes to categories"
    );

    let mut ranked: Vec<CategoryStats> = index
        .tallies
        .iter()
        .map(|(&category_id, tally)| CategoryStats {
            category_id: category_id.to_string(),
            category_name: tally.name.to_string(),
            total_clips: tally.clips,
            total_votes: vote_counts.get(category_id).copied().unwrap_or(0),
        })
        .collect();

    ranked.sort_by(|a, b| {
        (Reverse(a.total_votes), &a.category_name, &a.category_id).cmp(&(
            Reverse(b.total_votes),
            &b.category_name,
            &b.category_id,
        ))
    });
    ranked.truncate(limit);
    ranked
}

/// Reads clips and votes and ranks the categories.
pub async fn fetch_popular_categories<S>(store: &S, limit: usize) -> Result<Vec<CategoryStats>>
where
    S: DataStore + ?Sized,
{
    let (clips, votes) = tokio::try_join!(store.list_clips(), store.list_votes())?;
    Ok(rank_categories(&clips, &votes, limit))
}
