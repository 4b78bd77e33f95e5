//! In-memory store shared by the integration tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use battle_analytics::analytics::counters::count_active_categories;
use battle_analytics::models::{AudioClip, Category, Vote};
use battle_analytics::store::DataStore;
use chrono::{DateTime, Utc};

#[derive(Default, Clone)]
pub struct MemoryStore {
    pub categories: Vec<Category>,
    pub clips: Vec<AudioClip>,
    pub votes: Vec<Vote>,
    /// When set, vote reads fail as if the table were unreachable.
    pub votes_unavailable: bool,
}

impl MemoryStore {
    pub fn add_category(&mut self, id: &str, name: &str, expires_at: Option<DateTime<Utc>>) {
        self.categories.push(Category {
            id: id.to_string(),
            name: name.to_string(),
            expires_at,
        });
    }

    /// Adds a clip, resolving its category name the way the store's embedded
    /// join would: no name when the category does not exist.
    pub fn add_clip(&mut self, id: &str, category_id: &str) {
        let category_name = self
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.clone());
        self.clips.push(AudioClip {
            id: id.to_string(),
            category_id: Some(category_id.to_string()),
            category_name,
        });
    }

    pub fn add_vote(&mut self, clip_id: &str, created_at: DateTime<Utc>) {
        let id = format!("v{}", self.votes.len());
        self.votes.push(Vote {
            id,
            clip_id: clip_id.to_string(),
            created_at,
        });
    }

    fn votes(&self) -> Result<&[Vote]> {
        if self.votes_unavailable {
            return Err(anyhow!("votes table unavailable"));
        }
        Ok(&self.votes)
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn count_votes(&self) -> Result<u64> {
        Ok(self.votes()?.len() as u64)
    }

    async fn count_clips(&self) -> Result<u64> {
        Ok(self.clips.len() as u64)
    }

    async fn count_active_categories(&self, now: DateTime<Utc>) -> Result<u64> {
        Ok(count_active_categories(&self.categories, now))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn list_clips(&self) -> Result<Vec<AudioClip>> {
        Ok(self.clips.clone())
    }

    async fn list_votes(&self) -> Result<Vec<Vote>> {
        Ok(self.votes()?.to_vec())
    }

    async fn list_votes_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>> {
        let mut stamps: Vec<_> = self
            .votes()?
            .iter()
            .map(|v| v.created_at)
            .filter(|at| *at >= since)
            .collect();
        stamps.sort();
        Ok(stamps)
    }
}
