//! Read access to the relational store holding categories, clips and votes.
//!
//! [`DataStore`] is the seam the aggregator reads through. [`RestStore`]
//! implements it against a PostgREST-style HTTP query API, with transport
//! and authentication layered as [`HttpClient`] wrappers.

mod auth;
mod basic;
mod client;
mod rest;

pub use auth::ApiKey;
pub use basic::BasicClient;
pub use client::HttpClient;
pub use rest::{RestStore, parse_content_range_total};

use crate::models::{AudioClip, Category, Vote};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// The read operations the analytics need. Every listing may legitimately be
/// empty and every count may be zero.
#[async_trait::async_trait]
pub trait DataStore: Send + Sync {
    async fn count_votes(&self) -> Result<u64>;

    async fn count_clips(&self) -> Result<u64>;

    /// Categories whose expiration instant is strictly after `now`.
    async fn count_active_categories(&self, now: DateTime<Utc>) -> Result<u64>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// All clips, each with its category name resolved where possible.
    async fn list_clips(&self) -> Result<Vec<AudioClip>>;

    async fn list_votes(&self) -> Result<Vec<Vote>>;

    /// Creation instants of votes cast at or after `since`, ascending.
    async fn list_votes_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>>;
}
