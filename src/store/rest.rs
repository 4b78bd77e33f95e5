use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{ACCEPT, CONTENT_RANGE, HeaderValue};
use reqwest::{Method, Request, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::DataStore;
use super::client::HttpClient;
use crate::models::{AudioClip, Category, Vote};

const CATEGORIES: &str = "categories";
const AUDIO_CLIPS: &str = "audio_clips";
const VOTES: &str = "votes";

/// Primary keys arrive as text (uuid) or as integers depending on the schema.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct CategoryRow {
    id: RawId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct EmbeddedCategory {
    name: Option<String>,
}

#[derive(Deserialize)]
struct ClipRow {
    id: RawId,
    category_id: Option<RawId>,
    #[serde(rename = "categories")]
    category: Option<EmbeddedCategory>,
}

#[derive(Deserialize)]
struct VoteRow {
    id: RawId,
    clip_id: RawId,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct CreatedAtRow {
    created_at: DateTime<Utc>,
}

/// [`DataStore`] backed by a PostgREST endpoint (`<base>/rest/v1/<table>`).
pub struct RestStore<C> {
    rest_url: Url,
    client: C,
}

impl<C: HttpClient> RestStore<C> {
    pub fn new(base_url: &str, client: C) -> Result<Self> {
        let mut base: Url = base_url
            .parse()
            .with_context(|| format!("invalid store URL '{base_url}'"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rest_url = base.join("rest/v1/")?;

        Ok(Self { rest_url, client })
    }

    fn table_url(&self, table: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.rest_url.join(table)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send(&self, req: Request) -> Result<Response> {
        let target = req.url().path().to_string();
        let response = self
            .client
            .execute(req)
            .await
            .with_context(|| format!("store request to {target} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("store returned status {status} for {target}: {body}"));
        }

        Ok(response)
    }

    async fn count(&self, table: &str, filters: &[(&str, &str)]) -> Result<u64> {
        let mut query = vec![("select", "id")];
        query.extend_from_slice(filters);

        let mut req = Request::new(Method::HEAD, self.table_url(table, &query)?);
        req.headers_mut()
            .insert("prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(req).await?;
        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .ok_or_else(|| anyhow!("count of {table} returned no Content-Range header"))?
            .to_str()
            .context("Content-Range header is not ASCII")?;

        let total = parse_content_range_total(range)
            .with_context(|| format!("count of {table} returned Content-Range '{range}'"))?;
        debug!(table, total, "Counted rows");
        Ok(total)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut req = Request::new(Method::GET, self.table_url(table, query)?);
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        let rows: Vec<T> = self
            .send(req)
            .await?
            .json()
            .await
            .with_context(|| format!("failed to decode {table} rows"))?;
        debug!(table, rows = rows.len(), "Listed rows");
        Ok(rows)
    }
}

/// Extracts the total from a `Content-Range` value such as `0-24/3573` or `*/0`.
pub fn parse_content_range_total(value: &str) -> Result<u64> {
    let (_, total) = value
        .rsplit_once('/')
        .ok_or_else(|| anyhow!("missing '/' separator"))?;
    total
        .trim()
        .parse()
        .map_err(|_| anyhow!("total '{total}' is not a number"))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl<C: HttpClient> DataStore for RestStore<C> {
    async fn count_votes(&self) -> Result<u64> {
        self.count(VOTES, &[]).await
    }

    async fn count_clips(&self) -> Result<u64> {
        self.count(AUDIO_CLIPS, &[]).await
    }

    async fn count_active_categories(&self, now: DateTime<Utc>) -> Result<u64> {
        let filter = format!("gt.{}", timestamp(now));
        self.count(CATEGORIES, &[("expires_at", filter.as_str())]).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = self
            .list(CATEGORIES, &[("select", "id,name,expires_at")])
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Category {
                id: row.id.into(),
                name: row.name.unwrap_or_default(),
                expires_at: row.expires_at,
            })
            .collect())
    }

    async fn list_clips(&self) -> Result<Vec<AudioClip>> {
        let rows: Vec<ClipRow> = self
            .list(AUDIO_CLIPS, &[("select", "id,category_id,categories(name)")])
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| AudioClip {
                id: row.id.into(),
                category_id: row.category_id.map(String::from),
                category_name: row.category.and_then(|c| c.name),
            })
            .collect())
    }

    async fn list_votes(&self) -> Result<Vec<Vote>> {
        let rows: Vec<VoteRow> = self
            .list(VOTES, &[("select", "id,clip_id,created_at")])
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Vote {
                id: row.id.into(),
                clip_id: row.clip_id.into(),
                created_at: row.created_at,
            })
            .collect())
    }

    async fn list_votes_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>> {
        let filter = format!("gte.{}", timestamp(since));
        let rows: Vec<CreatedAtRow> = self
            .list(
                VOTES,
                &[
                    ("select", "created_at"),
                    ("created_at", filter.as_str()),
                    ("order", "created_at.asc"),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(|row| row.created_at).collect())
    }
}
