// src/services/competitions.rs

//! Competition registry client.
//!
//! Walks the paged competition index and fetches per-competition WCIF
//! details, both through [`ResilientFetcher`].

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::ApiConfig;
use crate::services::fetcher::{FetchFailure, ResilientFetcher};

/// Minimal listing entry; the index returns much more.
#[derive(Debug, Deserialize)]
struct IndexEntry {
    id: String,
}

/// Client for the registry's listing and detail endpoints.
#[derive(Debug, Clone)]
pub struct CompetitionApi {
    fetcher: ResilientFetcher,
    base_url: String,
}

impl CompetitionApi {
    pub fn new(fetcher: ResilientFetcher, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Ok(Self::new(
            ResilientFetcher::from_config(config)?,
            config.base_url.clone(),
        ))
    }

    /// URL of one index page: non-cancelled competitions that are ongoing or
    /// upcoming on `today`, sorted by start date then name.
    pub fn index_url(&self, today: NaiveDate, page: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/competition_index", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("include_cancelled", "false")
            .append_pair("sort", "start_date,end_date,name")
            .append_pair("ongoing_and_future", &today.format("%Y-%m-%d").to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    pub fn detail_url(&self, id: &str) -> String {
        format!("{}/competitions/{}/wcif/public", self.base_url, id)
    }

    /// Collect the ids of every active competition, in listing order.
    ///
    /// The crawl ends at the first empty page. A page that cannot be fetched
    /// or decoded aborts the crawl with [`AppError::ListingUnavailable`]
    /// instead of being mistaken for the end of the listing.
    pub async fn list_active_ids(&self, today: NaiveDate) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 1u32;

        loop {
            let url = self.index_url(today, page)?;
            let value = self
                .fetcher
                .fetch_json(url.as_str())
                .await
                .map_err(|failure| AppError::listing(page, failure))?;

            let entries: Vec<IndexEntry> =
                serde_json::from_value(value).map_err(|e| AppError::listing(page, e))?;

            if entries.is_empty() {
                log::info!(
                    "Competition index exhausted after {} page(s): {} ids",
                    page - 1,
                    ids.len()
                );
                return Ok(ids);
            }

            let before = ids.len();
            for entry in entries {
                if seen.insert(entry.id.clone()) {
                    ids.push(entry.id);
                }
            }
            log::debug!("Index page {}: {} new ids", page, ids.len() - before);

            page += 1;
        }
    }

    /// Fetch the raw public WCIF of one competition.
    pub async fn fetch_detail(&self, id: &str) -> std::result::Result<Value, FetchFailure> {
        self.fetcher.fetch_json(&self.detail_url(id)).await
    }
}
