// src/services/directory.rs

//! Membership directory: which WCA ids belong to club members.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::DirectoryConfig;

/// Source of the set of known member ids.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// Every member id currently known. Queried once per run.
    async fn members(&self) -> Result<HashSet<String>>;
}

/// Fixed member list.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    members: HashSet<String>,
}

impl StaticDirectory {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl MembershipDirectory for StaticDirectory {
    async fn members(&self) -> Result<HashSet<String>> {
        Ok(self.members.clone())
    }
}

/// Member ids read from one column of a Supabase table over PostgREST.
pub struct SupabaseDirectory {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    column: String,
}

impl SupabaseDirectory {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl MembershipDirectory for SupabaseDirectory {
    async fn members(&self) -> Result<HashSet<String>> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[("select", self.column.as_str())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::directory(format!(
                "{} returned {}: {}",
                self.endpoint(),
                status,
                body
            )));
        }

        let rows: Vec<Value> = response.json().await?;
        let members: HashSet<String> = rows
            .iter()
            .filter_map(|row| row.get(&self.column).and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        log::info!("Membership directory: {} member ids", members.len());
        Ok(members)
    }
}

/// Pick the directory backend described by the configuration.
pub fn from_config(
    client: reqwest::Client,
    config: &DirectoryConfig,
) -> Box<dyn MembershipDirectory> {
    match (&config.supabase_url, &config.supabase_key) {
        (Some(url), Some(key)) => Box::new(SupabaseDirectory::new(
            client,
            url.clone(),
            key.clone(),
            config.table.clone(),
            config.column.clone(),
        )),
        _ => {
            log::warn!(
                "No Supabase project configured; using {} static member(s)",
                config.members.len()
            );
            Box::new(StaticDirectory::new(config.members.iter().cloned()))
        }
    }
}
