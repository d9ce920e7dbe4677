use super::MediaServer;
use crate::config::PlexConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the summary shown in Plex: `[dd-mm-yyyy HH:MM]: status` on the
/// first line, the original description below it.
pub fn compose_description<Tz: TimeZone>(now: &DateTime<Tz>, status: &str, base: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("[{}]: {}\n{}", now.format("%d-%m-%Y %H:%M"), status, base)
}

pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
}

impl PlexClient {
    pub fn new(config: &PlexConfig) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }
}

#[async_trait::async_trait]
impl MediaServer for PlexClient {
    async fn update_description(&self, rating_key: &str, base: &str, status: &str) -> Result<()> {
        let summary = compose_description(&Local::now(), status, base);
        let url = format!("{}/library/metadata/{}", self.base_url, rating_key);

        let response = self
            .client
            .put(&url)
            .query(&[
                ("summary.value", summary.as_str()),
                ("X-Plex-Token", self.token.as_str()),
            ])
            .send()
            .await
            .context("Failed to update Plex description")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Plex description update failed ({}): {}", status, body);
        }

        tracing::debug!(rating_key, "Plex description updated");
        Ok(())
    }

    async fn refresh_folder(&self, path: &Path, library_id: u32) -> Result<()> {
        let url = format!(
            "{}/library/sections/{}/refresh",
            self.base_url, library_id
        );
        let path_display = path.to_string_lossy();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("X-Plex-Token", self.token.as_str()),
                ("path", path_display.as_ref()),
            ])
            .send()
            .await
            .context("Failed to request Plex rescan")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Plex rescan failed ({}): {}", status, body);
        }

        tracing::info!(library_id, path = %path_display, "Plex rescan triggered");
        Ok(())
    }
}
