use super::types::{Activity, ApiEnvelope};
use super::PlaybackSessions;
use crate::config::TautulliConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TautulliClient {
    client: Client,
    base_url: String,
    api_key: String,
    message: String,
}

impl TautulliClient {
    pub fn new(config: &TautulliConfig) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config
                .url
                .trim_end_matches('/')
                .trim_end_matches("/api/v2")
                .to_string(),
            api_key: config.api_key.clone(),
            message: config.terminate_message.clone(),
        }
    }

    async fn call<T: DeserializeOwned + Default>(
        &self,
        cmd: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/api/v2", self.base_url))
            .query(&[("apikey", self.api_key.as_str()), ("cmd", cmd)])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to call Tautulli {}", cmd))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Tautulli {} failed ({}): {}", cmd, status, body);
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .with_context(|| format!("Invalid response from Tautulli {}", cmd))?;

        if envelope.response.result.as_deref() == Some("error") {
            anyhow::bail!(
                "Tautulli {} returned an error: {}",
                cmd,
                envelope.response.message.unwrap_or_default()
            );
        }

        Ok(envelope.response.data.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl PlaybackSessions for TautulliClient {
    async fn terminate_by_file(&self, file: &str) -> Result<bool> {
        let activity: Activity = self.call("get_activity", &[]).await?;

        let matching: Vec<_> = activity
            .sessions
            .into_iter()
            .filter(|s| s.file.as_deref() == Some(file))
            .collect();

        if matching.is_empty() {
            tracing::info!(file, "No active session found for file");
            return Ok(false);
        }

        for session in matching {
            let Some(session_id) = session.session_id else {
                continue;
            };

            // terminate_session answers with an empty data object
            let _: serde_json::Value = self
                .call(
                    "terminate_session",
                    &[("session_id", session_id.as_str()), ("message", self.message.as_str())],
                )
                .await?;

            tracing::info!(
                session_id = %session_id,
                user = session.user.as_deref().unwrap_or("unknown"),
                file,
                "Terminated playback session"
            );
        }

        Ok(true)
    }
}
