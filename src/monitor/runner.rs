//! Drives a [`Monitor`] on a fixed tick until it resolves or gives up.

use super::machine::{Action, Monitor, MonitorState, MovieObservation};
use super::registry::RegistryGuard;
use super::MonitorSettings;
use crate::arr::{FileStatus, MovieCatalog, SeriesCatalog};
use crate::plex::MediaServer;
use crate::tautulli::PlaybackSessions;
use anyhow::Result;
use placeholdarr_common::paths::PlaceholderNaming;
use placeholdarr_common::SeasonKey;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Fetches one observation per tick.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    type Observation: Send;

    async fn observe(&self) -> Result<Self::Observation>;
}

pub struct MovieProbe {
    pub catalog: Arc<dyn MovieCatalog>,
    pub movie_id: i64,
    pub naming: PlaceholderNaming,
}

#[async_trait::async_trait]
impl Probe for MovieProbe {
    type Observation = MovieObservation;

    async fn observe(&self) -> Result<MovieObservation> {
        let movie = self
            .catalog
            .movie(self.movie_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Movie {} no longer exists", self.movie_id))?;
        let downloading = self.catalog.is_downloading(self.movie_id).await?;

        Ok(MovieObservation {
            file: movie.file_status(&self.naming),
            downloading,
        })
    }
}

pub struct SeasonProbe {
    pub catalog: Arc<dyn SeriesCatalog>,
    pub season: SeasonKey,
    pub naming: PlaceholderNaming,
}

#[async_trait::async_trait]
impl Probe for SeasonProbe {
    type Observation = Vec<FileStatus>;

    async fn observe(&self) -> Result<Vec<FileStatus>> {
        let episodes = self
            .catalog
            .episodes(self.season.series_id, Some(self.season.season_number))
            .await?;

        Ok(episodes
            .iter()
            .filter(|e| e.season_number == self.season.season_number)
            .map(|e| e.file_status(&self.naming))
            .collect())
    }
}

/// Where a monitor reports to.
#[derive(Clone)]
pub struct MonitorOutput {
    pub media_server: Arc<dyn MediaServer>,
    pub sessions: Arc<dyn PlaybackSessions>,
    pub rating_key: String,
    /// The item's original description, kept below every status line
    pub base_description: String,
}

impl MonitorOutput {
    async fn write_status(&self, status: &str) {
        if let Err(e) = self
            .media_server
            .update_description(&self.rating_key, &self.base_description, status)
            .await
        {
            tracing::warn!(rating_key = %self.rating_key, "Failed to update description: {:#}", e);
        }
    }

    async fn terminate(&self, file: &str) {
        match self.sessions.terminate_by_file(file).await {
            Ok(true) => {}
            Ok(false) => tracing::info!(file, "Nothing to terminate, session already ended"),
            Err(e) => tracing::warn!(file, "Failed to terminate session: {:#}", e),
        }
    }
}

/// Poll until the monitor reaches a terminal state.
///
/// The first tick fires one interval after the call; a tick is fully handled
/// before the next one is awaited. The guard is held until this returns.
pub async fn drive<M, P>(
    mut monitor: M,
    probe: P,
    output: MonitorOutput,
    settings: MonitorSettings,
    guard: RegistryGuard,
) -> MonitorState
where
    M: Monitor,
    P: Probe<Observation = M::Observation>,
{
    let label = monitor.describe();
    tracing::info!(
        target_item = %label,
        key = guard.key(),
        max_attempts = settings.max_attempts,
        "Availability monitor started"
    );

    let mut ticker = interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let observation = match probe.observe().await {
            Ok(observation) => Some(observation),
            Err(e) => {
                tracing::warn!(target_item = %label, attempt = monitor.attempts() + 1, "Poll failed: {:#}", e);
                None
            }
        };

        match monitor.on_tick(observation) {
            Action::Wait => {}
            Action::ContinueWithStatus(status) => output.write_status(&status).await,
            Action::ResolveAndTerminate(file) => {
                tracing::info!(target_item = %label, attempts = monitor.attempts(), "Item is available");
                output.terminate(&file).await;
                break;
            }
            Action::GiveUp(message) => {
                tracing::info!(target_item = %label, attempts = monitor.attempts(), "Gave up waiting for item");
                if let Some(message) = message {
                    output.write_status(&message).await;
                }
                break;
            }
        }
    }

    drop(guard);
    monitor.state()
}

/// Run [`drive`] on its own task.
pub fn spawn<M, P>(
    monitor: M,
    probe: P,
    output: MonitorOutput,
    settings: MonitorSettings,
    guard: RegistryGuard,
) -> JoinHandle<MonitorState>
where
    M: Monitor + 'static,
    P: Probe<Observation = M::Observation> + 'static,
{
    tokio::spawn(drive(monitor, probe, output, settings, guard))
}
