//! Mirror imported movies into the secondary (high-resolution) Radarr.
//!
//! Runs on its own task after a download import. Failures are logged here and
//! never reach the webhook response.

use crate::arr::{AddOptions, MovieCatalog, NewMovie};
use crate::config::{NumericSetting, SecondaryArrConfig, MIRROR_TAG};
use anyhow::{Context, Result};
use placeholdarr_common::paths::PlaceholderNaming;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorTarget {
    pub root_folder: String,
    pub quality_profile_id: u32,
    /// A secondary movie whose only file is the placeholder still needs a search
    pub naming: PlaceholderNaming,
}

impl MirrorTarget {
    pub fn from_config(config: &SecondaryArrConfig, naming: PlaceholderNaming) -> Option<Self> {
        let quality_profile_id = config
            .quality_profile_id
            .as_ref()
            .and_then(NumericSetting::value)?;

        Some(Self {
            root_folder: config.root_folder.clone(),
            quality_profile_id,
            naming,
        })
    }
}

/// The movie being mirrored, as described by the primary instance.
#[derive(Debug, Clone)]
pub struct MirrorRequest {
    pub tmdb_id: i64,
    pub title: Option<String>,
    pub year: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// Already present with a real file
    Present,
    /// Present without a real file; a search was started
    Searched,
    /// Added with search-on-add
    Added,
}

pub async fn mirror_movie(
    catalog: &dyn MovieCatalog,
    target: &MirrorTarget,
    request: &MirrorRequest,
) -> Result<MirrorOutcome> {
    if let Some(existing) = catalog
        .find_by_tmdb(request.tmdb_id)
        .await
        .context("Lookup in secondary instance failed")?
    {
        if existing.file_status(&target.naming).is_real() {
            return Ok(MirrorOutcome::Present);
        }
        catalog.search(existing.id).await?;
        return Ok(MirrorOutcome::Searched);
    }

    let tags = match catalog.tag_id(MIRROR_TAG).await? {
        Some(id) => vec![id],
        None => {
            tracing::warn!(tag = MIRROR_TAG, "Mirror tag not found in secondary instance");
            Vec::new()
        }
    };

    let movie = NewMovie {
        tmdb_id: request.tmdb_id,
        title: request.title.clone(),
        year: request.year,
        root_folder_path: target.root_folder.clone(),
        quality_profile_id: target.quality_profile_id,
        monitored: true,
        tags,
        add_options: AddOptions {
            search_for_movie: true,
        },
    };

    let added = catalog
        .add_movie(&movie)
        .await
        .context("Adding movie to secondary instance failed")?;
    tracing::debug!(movie_id = added.id, "Secondary instance assigned movie ID");

    Ok(MirrorOutcome::Added)
}

/// Fire-and-forget [`mirror_movie`].
pub fn spawn_mirror(
    catalog: Arc<dyn MovieCatalog>,
    target: MirrorTarget,
    request: MirrorRequest,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match mirror_movie(catalog.as_ref(), &target, &request).await {
            Ok(outcome) => tracing::info!(
                tmdb_id = request.tmdb_id,
                outcome = ?outcome,
                "Mirrored movie to secondary instance"
            ),
            Err(e) => tracing::error!(
                tmdb_id = request.tmdb_id,
                "Failed to mirror movie to secondary instance: {:#}",
                e
            ),
        }
    })
}
