//! Radarr and Sonarr lifecycle webhooks: provision placeholders when a title
//! is added, retire them once the real file is imported.

use super::error::AppError;
use super::{ignored, AppContext};
use crate::arr::{RadarrWebhook, SonarrWebhook, TagRef, WebhookMovie, WebhookSeries};
use crate::config::LibraryTarget;
use crate::mirror::{spawn_mirror, MirrorRequest};
use axum::{body::Bytes, extract::State, Json};
use placeholdarr_common::paths::season_folder_name;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::{Path, PathBuf};

type HandlerResult = Result<Json<Value>, AppError>;

/// Whether an item carries `label`.
///
/// Current *arr versions send tag labels; older ones send IDs, which are
/// compared against the label's ID looked up on demand.
async fn carries_tag<F, Fut>(tags: &[TagRef], label: &str, resolve: F) -> bool
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<i64>>>,
{
    if tags.iter().any(|t| t.matches_label(label)) {
        return true;
    }
    if !tags.iter().any(|t| t.as_id().is_some()) {
        return false;
    }

    match resolve().await {
        Ok(Some(id)) => tags.iter().any(|t| t.as_id() == Some(id)),
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(tag = label, "Failed to resolve tag ID: {:#}", e);
            false
        }
    }
}

fn folder_name(path: &str) -> Option<String> {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Remove placeholders from library folders that now hold a real file, drop
/// the matching backing folders, then rescan `rescan_path` once.
async fn retire_placeholders(
    ctx: &AppContext,
    target: &LibraryTarget,
    relative_dirs: &[PathBuf],
    rescan_path: &Path,
) -> Result<usize, AppError> {
    let mut removed = 0;

    for relative in relative_dirs {
        let outcome = ctx.provisioner.cleanup(&target.library_root.join(relative))?;
        removed += outcome.removed;

        if outcome.has_real_file {
            ctx.provisioner
                .remove_backing_folder(&target.placeholder_root.join(relative))?;
        }
    }

    if let Err(e) = ctx
        .media_server
        .refresh_folder(rescan_path, target.library_id)
        .await
    {
        tracing::warn!(path = %rescan_path.display(), "Failed to trigger Plex rescan: {:#}", e);
    }

    Ok(removed)
}

// ---------------------------------------------------------------------------
// Radarr
// ---------------------------------------------------------------------------

pub async fn handle_radarr(State(ctx): State<AppContext>, body: Bytes) -> HandlerResult {
    let webhook: RadarrWebhook = match serde_json::from_slice(&body) {
        Ok(webhook) => webhook,
        Err(e) => {
            tracing::warn!("Unparseable Radarr webhook: {}", e);
            return Ok(ignored("unparseable payload"));
        }
    };

    tracing::info!(
        event = %webhook.event_type,
        title = webhook
            .movie
            .as_ref()
            .and_then(|m| m.title.as_deref())
            .unwrap_or("unknown"),
        "Received Radarr webhook"
    );

    let Some(movie) = webhook.movie else {
        return Ok(ignored(format!("{} without movie", webhook.event_type)));
    };

    match webhook.event_type.as_str() {
        "MovieAdded" => movie_added(ctx, movie).await,
        "Download" => movie_downloaded(ctx, movie).await,
        other => Ok(ignored(format!("event '{}' not handled", other))),
    }
}

async fn movie_added(ctx: AppContext, movie: WebhookMovie) -> HandlerResult {
    let target = ctx.config.movie_target();

    if !carries_tag(&movie.tags, &target.tag, || ctx.movies.tag_id(&target.tag)).await {
        return Ok(ignored(format!("movie not tagged '{}'", target.tag)));
    }

    let Some(folder) = movie.folder_path.as_deref().and_then(folder_name) else {
        return Ok(ignored("movie has no folder path"));
    };

    let asset = ctx.provisioner.provision_movie(&target, &folder)?;
    tracing::info!(
        title = movie.title.as_deref().unwrap_or("unknown"),
        link = %asset.link.display(),
        "Provisioned movie placeholder"
    );

    if let Err(e) = ctx
        .media_server
        .refresh_folder(asset.library_dir(), target.library_id)
        .await
    {
        tracing::warn!("Failed to trigger Plex rescan: {:#}", e);
    }

    Ok(Json(json!({
        "status": "provisioned",
        "placeholder": asset.link.to_string_lossy()
    })))
}

async fn movie_downloaded(ctx: AppContext, movie: WebhookMovie) -> HandlerResult {
    let target = ctx.config.movie_target();

    let Some(folder) = movie.folder_path.as_deref().and_then(folder_name) else {
        return Ok(ignored("movie has no folder path"));
    };

    let library_dir = target.library_root.join(&folder);
    let removed =
        retire_placeholders(&ctx, &target, &[PathBuf::from(&folder)], &library_dir).await?;

    if let (Some(mirror), Some(tmdb_id)) = (ctx.mirror.clone(), movie.tmdb_id) {
        spawn_mirror(
            mirror.catalog,
            mirror.target,
            MirrorRequest {
                tmdb_id,
                title: movie.title.clone(),
                year: movie.year,
            },
        );
    }

    Ok(Json(json!({
        "status": "imported",
        "placeholders_removed": removed
    })))
}

// ---------------------------------------------------------------------------
// Sonarr
// ---------------------------------------------------------------------------

pub async fn handle_sonarr(State(ctx): State<AppContext>, body: Bytes) -> HandlerResult {
    let webhook: SonarrWebhook = match serde_json::from_slice(&body) {
        Ok(webhook) => webhook,
        Err(e) => {
            tracing::warn!("Unparseable Sonarr webhook: {}", e);
            return Ok(ignored("unparseable payload"));
        }
    };

    tracing::info!(
        event = %webhook.event_type,
        title = webhook
            .series
            .as_ref()
            .and_then(|s| s.title.as_deref())
            .unwrap_or("unknown"),
        "Received Sonarr webhook"
    );

    let Some(series) = webhook.series else {
        return Ok(ignored(format!("{} without series", webhook.event_type)));
    };

    match webhook.event_type.as_str() {
        "SeriesAdd" => series_added(ctx, series).await,
        "Download" => {
            let seasons: BTreeSet<i32> = webhook.episodes.iter().map(|e| e.season_number).collect();
            episodes_downloaded(ctx, series, seasons).await
        }
        other => Ok(ignored(format!("event '{}' not handled", other))),
    }
}

async fn series_added(ctx: AppContext, series: WebhookSeries) -> HandlerResult {
    let target = ctx.config.tv_target();

    if !carries_tag(&series.tags, &target.tag, || ctx.series.tag_id(&target.tag)).await {
        return Ok(ignored(format!("series not tagged '{}'", target.tag)));
    }

    let (Some(series_id), Some(folder)) = (series.id, series.path.as_deref().and_then(folder_name))
    else {
        return Ok(ignored("series has no id or path"));
    };
    let title = series.title.clone().unwrap_or_else(|| folder.clone());

    let episodes = match ctx.series.episodes(series_id, None).await {
        Ok(episodes) => episodes,
        Err(e) => {
            tracing::warn!(series_id, "Failed to list episodes: {:#}", e);
            return Ok(ignored("sonarr episode listing failed"));
        }
    };

    let mut seasons: BTreeMap<i32, usize> = BTreeMap::new();
    for episode in episodes.iter().filter(|e| e.season_number != 0) {
        *seasons.entry(episode.season_number).or_default() += 1;
    }

    let mut provisioned = Vec::with_capacity(seasons.len());
    for (season_number, episode_count) in seasons {
        let asset =
            ctx.provisioner
                .provision_season(&target, &folder, &title, season_number, episode_count)?;
        tracing::info!(
            series = %title,
            season = season_number,
            episodes = episode_count,
            "Provisioned season placeholder"
        );
        provisioned.push(asset.link.to_string_lossy().into_owned());
    }

    if !provisioned.is_empty() {
        let series_dir = target.library_root.join(&folder);
        if let Err(e) = ctx
            .media_server
            .refresh_folder(&series_dir, target.library_id)
            .await
        {
            tracing::warn!("Failed to trigger Plex rescan: {:#}", e);
        }
    }

    Ok(Json(json!({
        "status": "provisioned",
        "placeholders": provisioned
    })))
}

async fn episodes_downloaded(
    ctx: AppContext,
    series: WebhookSeries,
    seasons: BTreeSet<i32>,
) -> HandlerResult {
    let target = ctx.config.tv_target();

    let Some(folder) = series.path.as_deref().and_then(folder_name) else {
        return Ok(ignored("series has no path"));
    };

    let season_dirs: Vec<PathBuf> = seasons
        .into_iter()
        .map(|n| Path::new(&folder).join(season_folder_name(n)))
        .collect();

    let series_dir = target.library_root.join(&folder);
    let removed = retire_placeholders(&ctx, &target, &season_dirs, &series_dir).await?;

    Ok(Json(json!({
        "status": "imported",
        "placeholders_removed": removed
    })))
}
