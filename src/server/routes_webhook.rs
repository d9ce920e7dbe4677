//! Tautulli playback webhook: turns a placeholder playback into an
//! acquisition request plus an availability monitor.

use super::{ignored, AppContext};
use crate::arr::Movie;
use crate::monitor::{self, MovieMonitor, MovieProbe, SeasonMonitor, SeasonProbe};
use crate::tautulli::PlaybackWebhook;
use axum::{body::Bytes, extract::State, Json};
use placeholdarr_common::{MediaKind, SeasonKey};
use serde_json::{json, Value};
use std::path::Path;

pub const MOVIE_REQUESTED: &str =
    "The movie is being requested. Please wait a few moments while it becomes available.";
pub const SEASON_REQUESTED: &str =
    "The season is being requested. Please wait a few moments while it becomes available.";

pub async fn handle_playback(State(ctx): State<AppContext>, body: Bytes) -> Json<Value> {
    let webhook: PlaybackWebhook = match serde_json::from_slice(&body) {
        Ok(webhook) => webhook,
        Err(e) => {
            tracing::warn!("Unparseable playback webhook: {}", e);
            return ignored("unparseable payload");
        }
    };

    if !webhook.is_playback_start() {
        return ignored(format!(
            "event '{}' not handled",
            webhook.event.as_deref().unwrap_or("none")
        ));
    }

    let Some(kind) = webhook.media_kind() else {
        return ignored(format!(
            "media type '{}' not handled",
            webhook.media_type.as_deref().unwrap_or("none")
        ));
    };

    let Some(rating_key) = webhook.rating_key.clone() else {
        return ignored("missing rating_key");
    };

    tracing::info!(
        media_type = %kind,
        rating_key = %rating_key,
        file = webhook.file.as_deref().unwrap_or(""),
        "Playback started"
    );

    match kind {
        MediaKind::Movie => handle_movie(ctx, webhook, rating_key).await,
        _ => handle_episodic(ctx, webhook, rating_key).await,
    }
}

async fn lookup_movie(ctx: &AppContext, webhook: &PlaybackWebhook) -> Result<Option<Movie>, Json<Value>> {
    let result = if let Some(tmdb_id) = webhook.tmdb_id {
        ctx.movies.find_by_tmdb(tmdb_id).await
    } else if let Some(ref imdb_id) = webhook.imdb_id {
        ctx.movies.find_by_imdb(imdb_id).await
    } else {
        return Err(ignored("no tmdb_id or imdb_id"));
    };

    result.map_err(|e| {
        tracing::warn!("Radarr lookup failed: {:#}", e);
        ignored("radarr lookup failed")
    })
}

async fn handle_movie(ctx: AppContext, webhook: PlaybackWebhook, rating_key: String) -> Json<Value> {
    let movie = match lookup_movie(&ctx, &webhook).await {
        Ok(Some(movie)) => movie,
        Ok(None) => {
            tracing::info!(
                tmdb_id = ?webhook.tmdb_id,
                imdb_id = ?webhook.imdb_id,
                "Movie not found in Radarr"
            );
            return ignored("movie not found in radarr");
        }
        Err(response) => return response,
    };

    let naming = ctx.provisioner.naming().clone();
    if movie.file_status(&naming).is_real() {
        return Json(json!({
            "status": "available",
            "movie_id": movie.id
        }));
    }

    let Some(guard) = monitor::acquire(&ctx.registry, &rating_key) else {
        tracing::info!(rating_key = %rating_key, "Request already in progress");
        return Json(json!({
            "status": "in_progress",
            "rating_key": rating_key
        }));
    };

    let base = webhook
        .summary
        .clone()
        .or_else(|| movie.overview.clone())
        .unwrap_or_default();

    if let Err(e) = ctx
        .media_server
        .update_description(&rating_key, &base, MOVIE_REQUESTED)
        .await
    {
        tracing::warn!(rating_key = %rating_key, "Failed to update description: {:#}", e);
    }

    // Dropping the guard on this path frees the key for the next playback
    if let Err(e) = ctx.movies.search(movie.id).await {
        tracing::warn!(movie_id = movie.id, "Failed to request movie search: {:#}", e);
        return ignored("radarr search failed");
    }

    let file = webhook
        .file
        .clone()
        .unwrap_or_else(|| library_placeholder_path(&ctx, &movie));

    monitor::spawn(
        MovieMonitor::new(movie.id, file, ctx.monitor.max_attempts),
        MovieProbe {
            catalog: ctx.movies.clone(),
            movie_id: movie.id,
            naming,
        },
        output(&ctx, &rating_key, base),
        ctx.monitor,
        guard,
    );

    Json(json!({
        "status": "monitoring",
        "movie_id": movie.id,
        "rating_key": rating_key
    }))
}

/// Where the library symlink for a movie lives, for payloads without `file`
fn library_placeholder_path(ctx: &AppContext, movie: &Movie) -> String {
    let folder = movie
        .path
        .as_deref()
        .and_then(|p| Path::new(p).file_name())
        .unwrap_or_default();

    ctx.config
        .plex
        .movie_folder
        .join(folder)
        .join(&ctx.provisioner.naming().file_name)
        .to_string_lossy()
        .into_owned()
}

async fn handle_episodic(ctx: AppContext, webhook: PlaybackWebhook, rating_key: String) -> Json<Value> {
    let Some(file) = webhook
        .file
        .clone()
        .filter(|f| ctx.provisioner.naming().is_placeholder(Path::new(f)))
    else {
        return ignored("not a placeholder");
    };

    let Some(tvdb_id) = webhook.thetvdb_id else {
        return ignored("missing thetvdb_id");
    };

    let Some(season_number) = webhook.season_num.and_then(|n| i32::try_from(n).ok()) else {
        return ignored("missing season_num");
    };

    let series = match ctx.series.find_by_tvdb(tvdb_id).await {
        Ok(Some(series)) => series,
        Ok(None) => {
            tracing::info!(tvdb_id, "Series not found in Sonarr");
            return ignored("series not found in sonarr");
        }
        Err(e) => {
            tracing::warn!(tvdb_id, "Sonarr lookup failed: {:#}", e);
            return ignored("sonarr lookup failed");
        }
    };

    let season = SeasonKey::new(series.id, season_number);
    if season.is_specials() {
        return ignored("specials are not monitored");
    }

    let Some(guard) = monitor::acquire(&ctx.registry, &rating_key) else {
        tracing::info!(rating_key = %rating_key, "Request already in progress");
        return Json(json!({
            "status": "in_progress",
            "rating_key": rating_key
        }));
    };

    let base = webhook
        .summary
        .clone()
        .or_else(|| series.overview.clone())
        .unwrap_or_default();

    if let Err(e) = ctx
        .media_server
        .update_description(&rating_key, &base, SEASON_REQUESTED)
        .await
    {
        tracing::warn!(rating_key = %rating_key, "Failed to update description: {:#}", e);
    }

    if let Err(e) = ctx.series.monitor_series(series.id).await {
        tracing::warn!(series_id = series.id, "Failed to monitor series: {:#}", e);
    }

    if let Err(e) = ctx.series.search_season(season).await {
        tracing::warn!(season = %season, "Failed to request season search: {:#}", e);
        return ignored("sonarr season search failed");
    }

    monitor::spawn(
        SeasonMonitor::new(season, file, ctx.monitor.max_attempts),
        SeasonProbe {
            catalog: ctx.series.clone(),
            season,
            naming: ctx.provisioner.naming().clone(),
        },
        output(&ctx, &rating_key, base),
        ctx.monitor,
        guard,
    );

    // Remaining seasons are fetched in the background by Sonarr
    if let Err(e) = ctx.series.search_series(series.id).await {
        tracing::warn!(series_id = series.id, "Failed to request series search: {:#}", e);
    }

    Json(json!({
        "status": "monitoring",
        "series_id": series.id,
        "season": season_number,
        "rating_key": rating_key
    }))
}

fn output(ctx: &AppContext, rating_key: &str, base: String) -> monitor::MonitorOutput {
    monitor::MonitorOutput {
        media_server: ctx.media_server.clone(),
        sessions: ctx.sessions.clone(),
        rating_key: rating_key.to_string(),
        base_description: base,
    }
}
