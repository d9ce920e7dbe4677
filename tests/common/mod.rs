//! Shared test harness for integration tests.
//!
//! Provides in-memory stand-ins for every upstream service and
//! [`TestHarness`], which builds a full [`AppContext`] on top of them with
//! placeholder and library roots inside a temp dir.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tempfile::TempDir;
use tower::ServiceExt;

use placeholdarr::arr::{
    Episode, FileStatus, MediaFile, Movie, MovieCatalog, NewMovie, Series, SeriesCatalog,
};
use placeholdarr::config::{
    ArrConfig, Config, NumericSetting, PlaceholderConfig, PlexConfig, TautulliConfig,
};
use placeholdarr::mirror::MirrorTarget;
use placeholdarr::monitor::{InMemoryRegistry, MonitorSettings};
use placeholdarr::placeholder::Provisioner;
use placeholdarr::plex::MediaServer;
use placeholdarr::server::{create_router, AppContext, MirrorContext};
use placeholdarr::tautulli::PlaybackSessions;
use placeholdarr_common::SeasonKey;

pub const TAG: &str = "ondemand";
pub const MOVIE_LIBRARY_ID: u32 = 1;
pub const TV_LIBRARY_ID: u32 = 2;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn media_file(status: FileStatus, real_name: &str) -> Option<MediaFile> {
    let relative_path = match status {
        FileStatus::Placeholder => "dummy.mp4".to_string(),
        FileStatus::Real => real_name.to_string(),
        FileStatus::Absent => return None,
    };
    Some(MediaFile {
        id: Some(1),
        relative_path: Some(relative_path),
        path: None,
    })
}

/// A movie in `/movies/<title>` with the given file state
pub fn movie(id: i64, tmdb_id: i64, title: &str, status: FileStatus) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        year: None,
        tmdb_id: Some(tmdb_id),
        imdb_id: Some(format!("tt{:07}", tmdb_id)),
        overview: Some(format!("{} overview", title)),
        path: Some(format!("/movies/{}", title)),
        has_file: status != FileStatus::Absent,
        monitored: false,
        tags: Vec::new(),
        movie_file: media_file(status, &format!("{}.mkv", title)),
    }
}

pub fn series(id: i64, tvdb_id: i64, title: &str) -> Series {
    Series {
        id,
        title: title.to_string(),
        path: Some(format!("/tv/{}", title)),
        tvdb_id: Some(tvdb_id),
        overview: Some(format!("{} overview", title)),
        monitored: false,
        tags: Vec::new(),
        seasons: Vec::new(),
    }
}

pub fn episode(series_id: i64, season: i32, number: i32, status: FileStatus) -> Episode {
    let relative = match status {
        FileStatus::Placeholder => format!("Season {}/Show - s{:02}e01-e10 - dummy.mp4", season, season),
        _ => format!("Season {}/Show - s{:02}e{:02}.mkv", season, season, number),
    };
    Episode {
        id: series_id * 1000 + i64::from(season) * 100 + i64::from(number),
        series_id,
        season_number: season,
        episode_number: number,
        title: None,
        has_file: status != FileStatus::Absent,
        monitored: true,
        episode_file: (status != FileStatus::Absent).then(|| MediaFile {
            id: None,
            relative_path: Some(relative),
            path: None,
        }),
    }
}

// ---------------------------------------------------------------------------
// Movie catalog
// ---------------------------------------------------------------------------

/// Each movie has a script of states; every poll by ID advances it until the
/// last state, which then sticks.
#[derive(Default)]
pub struct MockMovies {
    scripts: Mutex<HashMap<i64, VecDeque<Movie>>>,
    pub downloading: Mutex<HashSet<i64>>,
    pub searches: Mutex<Vec<i64>>,
    pub added: Mutex<Vec<NewMovie>>,
    pub tags: Mutex<HashMap<String, i64>>,
    pub tagged: Mutex<Vec<i64>>,
    pub fail_polls: AtomicBool,
    pub polls: AtomicUsize,
}

impl MockMovies {
    pub fn with_movie(self, movie: Movie) -> Self {
        self.script(movie.id, vec![movie]);
        self
    }

    pub fn script(&self, movie_id: i64, states: Vec<Movie>) {
        self.scripts.lock().insert(movie_id, states.into());
    }

    fn current(&self, pred: impl Fn(&Movie) -> bool) -> Option<Movie> {
        self.scripts
            .lock()
            .values()
            .filter_map(|s| s.front())
            .find(|m| pred(m))
            .cloned()
    }
}

#[async_trait::async_trait]
impl MovieCatalog for MockMovies {
    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if self.fail_polls.load(Ordering::SeqCst) {
            anyhow::bail!("radarr unavailable");
        }

        let mut scripts = self.scripts.lock();
        let Some(script) = scripts.get_mut(&movie_id) else {
            return Ok(None);
        };
        let current = script.front().cloned();
        if script.len() > 1 {
            script.pop_front();
        }
        Ok(current)
    }

    async fn find_by_tmdb(&self, tmdb_id: i64) -> Result<Option<Movie>> {
        Ok(self.current(|m| m.tmdb_id == Some(tmdb_id)))
    }

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Option<Movie>> {
        Ok(self.current(|m| m.imdb_id.as_deref() == Some(imdb_id)))
    }

    async fn is_downloading(&self, movie_id: i64) -> Result<bool> {
        Ok(self.downloading.lock().contains(&movie_id))
    }

    async fn search(&self, movie_id: i64) -> Result<()> {
        self.searches.lock().push(movie_id);
        Ok(())
    }

    async fn tag_id(&self, label: &str) -> Result<Option<i64>> {
        Ok(self.tags.lock().get(label).copied())
    }

    async fn movie_ids_by_tag(&self, _tag_id: i64) -> Result<Vec<i64>> {
        Ok(self.tagged.lock().clone())
    }

    async fn add_movie(&self, movie: &NewMovie) -> Result<Movie> {
        self.added.lock().push(movie.clone());
        Ok(Movie {
            id: 900 + self.added.lock().len() as i64,
            title: movie.title.clone().unwrap_or_default(),
            year: None,
            tmdb_id: Some(movie.tmdb_id),
            imdb_id: None,
            overview: None,
            path: None,
            has_file: false,
            monitored: true,
            tags: movie.tags.clone(),
            movie_file: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Series catalog
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockSeries {
    pub series: Mutex<Vec<Series>>,
    /// Per series: scripted episode listings, advanced like [`MockMovies`]
    episodes: Mutex<HashMap<i64, VecDeque<Vec<Episode>>>>,
    pub monitored: Mutex<Vec<i64>>,
    pub season_searches: Mutex<Vec<SeasonKey>>,
    pub series_searches: Mutex<Vec<i64>>,
    pub tags: Mutex<HashMap<String, i64>>,
}

impl MockSeries {
    pub fn with_series(self, series: Series) -> Self {
        self.series.lock().push(series);
        self
    }

    pub fn script(&self, series_id: i64, listings: Vec<Vec<Episode>>) {
        self.episodes.lock().insert(series_id, listings.into());
    }
}

#[async_trait::async_trait]
impl SeriesCatalog for MockSeries {
    async fn find_by_tvdb(&self, tvdb_id: i64) -> Result<Option<Series>> {
        Ok(self
            .series
            .lock()
            .iter()
            .find(|s| s.tvdb_id == Some(tvdb_id))
            .cloned())
    }

    async fn episodes(&self, series_id: i64, season_number: Option<i32>) -> Result<Vec<Episode>> {
        let mut scripts = self.episodes.lock();
        let Some(script) = scripts.get_mut(&series_id) else {
            return Ok(Vec::new());
        };
        let current = script.front().cloned().unwrap_or_default();
        if script.len() > 1 {
            script.pop_front();
        }
        Ok(current
            .into_iter()
            .filter(|e| season_number.map_or(true, |n| e.season_number == n))
            .collect())
    }

    async fn monitor_series(&self, series_id: i64) -> Result<()> {
        self.monitored.lock().push(series_id);
        Ok(())
    }

    async fn search_season(&self, season: SeasonKey) -> Result<()> {
        self.season_searches.lock().push(season);
        Ok(())
    }

    async fn search_series(&self, series_id: i64) -> Result<()> {
        self.series_searches.lock().push(series_id);
        Ok(())
    }

    async fn tag_id(&self, label: &str) -> Result<Option<i64>> {
        Ok(self.tags.lock().get(label).copied())
    }
}

// ---------------------------------------------------------------------------
// Plex and Tautulli
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockMediaServer {
    /// (rating key, status line)
    pub descriptions: Mutex<Vec<(String, String)>>,
    pub refreshes: Mutex<Vec<(PathBuf, u32)>>,
}

impl MockMediaServer {
    pub fn statuses(&self) -> Vec<String> {
        self.descriptions.lock().iter().map(|(_, s)| s.clone()).collect()
    }
}

#[async_trait::async_trait]
impl MediaServer for MockMediaServer {
    async fn update_description(&self, rating_key: &str, _base: &str, status: &str) -> Result<()> {
        self.descriptions
            .lock()
            .push((rating_key.to_string(), status.to_string()));
        Ok(())
    }

    async fn refresh_folder(&self, path: &Path, library_id: u32) -> Result<()> {
        self.refreshes.lock().push((path.to_path_buf(), library_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockSessions {
    pub terminated: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl PlaybackSessions for MockSessions {
    async fn terminate_by_file(&self, file: &str) -> Result<bool> {
        self.terminated.lock().push(file.to_string());
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Config with every path inside `root`.
pub fn test_config(root: &Path) -> Config {
    let arr = |url: &str| ArrConfig {
        url: url.to_string(),
        api_key: "key".to_string(),
        tag: TAG.to_string(),
    };

    Config {
        radarr: arr("http://radarr:7878"),
        sonarr: arr("http://sonarr:8989"),
        plex: PlexConfig {
            url: "http://plex:32400".into(),
            token: "token".into(),
            movie_library_id: Some(NumericSetting::Number(i64::from(MOVIE_LIBRARY_ID))),
            tv_library_id: Some(NumericSetting::Number(i64::from(TV_LIBRARY_ID))),
            movie_folder: root.join("plex/movies"),
            tv_folder: root.join("plex/tv"),
        },
        tautulli: TautulliConfig {
            url: "http://tautulli:8181".into(),
            api_key: "key".into(),
            ..Default::default()
        },
        placeholder: PlaceholderConfig {
            source: root.join("source.mp4"),
            movie_root: root.join("placeholders/movies"),
            tv_root: root.join("placeholders/tv"),
            naming: Default::default(),
        },
        ..Default::default()
    }
}

pub struct TestHarness {
    pub tmp: TempDir,
    pub ctx: AppContext,
    pub movies: Arc<MockMovies>,
    pub series: Arc<MockSeries>,
    pub mirror: Arc<MockMovies>,
    pub media_server: Arc<MockMediaServer>,
    pub sessions: Arc<MockSessions>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_mocks(MockMovies::default(), MockSeries::default())
    }

    pub fn with_mocks(movies: MockMovies, series: MockSeries) -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        std::fs::write(tmp.path().join("source.mp4"), b"placeholder").unwrap();
        let config = test_config(tmp.path());

        let movies = Arc::new(movies);
        let series = Arc::new(series);
        let mirror = Arc::new(MockMovies::default());
        let media_server = Arc::new(MockMediaServer::default());
        let sessions = Arc::new(MockSessions::default());

        let ctx = AppContext {
            registry: Arc::new(InMemoryRegistry::new()),
            movies: movies.clone(),
            series: series.clone(),
            mirror: Some(MirrorContext {
                catalog: mirror.clone(),
                target: MirrorTarget {
                    root_folder: "/movies4k".into(),
                    quality_profile_id: 7,
                    naming: config.placeholder.naming.clone(),
                },
            }),
            media_server: media_server.clone(),
            sessions: sessions.clone(),
            provisioner: Arc::new(Provisioner::from_config(&config.placeholder)),
            monitor: MonitorSettings::default(),
            config: Arc::new(config),
        };

        Self {
            tmp,
            ctx,
            movies,
            series,
            mirror,
            media_server,
            sessions,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.tmp.path().join(relative)
    }

    /// POST a raw body through the router.
    pub async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(self.ctx.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    pub async fn post(&self, uri: &str, payload: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.post_raw(uri, payload.to_string()).await
    }
}
