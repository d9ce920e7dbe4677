use super::types::{Episode, Movie, NewMovie, QueuePage, Series, Tag, TagDetail};
use crate::config::{ArrConfig, SecondaryArrConfig};
use anyhow::{Context, Result};
use placeholdarr_common::SeasonKey;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Connection timeout for Arr API requests
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Movie catalog operations (Radarr)
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Fetch a movie by its internal ID
    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>>;

    async fn find_by_tmdb(&self, tmdb_id: i64) -> Result<Option<Movie>>;

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Option<Movie>>;

    /// Whether the movie currently sits in the download queue
    async fn is_downloading(&self, movie_id: i64) -> Result<bool>;

    /// Mark the movie monitored if needed and start a search for it
    async fn search(&self, movie_id: i64) -> Result<()>;

    async fn tag_id(&self, label: &str) -> Result<Option<i64>>;

    async fn movie_ids_by_tag(&self, tag_id: i64) -> Result<Vec<i64>>;

    async fn add_movie(&self, movie: &NewMovie) -> Result<Movie>;
}

/// Series catalog operations (Sonarr)
#[async_trait::async_trait]
pub trait SeriesCatalog: Send + Sync {
    async fn find_by_tvdb(&self, tvdb_id: i64) -> Result<Option<Series>>;

    /// Episodes of a series, optionally restricted to one season
    async fn episodes(&self, series_id: i64, season_number: Option<i32>) -> Result<Vec<Episode>>;

    /// Mark the series and every season except specials monitored
    async fn monitor_series(&self, series_id: i64) -> Result<()>;

    async fn search_season(&self, season: SeasonKey) -> Result<()>;

    async fn search_series(&self, series_id: i64) -> Result<()>;

    async fn tag_id(&self, label: &str) -> Result<Option<i64>>;
}

struct BaseArrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BaseArrClient {
    fn new(url: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: url
                .trim_end_matches('/')
                .trim_end_matches("/api/v3")
                .to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v3{}", self.base_url, path)
    }

    async fn check(response: Response, context_msg: &str) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            anyhow::bail!("{} ({}): {}", context_msg, status, error);
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context(format!("Failed to GET {}", path))?;

        Self::check(response, &format!("GET {} failed", path))
            .await?
            .json()
            .await
            .context(format!("Invalid response from GET {}", path))
    }

    /// GET that maps 404 to `None`
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let response = self
            .client
            .get(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context(format!("Failed to GET {}", path))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let value = Self::check(response, &format!("GET {} failed", path))
            .await?
            .json()
            .await
            .context(format!("Invalid response from GET {}", path))?;
        Ok(Some(value))
    }

    async fn put<T: Serialize>(&self, path: &str, body: &T) -> Result<()> {
        let response = self
            .client
            .put(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .context(format!("Failed to PUT {}", path))?;

        Self::check(response, &format!("PUT {} failed", path)).await?;
        Ok(())
    }

    async fn post<T: Serialize, R: DeserializeOwned>(&self, path: &str, body: &T) -> Result<R> {
        let response = self
            .client
            .post(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .context(format!("Failed to POST {}", path))?;

        Self::check(response, &format!("POST {} failed", path))
            .await?
            .json()
            .await
            .context(format!("Invalid response from POST {}", path))
    }

    async fn post_command<T: Serialize>(&self, command: &T, context_msg: &str) -> Result<()> {
        let context_msg = context_msg.to_string();
        let response = self
            .client
            .post(self.url("/command"))
            .header("X-Api-Key", &self.api_key)
            .json(command)
            .send()
            .await
            .context(context_msg.clone())?;

        Self::check(response, &context_msg).await?;
        Ok(())
    }

    async fn tag_id(&self, label: &str) -> Result<Option<i64>> {
        let tags: Vec<Tag> = self.get("/tag").await?;
        Ok(tags
            .into_iter()
            .find(|t| t.label.eq_ignore_ascii_case(label))
            .map(|t| t.id))
    }
}

fn set_monitored(resource: &mut serde_json::Value, monitored: bool) -> Result<()> {
    let object = resource
        .as_object_mut()
        .context("Unexpected resource shape, expected a JSON object")?;
    object.insert("monitored".to_string(), serde_json::Value::Bool(monitored));
    Ok(())
}

pub struct RadarrClient(BaseArrClient);

impl RadarrClient {
    pub fn new(config: &ArrConfig) -> Self {
        Self(BaseArrClient::new(&config.url, &config.api_key))
    }

    pub fn secondary(config: &SecondaryArrConfig) -> Self {
        Self(BaseArrClient::new(&config.url, &config.api_key))
    }
}

#[async_trait::async_trait]
impl MovieCatalog for RadarrClient {
    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>> {
        self.0.get_optional(&format!("/movie/{}", movie_id)).await
    }

    async fn find_by_tmdb(&self, tmdb_id: i64) -> Result<Option<Movie>> {
        let movies: Vec<Movie> = self.0.get(&format!("/movie?tmdbId={}", tmdb_id)).await?;
        Ok(movies.into_iter().next())
    }

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Option<Movie>> {
        // Radarr has no server-side IMDb filter
        let movies: Vec<Movie> = self.0.get("/movie").await?;
        Ok(movies
            .into_iter()
            .find(|m| m.imdb_id.as_deref() == Some(imdb_id)))
    }

    async fn is_downloading(&self, movie_id: i64) -> Result<bool> {
        let queue: QueuePage = self.0.get("/queue?pageSize=1000").await?;

        match queue.records.iter().find(|r| r.movie_id == Some(movie_id)) {
            Some(record) => {
                tracing::debug!(
                    movie_id,
                    title = record.title.as_deref().unwrap_or("unknown"),
                    size_left = record.sizeleft.unwrap_or_default(),
                    "Movie is in the download queue"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search(&self, movie_id: i64) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SearchCommand {
            name: &'static str,
            movie_ids: Vec<i64>,
        }

        // Round-trip the raw resource so fields we don't model survive the PUT
        let mut movie: serde_json::Value = self.0.get(&format!("/movie/{}", movie_id)).await?;
        if movie.get("monitored").and_then(|v| v.as_bool()) != Some(true) {
            set_monitored(&mut movie, true)?;
            self.0.put(&format!("/movie/{}", movie_id), &movie).await?;
            tracing::info!(movie_id, "Movie is now monitored");
        }

        let command = SearchCommand {
            name: "MoviesSearch",
            movie_ids: vec![movie_id],
        };

        self.0
            .post_command(&command, "Failed to trigger Radarr movie search")
            .await
    }

    async fn tag_id(&self, label: &str) -> Result<Option<i64>> {
        self.0.tag_id(label).await
    }

    async fn movie_ids_by_tag(&self, tag_id: i64) -> Result<Vec<i64>> {
        let detail: Option<TagDetail> = self
            .0
            .get_optional(&format!("/tag/detail/{}", tag_id))
            .await?;
        Ok(detail.map(|d| d.movie_ids).unwrap_or_default())
    }

    async fn add_movie(&self, movie: &NewMovie) -> Result<Movie> {
        self.0.post("/movie", movie).await
    }
}

pub struct SonarrClient(BaseArrClient);

impl SonarrClient {
    pub fn new(config: &ArrConfig) -> Self {
        Self(BaseArrClient::new(&config.url, &config.api_key))
    }
}

#[async_trait::async_trait]
impl SeriesCatalog for SonarrClient {
    async fn find_by_tvdb(&self, tvdb_id: i64) -> Result<Option<Series>> {
        let series: Vec<Series> = self.0.get(&format!("/series?tvdbId={}", tvdb_id)).await?;
        // Older Sonarr versions ignore the filter and return everything
        Ok(series.into_iter().find(|s| s.tvdb_id == Some(tvdb_id)))
    }

    async fn episodes(&self, series_id: i64, season_number: Option<i32>) -> Result<Vec<Episode>> {
        let path = match season_number {
            Some(season) => format!(
                "/episode?seriesId={}&seasonNumber={}&includeEpisodeFile=true",
                series_id, season
            ),
            None => format!("/episode?seriesId={}&includeEpisodeFile=true", series_id),
        };
        self.0.get(&path).await
    }

    async fn monitor_series(&self, series_id: i64) -> Result<()> {
        let path = format!("/series/{}", series_id);
        let mut series: serde_json::Value = self.0.get(&path).await?;

        set_monitored(&mut series, true)?;
        if let Some(seasons) = series.get_mut("seasons").and_then(|s| s.as_array_mut()) {
            // Specials keep whatever the user chose
            for season in seasons {
                let number = season.get("seasonNumber").and_then(|n| n.as_i64());
                if number.is_some_and(|n| n != 0) {
                    set_monitored(season, true)?;
                }
            }
        }

        self.0.put(&path, &series).await?;
        tracing::info!(series_id, "Series and its seasons are now monitored");
        Ok(())
    }

    async fn search_season(&self, season: SeasonKey) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SeasonSearchCommand {
            name: &'static str,
            series_id: i64,
            season_number: i32,
        }

        let command = SeasonSearchCommand {
            name: "SeasonSearch",
            series_id: season.series_id,
            season_number: season.season_number,
        };

        self.0
            .post_command(&command, "Failed to trigger Sonarr season search")
            .await
    }

    async fn search_series(&self, series_id: i64) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SeriesSearchCommand {
            name: &'static str,
            series_id: i64,
        }

        let command = SeriesSearchCommand {
            name: "SeriesSearch",
            series_id,
        };

        self.0
            .post_command(&command, "Failed to trigger Sonarr series search")
            .await
    }

    async fn tag_id(&self, label: &str) -> Result<Option<i64>> {
        self.0.tag_id(label).await
    }
}
