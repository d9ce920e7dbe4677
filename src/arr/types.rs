use crate::lenient;
use placeholdarr_common::paths::PlaceholderNaming;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Webhook payloads
// ---------------------------------------------------------------------------

/// Radarr webhook payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrWebhook {
    pub event_type: String,
    pub movie: Option<WebhookMovie>,
    pub movie_file: Option<WebhookFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMovie {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub year: Option<i64>,
    pub folder_path: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub imdb_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookFile {
    pub relative_path: Option<String>,
    pub path: Option<String>,
}

/// Sonarr webhook payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrWebhook {
    pub event_type: String,
    pub series: Option<WebhookSeries>,
    #[serde(default)]
    pub episodes: Vec<WebhookEpisode>,
    pub episode_file: Option<WebhookFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSeries {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    pub title: Option<String>,
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub tvdb_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEpisode {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    pub episode_number: i32,
    pub season_number: i32,
}

/// Tags arrive as labels from current *arr versions and as IDs from older ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagRef {
    Id(i64),
    Label(String),
}

impl TagRef {
    pub fn matches_label(&self, label: &str) -> bool {
        matches!(self, TagRef::Label(l) if l.eq_ignore_ascii_case(label))
    }

    pub fn as_id(&self) -> Option<i64> {
        match self {
            TagRef::Id(id) => Some(*id),
            TagRef::Label(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// API models
// ---------------------------------------------------------------------------

/// What is currently sitting where the catalog expects the media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Placeholder,
    Real,
    Absent,
}

impl FileStatus {
    fn classify(has_file: bool, relative_path: Option<&str>, naming: &PlaceholderNaming) -> Self {
        match relative_path {
            Some(path) if naming.is_placeholder(Path::new(path)) => FileStatus::Placeholder,
            _ if has_file => FileStatus::Real,
            _ => FileStatus::Absent,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, FileStatus::Real)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub movie_file: Option<MediaFile>,
}

impl Movie {
    pub fn file_status(&self, naming: &PlaceholderNaming) -> FileStatus {
        FileStatus::classify(
            self.has_file,
            self.movie_file
                .as_ref()
                .and_then(|f| f.relative_path.as_deref()),
            naming,
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub relative_path: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub tvdb_id: Option<i64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub seasons: Vec<SeasonInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonInfo {
    pub season_number: i32,
    #[serde(default)]
    pub monitored: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i32,
    pub episode_number: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub episode_file: Option<MediaFile>,
}

impl Episode {
    pub fn file_status(&self, naming: &PlaceholderNaming) -> FileStatus {
        FileStatus::classify(
            self.has_file,
            self.episode_file
                .as_ref()
                .and_then(|f| f.relative_path.as_deref()),
            naming,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDetail {
    pub id: i64,
    #[serde(default)]
    pub movie_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueuePage {
    #[serde(default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sizeleft: Option<f64>,
}

/// Body of `POST /movie`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub tmdb_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    pub root_folder_path: String,
    pub quality_profile_id: u32,
    pub monitored: bool,
    pub tags: Vec<i64>,
    pub add_options: AddOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOptions {
    pub search_for_movie: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radarr_webhook_with_string_ids() {
        let payload = serde_json::json!({
            "eventType": "Download",
            "movie": {
                "folderPath": "/data/Movie (2020)",
                "imdbId": "tt1",
                "tmdbId": "100",
                "title": "Movie",
                "year": 2020,
                "tags": ["ondemand"]
            }
        });

        let webhook: RadarrWebhook = serde_json::from_value(payload).unwrap();
        let movie = webhook.movie.unwrap();
        assert_eq!(webhook.event_type, "Download");
        assert_eq!(movie.tmdb_id, Some(100));
        assert_eq!(movie.imdb_id.as_deref(), Some("tt1"));
        assert!(movie.tags[0].matches_label("OnDemand"));
    }

    #[test]
    fn sonarr_webhook_parsing() {
        let payload = serde_json::json!({
            "eventType": "Download",
            "series": {
                "id": 7,
                "title": "Dark",
                "path": "/tv/Dark",
                "tags": [3]
            },
            "episodes": [{"id": 70, "episodeNumber": 2, "seasonNumber": 1}],
            "episodeFile": {"relativePath": "Season 1/Dark - s01e02.mkv"}
        });

        let webhook: SonarrWebhook = serde_json::from_value(payload).unwrap();
        let series = webhook.series.unwrap();
        assert_eq!(series.id, Some(7));
        assert_eq!(series.tags[0].as_id(), Some(3));
        assert_eq!(webhook.episodes[0].season_number, 1);
    }

    #[test]
    fn movie_file_status() {
        let naming = PlaceholderNaming::default();
        let mut movie: Movie = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Heat",
            "hasFile": true,
            "movieFile": {"relativePath": "dummy.mp4"}
        }))
        .unwrap();
        assert_eq!(movie.file_status(&naming), FileStatus::Placeholder);

        movie.movie_file = Some(MediaFile {
            id: Some(9),
            relative_path: Some("Heat (1995).mkv".into()),
            path: None,
        });
        assert_eq!(movie.file_status(&naming), FileStatus::Real);

        movie.has_file = false;
        movie.movie_file = None;
        assert_eq!(movie.file_status(&naming), FileStatus::Absent);
    }

    #[test]
    fn episode_file_status() {
        let naming = PlaceholderNaming::default();
        let episode: Episode = serde_json::from_value(serde_json::json!({
            "id": 1,
            "seriesId": 7,
            "seasonNumber": 1,
            "episodeNumber": 1,
            "hasFile": true,
            "episodeFile": {"relativePath": "Season 1/Dark - s01e01-e10 - dummy.mp4"}
        }))
        .unwrap();
        assert_eq!(episode.file_status(&naming), FileStatus::Placeholder);
    }
}
