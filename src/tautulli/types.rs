use crate::lenient;
use placeholdarr_common::MediaKind;
use serde::Deserialize;

pub const PLAYBACK_START: &str = "playback.start";

/// Body of the Tautulli notification agent webhook.
///
/// The agent's JSON template is user-defined, so every field is optional and
/// numeric fields are accepted as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaybackWebhook {
    #[serde(default)]
    pub event: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub media_type: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub rating_key: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub imdb_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub tmdb_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub thetvdb_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub season_num: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub file: Option<String>,

    /// The item's description as Plex currently shows it
    #[serde(default)]
    pub summary: Option<String>,
}

impl PlaybackWebhook {
    pub fn is_playback_start(&self) -> bool {
        self.event.as_deref() == Some(PLAYBACK_START)
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        self.media_type.as_deref().and_then(|t| t.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub response: ApiResponse<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Activity {
    #[serde(default)]
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_playback_with_text_ids() {
        let webhook: PlaybackWebhook = serde_json::from_value(serde_json::json!({
            "event": "playback.start",
            "media_type": "movie",
            "rating_key": "52311",
            "tmdb_id": "949",
            "imdb_id": "",
            "file": "/plex/movies/Heat (1995)/dummy.mp4"
        }))
        .unwrap();

        assert!(webhook.is_playback_start());
        assert_eq!(webhook.media_kind(), Some(MediaKind::Movie));
        assert_eq!(webhook.tmdb_id, Some(949));
        assert_eq!(webhook.imdb_id, None);
        assert_eq!(webhook.rating_key.as_deref(), Some("52311"));
    }

    #[test]
    fn episode_playback() {
        let webhook: PlaybackWebhook = serde_json::from_value(serde_json::json!({
            "event": "playback.start",
            "media_type": "episode",
            "rating_key": 880,
            "thetvdb_id": 121361,
            "season_num": "2"
        }))
        .unwrap();

        assert_eq!(webhook.media_kind(), Some(MediaKind::Episode));
        assert_eq!(webhook.thetvdb_id, Some(121361));
        assert_eq!(webhook.season_num, Some(2));
        assert_eq!(webhook.rating_key.as_deref(), Some("880"));
    }

    #[test]
    fn other_events_and_unknown_kinds() {
        let webhook: PlaybackWebhook = serde_json::from_value(serde_json::json!({
            "event": "playback.stop",
            "media_type": "track"
        }))
        .unwrap();

        assert!(!webhook.is_playback_start());
        assert_eq!(webhook.media_kind(), None);
    }
}
