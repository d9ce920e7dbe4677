//! Core type definitions shared between ingress and the monitors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of media reported by the playback monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A single movie.
    Movie,
    /// A whole TV show.
    Show,
    /// A season within a show.
    Season,
    /// A single episode.
    Episode,
}

impl MediaKind {
    /// Whether this kind is served by the series manager.
    pub fn is_episodic(&self) -> bool {
        matches!(self, Self::Show | Self::Season | Self::Episode)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Show => write!(f, "show"),
            Self::Season => write!(f, "season"),
            Self::Episode => write!(f, "episode"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "show" => Ok(Self::Show),
            "season" => Ok(Self::Season),
            "episode" => Ok(Self::Episode),
            _ => Err(format!("Invalid media type: {}", s)),
        }
    }
}

/// A season of a series, the unit the season monitor watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonKey {
    pub series_id: i64,
    pub season_number: i32,
}

impl SeasonKey {
    pub fn new(series_id: i64, season_number: i32) -> Self {
        Self {
            series_id,
            season_number,
        }
    }

    /// Season 0 holds specials, which are never monitored.
    pub fn is_specials(&self) -> bool {
        self.season_number == 0
    }
}

impl fmt::Display for SeasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "series {} season {}", self.series_id, self.season_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_parse() {
        assert_eq!("movie".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!("Episode".parse::<MediaKind>().unwrap(), MediaKind::Episode);
        assert!("track".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_media_kind_episodic() {
        assert!(!MediaKind::Movie.is_episodic());
        assert!(MediaKind::Show.is_episodic());
        assert!(MediaKind::Season.is_episodic());
        assert!(MediaKind::Episode.is_episodic());
    }

    #[test]
    fn test_media_kind_serialization() {
        let json = serde_json::to_string(&MediaKind::Season).unwrap();
        assert_eq!(json, r#""season""#);
        let kind: MediaKind = serde_json::from_str(r#""show""#).unwrap();
        assert_eq!(kind, MediaKind::Show);
    }

    #[test]
    fn test_season_key() {
        let key = SeasonKey::new(42, 0);
        assert!(key.is_specials());
        assert_eq!(SeasonKey::new(42, 3).to_string(), "series 42 season 3");
    }
}
