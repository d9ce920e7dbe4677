use placeholdarr_common::paths::PlaceholderNaming;
use placeholdarr_common::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Marker tag attached to movies mirrored into the secondary instance.
pub const MIRROR_TAG: &str = "infiniteplexlibrary";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub radarr: ArrConfig,

    /// Optional high-resolution Radarr instance that imported movies are
    /// mirrored into.
    #[serde(default)]
    pub radarr_4k: Option<SecondaryArrConfig>,

    #[serde(default)]
    pub sonarr: ArrConfig,

    #[serde(default)]
    pub plex: PlexConfig,

    #[serde(default)]
    pub tautulli: TautulliConfig,

    #[serde(default)]
    pub placeholder: PlaceholderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Connection settings for a Radarr or Sonarr instance.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArrConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    /// Only items carrying this tag get placeholders
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SecondaryArrConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    /// Root folder new movies are added under
    #[serde(default)]
    pub root_folder: String,

    #[serde(default)]
    pub quality_profile_id: Option<NumericSetting>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlexConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub movie_library_id: Option<NumericSetting>,

    #[serde(default)]
    pub tv_library_id: Option<NumericSetting>,

    /// Movie root as Plex sees it
    #[serde(default)]
    pub movie_folder: PathBuf,

    /// TV root as Plex sees it
    #[serde(default)]
    pub tv_folder: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TautulliConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    /// Message shown to the viewer when a stalled stream is terminated
    #[serde(default = "default_terminate_message")]
    pub terminate_message: String,
}

fn default_terminate_message() -> String {
    "This title is now available. Please restart playback.".to_string()
}

impl Default for TautulliConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            terminate_message: default_terminate_message(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlaceholderConfig {
    /// The small video file every placeholder is copied from
    #[serde(default)]
    pub source: PathBuf,

    /// Where movie placeholder copies are stored
    #[serde(default)]
    pub movie_root: PathBuf,

    /// Where season placeholder copies are stored
    #[serde(default)]
    pub tv_root: PathBuf,

    #[serde(flatten)]
    pub naming: PlaceholderNaming,
}

/// A numeric setting that may arrive as a TOML integer or, after `${VAR}`
/// expansion, as a string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NumericSetting {
    Number(i64),
    Text(String),
}

impl NumericSetting {
    /// The value as a positive integer, if it is one.
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Number(n) => u32::try_from(*n).ok().filter(|n| *n > 0),
            Self::Text(s) => s.trim().parse::<u32>().ok().filter(|n| *n > 0),
        }
    }
}

/// Everything a lifecycle handler needs to know about one media kind.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryTarget {
    pub kind: MediaKind,
    pub library_id: u32,
    pub tag: String,
    /// Where placeholder copies live
    pub placeholder_root: PathBuf,
    /// The library root as the media server sees it
    pub library_root: PathBuf,
}

impl Config {
    pub fn movie_target(&self) -> LibraryTarget {
        LibraryTarget {
            kind: MediaKind::Movie,
            library_id: self
                .plex
                .movie_library_id
                .as_ref()
                .and_then(NumericSetting::value)
                .unwrap_or_default(),
            tag: self.radarr.tag.clone(),
            placeholder_root: self.placeholder.movie_root.clone(),
            library_root: self.plex.movie_folder.clone(),
        }
    }

    pub fn tv_target(&self) -> LibraryTarget {
        LibraryTarget {
            kind: MediaKind::Show,
            library_id: self
                .plex
                .tv_library_id
                .as_ref()
                .and_then(NumericSetting::value)
                .unwrap_or_default(),
            tag: self.sonarr.tag.clone(),
            placeholder_root: self.placeholder.tv_root.clone(),
            library_root: self.plex.tv_folder.clone(),
        }
    }
}
