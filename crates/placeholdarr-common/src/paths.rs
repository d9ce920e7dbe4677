//! Placeholder naming convention.
//!
//! Movies get a single fixed-name placeholder per folder. Seasons get one
//! multi-episode placeholder per season whose name ends with a fixed suffix,
//! so the media server indexes it as the whole episode range.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default file name of a movie placeholder.
pub const DEFAULT_FILE_NAME: &str = "dummy.mp4";

/// Default suffix marking a season placeholder.
pub const DEFAULT_EPISODE_SUFFIX: &str = " - dummy.mp4";

/// Characters that cannot appear in a file name on any supported platform.
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// How placeholder files are named on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderNaming {
    pub file_name: String,
    pub episode_suffix: String,
}

impl Default for PlaceholderNaming {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            episode_suffix: DEFAULT_EPISODE_SUFFIX.to_string(),
        }
    }
}

impl PlaceholderNaming {
    /// Check whether a path points at a placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use placeholdarr_common::paths::PlaceholderNaming;
    ///
    /// let naming = PlaceholderNaming::default();
    /// assert!(naming.is_placeholder(Path::new("dummy.mp4")));
    /// assert!(naming.is_placeholder(Path::new("/tv/Dark/Season 1/Dark - s01e01-e10 - dummy.mp4")));
    /// assert!(!naming.is_placeholder(Path::new("/tv/Dark/Season 1/Dark - s01e01.mkv")));
    /// ```
    pub fn is_placeholder(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.is_placeholder_name(name))
            .unwrap_or(false)
    }

    /// Same as [`is_placeholder`](Self::is_placeholder) for a bare file name.
    pub fn is_placeholder_name(&self, name: &str) -> bool {
        name == self.file_name
            || (!self.episode_suffix.is_empty() && name.ends_with(&self.episode_suffix))
    }

    /// File name of the placeholder covering a whole season.
    ///
    /// ```
    /// use placeholdarr_common::paths::PlaceholderNaming;
    ///
    /// let naming = PlaceholderNaming::default();
    /// assert_eq!(naming.season_file_name("Dark", 1, 10), "Dark - s01e01-e10 - dummy.mp4");
    /// assert_eq!(naming.season_file_name("Love/Hate", 2, 6), "Love-Hate - s02e01-e06 - dummy.mp4");
    /// ```
    pub fn season_file_name(&self, series_title: &str, season_number: i32, episodes: usize) -> String {
        format!(
            "{} - s{:02}e01-e{:02}{}",
            sanitize_file_component(series_title),
            season_number,
            episodes,
            self.episode_suffix
        )
    }
}

/// Make a title safe to embed in a single file name.
///
/// Reserved and control characters become `-`.
pub fn sanitize_file_component(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if RESERVED_CHARS.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();
    cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace()).to_string()
}

/// Folder name the managers use for a season.
pub fn season_folder_name(season_number: i32) -> String {
    format!("Season {}", season_number)
}
