//! Plex: per-item description updates and path-scoped library rescans.

mod client;

pub use client::{compose_description, PlexClient};

use anyhow::Result;
use std::path::Path;

/// Operations the service needs from the media server.
#[async_trait::async_trait]
pub trait MediaServer: Send + Sync {
    /// Replace an item's summary with a timestamped status line followed by
    /// the item's original description.
    async fn update_description(&self, rating_key: &str, base: &str, status: &str) -> Result<()>;

    /// Rescan one folder of a library section.
    async fn refresh_folder(&self, path: &Path, library_id: u32) -> Result<()>;
}
