//! Tautulli: playback webhooks in, session listing and termination out.

mod client;
mod types;

pub use client::TautulliClient;
pub use types::*;

use anyhow::Result;

#[async_trait::async_trait]
pub trait PlaybackSessions: Send + Sync {
    /// Terminate every active session playing `file`.
    ///
    /// Returns `false` when no session matched.
    async fn terminate_by_file(&self, file: &str) -> Result<bool>;
}
