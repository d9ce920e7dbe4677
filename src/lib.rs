//! Placeholdarr - on-demand media for Plex
//!
//! Placeholder files make titles that Radarr or Sonarr know about look
//! playable in Plex. Playing one triggers an acquisition request and an
//! availability monitor that ends the stalled session once the real file is
//! in. This library crate exposes the core functionality for integration
//! testing.

pub mod arr;
pub mod config;
pub mod lenient;
pub mod maintenance;
pub mod mirror;
pub mod monitor;
pub mod placeholder;
pub mod plex;
pub mod server;
pub mod tautulli;
