//! Radarr and Sonarr: webhook payloads, API models, and REST clients.

pub mod client;
pub mod types;

pub use client::{MovieCatalog, RadarrClient, SeriesCatalog, SonarrClient};
pub use types::*;
