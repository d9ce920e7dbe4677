//! Placeholdarr-Common: shared types, placeholder naming, and errors.
//!
//! - **Types**: media kinds reported by the playback monitor and season keys
//! - **Paths**: the placeholder naming convention shared by ingress,
//!   provisioning and the availability monitors
//! - **Error Handling**: the common error type and its HTTP status mapping
//!
//! # Examples
//!
//! ```
//! use placeholdarr_common::paths::PlaceholderNaming;
//! use placeholdarr_common::MediaKind;
//! use std::path::Path;
//!
//! let naming = PlaceholderNaming::default();
//! assert!(naming.is_placeholder(Path::new("/movies/Heat (1995)/dummy.mp4")));
//!
//! let kind: MediaKind = "episode".parse().unwrap();
//! assert!(kind.is_episodic());
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
