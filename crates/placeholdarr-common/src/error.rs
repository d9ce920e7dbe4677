//! Common error type for placeholdarr.
//!
//! Upstream clients report failures through `anyhow`; everything that has to
//! reach an HTTP caller or abort startup is funnelled into [`Error`], which
//! knows its status code via [`Error::http_status`].

/// Unified error type covering the failure modes callers must distinguish.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more required configuration keys are missing.
    #[error("Config is missing the following keys: {}", .missing.join(", "))]
    MissingConfig {
        /// Dotted names of every missing key, in declaration order.
        missing: Vec<String>,
    },

    /// A configuration value is present but malformed.
    #[error("Invalid config value for {key}: {message}")]
    InvalidConfig {
        /// Dotted name of the offending key.
        key: String,
        /// Human-readable description.
        message: String,
    },

    /// A placeholder could not be provisioned on disk.
    #[error("Provisioning failed [{step}]: {source}")]
    Provision {
        /// The provisioning step that failed (mkdir, copy, symlink).
        step: &'static str,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::MissingConfig { .. } => 500,
            Error::InvalidConfig { .. } => 500,
            Error::Provision { .. } => 500,
            Error::Io(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::Provision`].
    pub fn provision(step: &'static str, source: std::io::Error) -> Self {
        Error::Provision { step, source }
    }

    /// Convenience constructor for [`Error::InvalidConfig`].
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
