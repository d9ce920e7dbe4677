mod types;

pub use types::*;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use placeholdarr_common::Error;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};

static ENV_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env reference regex should compile")
});

const DEFAULT_PATHS: [&str; 4] = [
    "./config.toml",
    "./placeholdarr.toml",
    "~/.config/placeholdarr/config.toml",
    "/etc/placeholdarr/config.toml",
];

/// Load configuration from a TOML file
///
/// `${VAR}` references are expanded from the environment before parsing.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);

    validate_config(&config)?;

    Ok(config)
}

/// Load config from the given path or the first default location that exists
pub fn load_config_from(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match locate_config() {
        Some(path) => {
            tracing::info!("Using config file {:?}", path);
            load_config(&path)
        }
        None => anyhow::bail!(
            "No config file found (looked in {})",
            DEFAULT_PATHS.join(", ")
        ),
    }
}

fn locate_config() -> Option<PathBuf> {
    DEFAULT_PATHS
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
        .find(|p| p.exists())
}

/// Parse TOML content after environment expansion, without validating
pub fn parse_config(content: &str) -> Result<Config> {
    let expanded = expand_env(content);
    let config: Config = toml::from_str(&expanded)?;
    Ok(config)
}

/// Replace `${VAR}` references with the variable's value.
///
/// Any other `$` is literal. Unset variables expand to nothing, so the key
/// they fed shows up in [`validate_config`]'s missing list.
fn expand_env(content: &str) -> String {
    let mut unset = Vec::new();
    let expanded = ENV_REFERENCE.replace_all(content, |caps: &Captures| {
        match std::env::var(&caps[1]) {
            // Values land inside TOML basic strings
            Ok(value) => value.replace('\\', "\\\\").replace('"', "\\\""),
            Err(_) => {
                unset.push(caps[1].to_string());
                String::new()
            }
        }
    });
    let expanded = expanded.into_owned();

    if !unset.is_empty() {
        tracing::warn!(variables = ?unset, "Config references unset environment variables");
    }
    expanded
}

fn expand_paths(config: &mut Config) {
    let expand = |p: &mut PathBuf| {
        if let Some(s) = p.to_str() {
            *p = PathBuf::from(shellexpand::tilde(s).as_ref());
        }
    };

    expand(&mut config.placeholder.source);
    expand(&mut config.placeholder.movie_root);
    expand(&mut config.placeholder.tv_root);
    expand(&mut config.plex.movie_folder);
    expand(&mut config.plex.tv_folder);
}

/// Validate configuration
///
/// Every missing key is collected so a single error names all of them.
pub fn validate_config(config: &Config) -> placeholdarr_common::Result<()> {
    let mut missing = Vec::new();

    let mut require = |key: &str, present: bool| {
        if !present {
            missing.push(key.to_string());
        }
    };

    require("radarr.url", !config.radarr.url.is_empty());
    require("radarr.api_key", !config.radarr.api_key.is_empty());
    require("radarr.tag", !config.radarr.tag.is_empty());

    require("sonarr.url", !config.sonarr.url.is_empty());
    require("sonarr.api_key", !config.sonarr.api_key.is_empty());
    require("sonarr.tag", !config.sonarr.tag.is_empty());

    require("plex.url", !config.plex.url.is_empty());
    require("plex.token", !config.plex.token.is_empty());
    require("plex.movie_library_id", config.plex.movie_library_id.is_some());
    require("plex.tv_library_id", config.plex.tv_library_id.is_some());
    require("plex.movie_folder", !is_empty_path(&config.plex.movie_folder));
    require("plex.tv_folder", !is_empty_path(&config.plex.tv_folder));

    require("tautulli.url", !config.tautulli.url.is_empty());
    require("tautulli.api_key", !config.tautulli.api_key.is_empty());

    require("placeholder.source", !is_empty_path(&config.placeholder.source));
    require("placeholder.movie_root", !is_empty_path(&config.placeholder.movie_root));
    require("placeholder.tv_root", !is_empty_path(&config.placeholder.tv_root));

    if let Some(ref secondary) = config.radarr_4k {
        require("radarr_4k.url", !secondary.url.is_empty());
        require("radarr_4k.api_key", !secondary.api_key.is_empty());
        require("radarr_4k.root_folder", !secondary.root_folder.is_empty());
        require(
            "radarr_4k.quality_profile_id",
            secondary.quality_profile_id.is_some(),
        );
    }

    if !missing.is_empty() {
        return Err(Error::MissingConfig { missing });
    }

    let numeric = [
        ("plex.movie_library_id", config.plex.movie_library_id.as_ref()),
        ("plex.tv_library_id", config.plex.tv_library_id.as_ref()),
        (
            "radarr_4k.quality_profile_id",
            config
                .radarr_4k
                .as_ref()
                .and_then(|s| s.quality_profile_id.as_ref()),
        ),
    ];
    for (key, setting) in numeric {
        if let Some(setting) = setting {
            if setting.value().is_none() {
                return Err(Error::invalid_config(
                    key,
                    format!("{:?} is not a positive integer", setting),
                ));
            }
        }
    }

    if config.server.port == 0 {
        return Err(Error::invalid_config("server.port", "cannot be 0"));
    }

    if !config.placeholder.source.exists() {
        tracing::warn!(
            "Placeholder source does not exist: {:?}",
            config.placeholder.source
        );
    }

    Ok(())
}

fn is_empty_path(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
