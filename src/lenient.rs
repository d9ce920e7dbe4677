//! Deserializers for webhook fields that arrive as either strings or numbers.
//!
//! Tautulli templates everything as text, while Radarr and Sonarr send real
//! numbers, and older versions of each disagree. Empty strings count as absent.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

/// `Option<i64>` from a number, a numeric string, an empty string, or null.
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Loose> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Int(n)) => Some(n),
        Some(Loose::Float(f)) if f.fract() == 0.0 => Some(f as i64),
        Some(Loose::Float(_)) => None,
        Some(Loose::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// `Option<String>` from a string or a number; empty strings become `None`.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Loose> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Loose::Int(n)) => Some(n.to_string()),
        Some(Loose::Float(f)) => Some(f.to_string()),
        Some(Loose::Text(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        None => None,
    })
}
