//! Configuration management for marginalia
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary) and command line flags override them.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::document::DEFAULT_PAGE_CAPACITY;
use crate::error::{Result, SyncError};

/// Vertical distance below which a stored record and a PDF annotation may
/// describe the same thing
pub const DEFAULT_PROXIMITY: f64 = 50.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

/// Locations of the viewer's SQLite files
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Holds the path to hash table
    pub local_path: Option<PathBuf>,
    /// Holds highlights and bookmarks
    pub shared_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub embed_method: EmbedMethod,
    pub proximity: f64,
    /// Pages of text kept per open document
    pub page_cache: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            embed_method: EmbedMethod::default(),
            proximity: DEFAULT_PROXIMITY,
            page_cache: DEFAULT_PAGE_CAPACITY,
        }
    }
}

/// How the embed pass places a highlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMethod {
    /// Search the page for the highlight's text
    #[default]
    Search,
    /// Select the words between the stored begin and end points
    Words,
}

impl FromStr for EmbedMethod {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(EmbedMethod::Search),
            "words" => Ok(EmbedMethod::Words),
            other => Err(SyncError::InvalidInput(format!(
                "Unknown embed method {:?} (expected search or words)",
                other
            ))),
        }
    }
}

impl fmt::Display for EmbedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedMethod::Search => write!(f, "search"),
            EmbedMethod::Words => write!(f, "words"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SyncConfig::default();

        let embed_method = match lookup("MARGINALIA_EMBED_METHOD") {
            Some(value) => value.parse()?,
            None => defaults.embed_method,
        };
        let proximity = match lookup("MARGINALIA_PROXIMITY") {
            Some(value) => parse_number("MARGINALIA_PROXIMITY", &value)?,
            None => defaults.proximity,
        };
        let page_cache = match lookup("MARGINALIA_PAGE_CACHE") {
            Some(value) => parse_number("MARGINALIA_PAGE_CACHE", &value)?,
            None => defaults.page_cache,
        };

        Ok(Config {
            database: DatabaseConfig {
                local_path: lookup("MARGINALIA_LOCAL_DB").map(PathBuf::from),
                shared_path: lookup("MARGINALIA_SHARED_DB").map(PathBuf::from),
            },
            sync: SyncConfig {
                embed_method,
                proximity,
                page_cache,
            },
        })
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SyncError::InvalidInput(format!("{} is not a valid number: {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.sync.embed_method, EmbedMethod::Search);
        assert_eq!(config.sync.proximity, 50.0);
        assert_eq!(config.sync.page_cache, DEFAULT_PAGE_CAPACITY);
        assert!(config.database.local_path.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("MARGINALIA_LOCAL_DB", "/data/local.db"),
            ("MARGINALIA_SHARED_DB", "/data/shared.db"),
            ("MARGINALIA_EMBED_METHOD", "Words"),
            ("MARGINALIA_PROXIMITY", "25.5"),
            ("MARGINALIA_PAGE_CACHE", "8"),
        ]))
        .unwrap();

        assert_eq!(config.database.local_path, Some(PathBuf::from("/data/local.db")));
        assert_eq!(config.sync.embed_method, EmbedMethod::Words);
        assert_eq!(config.sync.proximity, 25.5);
        assert_eq!(config.sync.page_cache, 8);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup_from(&[("MARGINALIA_EMBED_METHOD", "fitz")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("MARGINALIA_PROXIMITY", "near")])).is_err());
    }
}
