use crate::cache::DEFAULT_TTL;
use crate::error::{Result, TrackerError};
use crate::store::{CsvStore, MemoryStore, RecordStore, TabularStore};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_SHEET_URL: &str = "TRAINING_SHEET_URL";
pub const ENV_WORKSHEET: &str = "TRAINING_WORKSHEET";
pub const ENV_CSV_PATH: &str = "TRAINING_CSV_PATH";
pub const ENV_CACHE_TTL_SECS: &str = "TRAINING_CACHE_TTL_SECS";
pub const ENV_READ_ONLY: &str = "TRAINING_READ_ONLY";
pub const ENV_SHEETS_TOKEN: &str = "GOOGLE_SHEETS_ACCESS_TOKEN";

/// Where the session history lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreLocator {
    Csv {
        path: PathBuf,
    },
    Sheet {
        url: String,
        #[serde(default)]
        worksheet: Option<String>,
    },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub store: StoreLocator,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub read_only: bool,
    /// Sheets credential; never written back out.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            store: StoreLocator::Memory,
            cache_ttl_secs: default_cache_ttl_secs(),
            read_only: false,
            access_token: None,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. A sheet URL takes precedence over a CSV path;
    /// with neither, the store is in-memory.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = match (get(ENV_SHEET_URL), get(ENV_CSV_PATH)) {
            (Some(url), _) => StoreLocator::Sheet {
                url,
                worksheet: get(ENV_WORKSHEET),
            },
            (None, Some(path)) => StoreLocator::Csv {
                path: PathBuf::from(path),
            },
            (None, None) => {
                warn!(
                    "Neither {} nor {} is set, using an in-memory store",
                    ENV_SHEET_URL, ENV_CSV_PATH
                );
                StoreLocator::Memory
            }
        };

        let cache_ttl_secs = match get(ENV_CACHE_TTL_SECS) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                TrackerError::InvalidConfig(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_CACHE_TTL_SECS, raw
                ))
            })?,
            None => default_cache_ttl_secs(),
        };

        let read_only = match get(ENV_READ_ONLY) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                TrackerError::InvalidConfig(format!(
                    "{} must be true or false, got '{}'",
                    ENV_READ_ONLY, raw
                ))
            })?,
            None => false,
        };

        let config = Self {
            store,
            cache_ttl_secs,
            read_only,
            access_token: get(ENV_SHEETS_TOKEN),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn validate(&self) -> Result<()> {
        match &self.store {
            StoreLocator::Csv { path } if path.as_os_str().is_empty() => Err(
                TrackerError::InvalidConfig("CSV store path cannot be empty".to_string()),
            ),
            StoreLocator::Sheet { url, .. } if url.trim().is_empty() => Err(
                TrackerError::InvalidConfig("Sheet URL cannot be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Opens the configured store behind the record-store adapter.
pub fn open_store(config: &TrackerConfig) -> Result<RecordStore<Box<dyn TabularStore>>> {
    let store: Box<dyn TabularStore> = match &config.store {
        StoreLocator::Csv { path } => Box::new(CsvStore::new(path.clone())),
        StoreLocator::Memory => Box::new(MemoryStore::new()),
        StoreLocator::Sheet { url, worksheet } => {
            open_sheet(url, worksheet.as_deref(), config.access_token.as_deref())?
        }
    };

    info!(
        "Opened {} (cache {}s{})",
        store.locator(),
        config.cache_ttl_secs,
        if config.read_only { ", read-only" } else { "" }
    );
    Ok(RecordStore::new(store, config.cache_ttl()).read_only(config.read_only))
}

#[cfg(feature = "sheets")]
fn open_sheet(
    url: &str,
    worksheet: Option<&str>,
    access_token: Option<&str>,
) -> Result<Box<dyn TabularStore>> {
    use crate::sheets::{SheetsStore, DEFAULT_WORKSHEET};

    let token = access_token.ok_or_else(|| {
        TrackerError::InvalidConfig(format!("{} is required for a sheet store", ENV_SHEETS_TOKEN))
    })?;
    let store = SheetsStore::from_url(
        url,
        worksheet.unwrap_or(DEFAULT_WORKSHEET),
        token.to_string(),
    )?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "sheets"))]
fn open_sheet(
    _url: &str,
    _worksheet: Option<&str>,
    _access_token: Option<&str>,
) -> Result<Box<dyn TabularStore>> {
    Err(TrackerError::InvalidConfig(
        "Sheet stores need the `sheets` feature".to_string(),
    ))
}
