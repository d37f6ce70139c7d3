//! Environment configuration.
//!
//! Read once at startup, after `.env` (if any) has been loaded into the
//! process environment. Invalid values are logged and replaced by defaults.

use web_time::Duration;

use crate::data::DataSource;
use crate::state::DEFAULT_REVEAL_THRESHOLD;

const INST_DATA_ENV: &str = "INST_DATA_URL";
const COLLABS_DATA_ENV: &str = "COLLABS_DATA_URL";
const REVEAL_MS_ENV: &str = "COLLAB_VIS_REVEAL_MS";

const DEFAULT_INST_DATA: &str = "data/institutions.csv";
const DEFAULT_COLLABS_DATA: &str = "data/collaborations.csv";

/// Runtime settings for the app.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Institution table
    pub institutions: DataSource,
    /// Collaboration table
    pub collaborations: DataSource,
    /// Delay between data load and the institution reveal
    pub reveal_threshold: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            institutions: DataSource::parse(DEFAULT_INST_DATA),
            collaborations: DataSource::parse(DEFAULT_COLLABS_DATA),
            reveal_threshold: DEFAULT_REVEAL_THRESHOLD,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            institutions: source_from_env(INST_DATA_ENV).unwrap_or(defaults.institutions),
            collaborations: source_from_env(COLLABS_DATA_ENV).unwrap_or(defaults.collaborations),
            reveal_threshold: reveal_from_env().unwrap_or(defaults.reveal_threshold),
        }
    }
}

fn source_from_env(key: &str) -> Option<DataSource> {
    let raw = std::env::var(key).ok()?;
    if raw.trim().is_empty() {
        log::warn!("{} is set but empty, using default", key);
        return None;
    }
    Some(DataSource::parse(&raw))
}

fn reveal_from_env() -> Option<Duration> {
    let raw = std::env::var(REVEAL_MS_ENV).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(e) => {
            log::warn!("Invalid {} {:?}: {}, using default", REVEAL_MS_ENV, raw, e);
            None
        }
    }
}
