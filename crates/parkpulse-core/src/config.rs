//! Config - `parkpulse.toml` の読み込み
//!
//! すべてのセクションは省略可能。足りないキーは既定値になる。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::DecayPolicy;
use crate::geo::{GeoPoint, Geofence};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "parkpulse.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub park: ParkConfig,
}

/// Windows and thresholds of the status aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Reports older than this are pruned from the log.
    #[serde(default = "default_window_minutes")]
    pub retention_minutes: u64,

    /// Age at which a report's weight reaches zero.
    #[serde(default = "default_window_minutes")]
    pub decay_window_minutes: u64,

    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,

    #[serde(default = "default_busy_threshold")]
    pub busy_threshold: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            retention_minutes: default_window_minutes(),
            decay_window_minutes: default_window_minutes(),
            medium_threshold: default_medium_threshold(),
            busy_threshold: default_busy_threshold(),
        }
    }
}

fn default_window_minutes() -> u64 {
    45
}

fn default_medium_threshold() -> f64 {
    DecayPolicy::DEFAULT_MEDIUM_THRESHOLD
}

fn default_busy_threshold() -> f64 {
    DecayPolicy::DEFAULT_BUSY_THRESHOLD
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_minutes == 0 || self.decay_window_minutes == 0 {
            return Err(ConfigError::Invalid(
                "retention_minutes and decay_window_minutes must be positive".to_string(),
            ));
        }
        let ordered = 1.0 <= self.medium_threshold
            && self.medium_threshold <= self.busy_threshold
            && self.busy_threshold <= 3.0;
        if !ordered {
            return Err(ConfigError::Invalid(format!(
                "thresholds must satisfy 1.0 <= medium ({}) <= busy ({}) <= 3.0",
                self.medium_threshold, self.busy_threshold
            )));
        }
        Ok(())
    }

    pub fn policy(&self) -> DecayPolicy {
        DecayPolicy {
            retention: Duration::from_secs(self.retention_minutes * 60),
            decay_window: Duration::from_secs(self.decay_window_minutes * 60),
            medium_threshold: self.medium_threshold,
            busy_threshold: self.busy_threshold,
        }
    }
}

/// Where the local store keeps its files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parkpulse")
}

/// Optional remote copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Project URL, e.g. `https://<project>.supabase.co`.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_reports_table")]
    pub reports_table: String,

    #[serde(default = "default_parking_table")]
    pub parking_table: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            api_key: String::new(),
            reports_table: default_reports_table(),
            parking_table: default_parking_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_reports_table() -> String {
    "court_reports".to_string()
}

fn default_parking_table() -> String {
    "parking_data".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl RemoteConfig {
    /// Remote replication is used only when enabled and fully configured.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// Park geofence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkConfig {
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    #[serde(default = "default_center_lng")]
    pub center_lng: f64,

    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
}

impl Default for ParkConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            radius_km: default_radius_km(),
        }
    }
}

fn default_center_lat() -> f64 {
    33.9784
}

fn default_center_lng() -> f64 {
    -84.1315
}

fn default_radius_km() -> f64 {
    0.5
}

impl ParkConfig {
    pub fn geofence(&self) -> Geofence {
        Geofence::new(GeoPoint::new(self.center_lat, self.center_lng), self.radius_km)
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs_err::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aggregation.validate()?;
        if self.park.radius_km <= 0.0 {
            return Err(ConfigError::Invalid(
                "park.radius_km must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Default configuration rendered as TOML, for `init-config`.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::tempdir;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.aggregation.retention_minutes, 45);
        assert_eq!(config.aggregation.decay_window_minutes, 45);
        assert_eq!(config.aggregation.policy(), DecayPolicy::default());
        assert!(!config.remote.enabled);
        assert_eq!(config.remote.reports_table, "court_reports");
    }

    #[test]
    fn windows_can_be_configured_independently() {
        let config = Config::from_toml_str(
            "[aggregation]\nretention_minutes = 60\ndecay_window_minutes = 30\n",
        )
        .unwrap();
        let policy = config.aggregation.policy();
        assert_eq!(policy.retention, Duration::from_secs(3600));
        assert_eq!(policy.decay_window, Duration::from_secs(1800));
    }

    #[rstest]
    #[case::zero_retention("[aggregation]\nretention_minutes = 0\n")]
    #[case::zero_decay("[aggregation]\ndecay_window_minutes = 0\n")]
    #[case::inverted_thresholds("[aggregation]\nmedium_threshold = 2.5\nbusy_threshold = 2.0\n")]
    #[case::threshold_above_scale("[aggregation]\nbusy_threshold = 3.5\n")]
    #[case::negative_radius("[park]\nradius_km = -1.0\n")]
    fn invalid_values_are_rejected(#[case] toml_text: &str) {
        let err = Config::from_toml_str(toml_text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parkpulse.toml");
        std::fs::write(&path, "[aggregation\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        match err {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_toml_round_trips() {
        let text = Config::default_toml();
        assert!(text.contains("[aggregation]"));
        let parsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(parsed.aggregation.policy(), DecayPolicy::default());
        assert_eq!(parsed.remote.timeout_secs, 5);
    }

    #[test]
    fn remote_requires_url_and_key() {
        let mut remote = RemoteConfig {
            enabled: true,
            ..RemoteConfig::default()
        };
        assert!(!remote.is_usable());
        remote.url = "https://example.supabase.co".to_string();
        remote.api_key = "anon".to_string();
        assert!(remote.is_usable());
    }
}
