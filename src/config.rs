use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::GeoPoint;
use crate::pipeline::rules::{ScoringMode, TriageRules};

/// Application-level constants
pub const APP_NAME: &str = "SwiftCare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_DB_PATH: &str = "SWIFTCARE_DB_PATH";
pub const ENV_COHERE_API_KEY: &str = "COHERE_API_KEY";
pub const ENV_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_SEARCH_RADIUS_M: u32 = 5000;
const DEFAULT_COHERE_MODEL: &str = "command";

/// San Francisco. Used when a submission carries no location.
pub const DEFAULT_LOCATION: GeoPoint = GeoPoint {
    latitude: 37.7749,
    longitude: -122.4194,
};

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "swiftcare=info,swiftcare_lib=info,tower_http=warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Failed to load triage rules from {path}: {reason}")]
    Rules { path: String, reason: String },
}

/// Which external service answers nearby-hospital queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    /// Google Places nearby search, requires the maps key.
    Places,
    /// OpenStreetMap Overpass, unauthenticated.
    Overpass,
}

impl std::str::FromStr for SearchBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "places" => Ok(Self::Places),
            "overpass" => Ok(Self::Overpass),
            other => Err(ConfigError::Invalid {
                key: "SWIFTCARE_SEARCH_BACKEND",
                reason: format!("unknown backend '{other}'"),
            }),
        }
    }
}

/// Process configuration. All three secrets are mandatory.
#[derive(Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub cohere_api_key: String,
    pub maps_api_key: String,
    pub cohere_model: String,
    pub bind_addr: SocketAddr,
    pub search_backend: SearchBackend,
    pub search_radius_m: u32,
    pub default_location: GeoPoint,
    pub scoring_mode: ScoringMode,
    pub rules: TriageRules,
}

// API keys never reach logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("db_path", &self.db_path)
            .field("cohere_api_key", &"<redacted>")
            .field("maps_api_key", &"<redacted>")
            .field("cohere_model", &self.cohere_model)
            .field("bind_addr", &self.bind_addr)
            .field("search_backend", &self.search_backend)
            .field("search_radius_m", &self.search_radius_m)
            .field("default_location", &self.default_location)
            .field("scoring_mode", &self.scoring_mode)
            .field("rules", &self.rules.version)
            .finish()
    }
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (environment, map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let db_path = PathBuf::from(required(ENV_DB_PATH)?);
        let cohere_api_key = required(ENV_COHERE_API_KEY)?;
        let maps_api_key = required(ENV_MAPS_API_KEY)?;

        let bind_addr = lookup("SWIFTCARE_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "SWIFTCARE_BIND",
                reason: e.to_string(),
            })?;

        let search_backend = match lookup("SWIFTCARE_SEARCH_BACKEND") {
            Some(v) => v.parse()?,
            None => SearchBackend::Places,
        };

        let search_radius_m = parse_or(&lookup, "SWIFTCARE_SEARCH_RADIUS_M", DEFAULT_SEARCH_RADIUS_M)?;
        let default_location = GeoPoint {
            latitude: parse_or(&lookup, "SWIFTCARE_DEFAULT_LAT", DEFAULT_LOCATION.latitude)?,
            longitude: parse_or(&lookup, "SWIFTCARE_DEFAULT_LON", DEFAULT_LOCATION.longitude)?,
        };

        let scoring_mode = match lookup("SWIFTCARE_SCORING_MODE") {
            Some(v) => v.parse().map_err(|reason| ConfigError::Invalid {
                key: "SWIFTCARE_SCORING_MODE",
                reason,
            })?,
            None => ScoringMode::Rules,
        };

        let rules = match lookup("SWIFTCARE_TRIAGE_RULES") {
            Some(path) => TriageRules::load(&path).map_err(|e| ConfigError::Rules {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            None => TriageRules::default(),
        };

        Ok(Self {
            db_path,
            cohere_api_key,
            maps_api_key,
            cohere_model: lookup("COHERE_MODEL").unwrap_or_else(|| DEFAULT_COHERE_MODEL.to_string()),
            bind_addr,
            search_backend,
            search_radius_m,
            default_location,
            scoring_mode,
            rules,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required_only() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_DB_PATH, "/tmp/swiftcare.db"),
            (ENV_COHERE_API_KEY, "co-key"),
            (ENV_MAPS_API_KEY, "maps-key"),
        ]
    }

    #[test]
    fn debug_output_redacts_api_keys() {
        let config = AppConfig::from_lookup(lookup_from(&required_only())).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("co-key"));
        assert!(!printed.contains("maps-key"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("/tmp/swiftcare.db"));
    }

    #[test]
    fn loads_with_required_secrets_and_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&required_only())).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/swiftcare.db"));
        assert_eq!(config.cohere_model, "command");
        assert_eq!(config.search_backend, SearchBackend::Places);
        assert_eq!(config.search_radius_m, 5000);
        assert_eq!(config.default_location, DEFAULT_LOCATION);
        assert_eq!(config.scoring_mode, ScoringMode::Rules);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn each_missing_secret_is_fatal() {
        for missing in [ENV_DB_PATH, ENV_COHERE_API_KEY, ENV_MAPS_API_KEY] {
            let pairs: Vec<_> = required_only()
                .into_iter()
                .filter(|(k, _)| *k != missing)
                .collect();
            let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Missing(key) if key == missing),
                "expected Missing({missing}), got {err:?}"
            );
        }
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let mut pairs = required_only();
        pairs[1] = (ENV_COHERE_API_KEY, "   ");
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_COHERE_API_KEY)));
    }

    #[test]
    fn optional_overrides_are_parsed() {
        let mut pairs = required_only();
        pairs.extend([
            ("SWIFTCARE_SEARCH_BACKEND", "Overpass"),
            ("SWIFTCARE_SEARCH_RADIUS_M", "2500"),
            ("SWIFTCARE_DEFAULT_LAT", "43.65"),
            ("SWIFTCARE_DEFAULT_LON", "-79.38"),
            ("SWIFTCARE_SCORING_MODE", "model_assisted"),
            ("SWIFTCARE_BIND", "0.0.0.0:9000"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.search_backend, SearchBackend::Overpass);
        assert_eq!(config.search_radius_m, 2500);
        assert_eq!(config.default_location.latitude, 43.65);
        assert_eq!(config.scoring_mode, ScoringMode::ModelAssisted);
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn invalid_radius_is_rejected() {
        let mut pairs = required_only();
        pairs.push(("SWIFTCARE_SEARCH_RADIUS_M", "far"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SWIFTCARE_SEARCH_RADIUS_M", .. }));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut pairs = required_only();
        pairs.push(("SWIFTCARE_SEARCH_BACKEND", "bing"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn app_name_is_swiftcare() {
        assert_eq!(APP_NAME, "SwiftCare");
    }
}
