//! Process configuration for the API server

use intel_core::IntelError;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/coins-backup.json";

/// Server settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub port: u16,
    pub snapshot_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

impl ApiConfig {
    /// Read `SERVER_PORT` and `SNAPSHOT_PATH`, falling back to defaults
    pub fn from_env() -> Result<Self, IntelError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IntelError> {
        let mut config = Self::default();

        if let Some(port) = lookup("SERVER_PORT").filter(|v| !v.trim().is_empty()) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| IntelError::config(format!("SERVER_PORT is not a port: {}", port)))?;
        }

        if let Some(path) = lookup("SNAPSHOT_PATH").filter(|v| !v.trim().is_empty()) {
            config.snapshot_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("SERVER_PORT", "8080"),
            ("SNAPSHOT_PATH", "/var/lib/intel/coins.json"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.snapshot_path, PathBuf::from("/var/lib/intel/coins.json"));
    }

    #[test]
    fn test_bad_port() {
        let err = ApiConfig::from_lookup(lookup(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, IntelError::Config(_)));
    }
}
