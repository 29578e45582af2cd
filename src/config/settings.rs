//! Runtime settings loaded from environment variables.
//!
//! Everything has a development default except the payment gateway keys:
//! without them the gateway verification path reports "not configured" and
//! only simulated payments are available.

use crate::core::payment::GatewayConfig;
use crate::errors::{Error, Result};
use std::path::PathBuf;

/// Default `SQLite` file, created on first run
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen.sqlite?mode=rwc";

/// Service settings shared by the HTTP layer
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    /// Used to build absolute photo URLs in exports
    pub public_base_url: String,
    /// Directory that receives uploaded ID photos
    pub uploads_root: PathBuf,
    /// Path of the seed file
    pub seed_config_path: PathBuf,
    pub session_ttl_hours: i64,
    pub gateway: GatewayConfig,
    /// UPI collect id shown on the payment page
    pub upi_collect_id: Option<String>,
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string());
        let public_base_url = get("PUBLIC_BASE_URL").unwrap_or_else(|| {
            let port = bind_addr.rsplit(':').next().unwrap_or("5000");
            format!("http://localhost:{port}")
        });

        let session_ttl_hours = match get("SESSION_TTL_HOURS") {
            Some(raw) => raw.parse::<i64>().map_err(|e| Error::Config {
                message: format!("Invalid SESSION_TTL_HOURS value {raw:?}: {e}"),
            })?,
            None => 12,
        };
        if session_ttl_hours <= 0 {
            return Err(Error::Config {
                message: "SESSION_TTL_HOURS must be positive".to_string(),
            });
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            uploads_root: PathBuf::from(get("UPLOADS_ROOT").unwrap_or_else(|| "uploads".to_string())),
            seed_config_path: PathBuf::from(
                get("SEED_CONFIG").unwrap_or_else(|| "config.toml".to_string()),
            ),
            session_ttl_hours,
            gateway: GatewayConfig {
                key_id: get("GATEWAY_KEY_ID"),
                key_secret: get("GATEWAY_KEY_SECRET"),
                webhook_secret: get("GATEWAY_WEBHOOK_SECRET"),
            },
            upi_collect_id: get("UPI_COLLECT_ID"),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.bind_addr, "0.0.0.0:5000");
        assert_eq!(settings.public_base_url, "http://localhost:5000");
        assert_eq!(settings.uploads_root, PathBuf::from("uploads"));
        assert_eq!(settings.session_ttl_hours, 12);
        assert!(settings.gateway.key_secret.is_none());
        assert!(settings.upi_collect_id.is_none());
    }

    #[test]
    fn test_overrides_and_empty_values() {
        let settings = Settings::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("PUBLIC_BASE_URL", "https://canteen.example/"),
            ("GATEWAY_KEY_SECRET", "s3cret"),
            ("GATEWAY_KEY_ID", "  "),
            ("SESSION_TTL_HOURS", "2"),
        ]))
        .unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:8080");
        assert_eq!(settings.public_base_url, "https://canteen.example");
        assert_eq!(settings.gateway.key_secret.as_deref(), Some("s3cret"));
        assert!(settings.gateway.key_id.is_none());
        assert_eq!(settings.session_ttl_hours, 2);
    }

    #[test]
    fn test_invalid_ttl() {
        let result = Settings::from_lookup(lookup(&[("SESSION_TTL_HOURS", "soon")]));
        assert!(matches!(result, Err(Error::Config { .. })));
        let result = Settings::from_lookup(lookup(&[("SESSION_TTL_HOURS", "0")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
