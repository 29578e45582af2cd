//! Seed configuration loading from config.toml
//!
//! Admin and kitchen accounts are not self-service, so they are declared in
//! `config.toml` together with the starter menu. The records are inserted on
//! startup by [`crate::config::database::seed_database`].

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Administrator accounts
    #[serde(default)]
    pub admins: Vec<PrincipalSeed>,
    /// Kitchen staff accounts
    #[serde(default)]
    pub kitchen_staff: Vec<PrincipalSeed>,
    /// Starter menu, used only while the menu table is empty
    #[serde(default)]
    pub menu: Vec<MenuSeed>,
}

/// A seeded admin or kitchen account
#[derive(Debug, Deserialize, Clone)]
pub struct PrincipalSeed {
    pub name: String,
    pub email: String,
    /// Plaintext in the file, hashed before it reaches the database
    pub password: String,
}

/// A starter menu item
#[derive(Debug, Deserialize, Clone)]
pub struct MenuSeed {
    pub name: String,
    pub price: f64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_category() -> String {
    "main".to_string()
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load seed configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads seed configuration, falling back to an empty seed when the file is missing.
///
/// A missing file is not fatal: the service still starts, it just has no
/// admin or kitchen accounts until one is configured.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        tracing::warn!(
            "Seed config {} not found, starting without seeded accounts",
            path_ref.display()
        );
        return Ok(SeedConfig::default());
    }
    load_config(path_ref)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_seed_config() {
        let toml_str = r#"
            [[admins]]
            name = "Canteen Admin"
            email = "admin@canteen.test"
            password = "change-me"

            [[kitchen_staff]]
            name = "Head Cook"
            email = "kitchen@canteen.test"
            password = "change-me-too"

            [[menu]]
            name = "Chicken Biryani"
            price = 180.0
            description = "Aromatic basmati rice with tender chicken"

            [[menu]]
            name = "Tea"
            price = 20.0
            category = "beverage"
        "#;

        let config: SeedConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.admins.len(), 1);
        assert_eq!(config.admins[0].email, "admin@canteen.test");
        assert_eq!(config.kitchen_staff[0].name, "Head Cook");
        assert_eq!(config.menu.len(), 2);
        assert_eq!(config.menu[0].category, "main");
        assert_eq!(config.menu[1].category, "beverage");
        assert_eq!(config.menu[1].price, 20.0);
        assert!(config.menu[1].description.is_none());
    }

    #[test]
    fn test_empty_sections_default() {
        let config: SeedConfig = toml::from_str("").unwrap();
        assert!(config.admins.is_empty());
        assert!(config.kitchen_staff.is_empty());
        assert!(config.menu.is_empty());
    }

    #[test]
    fn test_missing_file_is_not_fatal() {
        let config = load_config_or_default("definitely/not/here.toml").unwrap();
        assert!(config.admins.is_empty());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = toml::from_str::<SeedConfig>("[[admins]]\nname = 1").unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(matches!(
            load_config("definitely/not/here.toml").unwrap_err(),
            Error::Config { .. }
        ));
    }
}
