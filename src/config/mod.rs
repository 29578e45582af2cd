/// Database configuration, schema creation and seeding
pub mod database;

/// Seed records (admins, kitchen staff, menu) loaded from config.toml
pub mod seed;

/// Runtime settings loaded from environment variables
pub mod settings;

pub use settings::Settings;
