use dotenvy::dotenv;
use smart_canteen::{
    api::{self, AppState},
    config::{
        Settings,
        database::{create_connection, create_tables, seed_database},
        seed::load_config_or_default,
    },
    core::auth::ID_PROOF_DIR,
    errors::Result,
};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Creates the parent directory of a file-backed `SQLite` URL.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Runtime settings
    let settings = Settings::from_env().inspect_err(|e| error!("Invalid settings: {}", e))?;
    if !settings.gateway.is_configured() {
        warn!("Payment gateway keys not set, only simulated payments are available");
    } else if settings.gateway.webhook_secret.is_none() {
        warn!("GATEWAY_WEBHOOK_SECRET not set, gateway webhooks will be ignored");
    }

    // 4. Storage directories
    ensure_sqlite_dir(&settings.database_url)?;
    std::fs::create_dir_all(settings.uploads_root.join(ID_PROOF_DIR))?;

    // 5. Database and schema
    let db = create_connection(&settings.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 6. Seed accounts and the starter menu
    let seed = load_config_or_default(&settings.seed_config_path)?;
    seed_database(&db, &seed)
        .await
        .inspect_err(|e| error!("Failed to seed database: {}", e))?;

    // 7. Serve
    api::serve(AppState::new(db, settings)).await
}
