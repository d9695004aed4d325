use dotenvy::dotenv;
use sekolah_portal::{
    config::{self, database, seed},
    errors::Result,
    web::{self, AppState},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let settings = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    settings.school.timezone()?;
    info!("Configuration loaded");

    // 4. Connect and create tables
    let db = database::create_connection(&settings.database.url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed first-run data into empty tables
    seed::seed_initial_data(&db, &settings)
        .await
        .inspect_err(|e| error!("Failed to seed initial data: {}", e))?;

    // 6. Prepare storage and serve
    let state = AppState::new(db, settings);
    state.storage.ensure_buckets().await?;
    web::serve(state)
        .await
        .inspect_err(|e| error!("Server error: {}", e))
}
