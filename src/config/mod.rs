/// Database connection and table creation
pub mod database;

/// First-run data seeding
pub mod seed;

/// Settings loading from config.toml and the environment
pub mod settings;

pub use settings::{Settings, load_default_config};
