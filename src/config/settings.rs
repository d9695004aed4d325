//! Application settings loaded from config.toml
//!
//! Every section has defaults, so a missing file yields a runnable local
//! configuration. `DATABASE_URL` and `PORTAL_BIND` override the file.

use crate::entities::{ContactType, Role};
use crate::errors::{Error, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener
    pub server: ServerSettings,
    /// Database connection
    pub database: DatabaseSettings,
    /// Object storage
    pub storage: StorageSettings,
    /// School-wide settings
    pub school: SchoolSettings,
    /// Session handling
    pub auth: AuthSettings,
    /// First-run data
    pub seed: SeedSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to bind, e.g. "0.0.0.0:8080"
    pub bind: String,
    /// Origins allowed by CORS; empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SeaORM connection URL
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: super::database::DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

/// Object storage settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one sub-directory per bucket
    pub root: PathBuf,
    /// Prefix of public object URLs, without trailing slash
    pub public_base_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/storage"),
            public_base_url: "/storage".to_string(),
        }
    }
}

/// School-wide settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchoolSettings {
    /// Offset of the school's local time from UTC, in hours (Asia/Jakarta = 7)
    pub utc_offset_hours: i32,
}

impl Default for SchoolSettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: 7,
        }
    }
}

impl SchoolSettings {
    /// The school's local timezone
    pub fn timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| Error::Config {
            message: format!("utc_offset_hours out of range: {}", self.utc_offset_hours),
        })
    }
}

/// Session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Lifetime of a session token
    pub session_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl_hours: 12,
        }
    }
}

/// Data inserted on first run when the corresponding table is empty
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    /// Initial admin accounts
    pub admins: Vec<SeedAdmin>,
    /// Initial school name
    pub school_name: Option<String>,
    /// Initial programs
    pub skills: Vec<SeedSkill>,
    /// Initial contact entries
    pub contacts: Vec<SeedContact>,
}

/// An admin account to create on first run
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmin {
    /// Sign-in email
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Role
    pub role: Role,
    /// Plain password; when absent `PORTAL_SEED_ADMIN_PASSWORD` is used
    #[serde(default)]
    pub password: Option<String>,
}

/// A program to create on first run
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSkill {
    /// Program name
    pub name: String,
    /// Program description
    #[serde(default)]
    pub description: Option<String>,
    /// Study duration in years
    #[serde(default = "default_duration")]
    pub duration_years: i32,
}

const fn default_duration() -> i32 {
    3
}

/// A contact entry to create on first run
#[derive(Debug, Clone, Deserialize)]
pub struct SeedContact {
    /// Kind of contact
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    /// Display label
    pub label: String,
    /// Number, address, or URL
    pub value: String,
    /// Mark as primary for its type
    #[serde(default)]
    pub is_primary: bool,
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text
pub fn parse_config(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from `PORTAL_CONFIG` (default ./config.toml), then applies
/// environment overrides. A missing default file is not an error.
pub fn load_default_config() -> Result<Settings> {
    let explicit = std::env::var("PORTAL_CONFIG").ok();
    let path = explicit.clone().unwrap_or_else(|| "config.toml".to_string());

    let mut settings = if Path::new(&path).exists() {
        tracing::debug!("Loading configuration from {path}");
        load_config(&path)?
    } else if explicit.is_some() {
        return Err(Error::Config {
            message: format!("PORTAL_CONFIG points to a missing file: {path}"),
        });
    } else {
        tracing::info!("No config.toml found, using built-in defaults");
        Settings::default()
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        settings.database.url = url;
    }
    if let Ok(bind) = std::env::var("PORTAL_BIND") {
        settings.server.bind = bind;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [server]
            bind = "0.0.0.0:9000"

            [storage]
            root = "/var/lib/portal"
            public_base_url = "https://smk.example.sch.id/storage"

            [school]
            utc_offset_hours = 8

            [[seed.admins]]
            email = "admin@smk.example.sch.id"
            full_name = "Administrator"
            role = "super_admin"

            [[seed.skills]]
            name = "Teknik Komputer dan Jaringan"

            [[seed.contacts]]
            type = "phone"
            label = "Tata Usaha"
            value = "(021) 555-0101"
            is_primary = true
        "#;

        let settings = parse_config(toml_str).unwrap();
        assert_eq!(settings.server.bind, "0.0.0.0:9000");
        assert_eq!(settings.storage.root, PathBuf::from("/var/lib/portal"));
        assert_eq!(settings.school.timezone().unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(settings.seed.admins[0].role, Role::SuperAdmin);
        assert!(settings.seed.admins[0].password.is_none());
        assert_eq!(settings.seed.skills[0].duration_years, 3);
        assert_eq!(settings.seed.contacts[0].contact_type, ContactType::Phone);
        assert!(settings.seed.contacts[0].is_primary);
        // untouched sections keep defaults
        assert_eq!(settings.auth.session_ttl_hours, 12);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = parse_config("").unwrap();
        assert_eq!(settings.server.bind, "127.0.0.1:8080");
        assert_eq!(settings.school.utc_offset_hours, 7);
        assert_eq!(settings.storage.public_base_url, "/storage");
    }

    #[test]
    fn test_invalid_offset_is_config_error() {
        let school = SchoolSettings {
            utc_offset_hours: 30,
        };
        assert!(matches!(school.timezone(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let result = parse_config("[server\nbind = 1");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
