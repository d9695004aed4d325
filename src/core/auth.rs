//! Admin authentication and role-based authorization.
//!
//! Passwords are stored as bcrypt hashes, computed on the blocking pool.
//! Sessions are random bearer tokens with an expiry; the `sessions` table
//! keeps only their SHA-256.

use crate::{
    entities::{AdminUser, Role, Session, admin_user, session},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
// bcrypt's minimum cost; the crate does not export its `MIN_COST`
const BCRYPT_COST: u32 = 4;

/// Longest password bcrypt takes into account
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Verified against when the email is unknown, so both paths cost one bcrypt run
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Something an admin may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Open the dashboard
    ViewDashboard,
    /// Edit the school profile
    ManageProfile,
    /// Manage admission periods and review registrations
    ManagePpdb,
    /// Read admission data
    ViewPpdb,
    /// Manage programs
    ManageSkills,
    /// Write news
    ManageNews,
    /// Publish and unpublish news
    PublishNews,
    /// Manage the gallery
    ManageGallery,
    /// Manage contact entries
    ManageContacts,
    /// Manage admin accounts
    ManageUsers,
    /// Change system settings
    ManageSettings,
}

const ALL_ROLES: &[Role] = &[Role::SuperAdmin, Role::Admin, Role::Editor];
const ADMINS: &[Role] = &[Role::SuperAdmin, Role::Admin];
const SUPER_ADMIN: &[Role] = &[Role::SuperAdmin];

impl Permission {
    /// Every permission
    pub const ALL: [Self; 11] = [
        Self::ViewDashboard,
        Self::ManageProfile,
        Self::ManagePpdb,
        Self::ViewPpdb,
        Self::ManageSkills,
        Self::ManageNews,
        Self::PublishNews,
        Self::ManageGallery,
        Self::ManageContacts,
        Self::ManageUsers,
        Self::ManageSettings,
    ];

    /// Roles holding this permission
    #[must_use]
    pub const fn roles(self) -> &'static [Role] {
        match self {
            Self::ViewDashboard
            | Self::ManageProfile
            | Self::ViewPpdb
            | Self::ManageSkills
            | Self::ManageNews
            | Self::ManageGallery => ALL_ROLES,
            Self::ManagePpdb | Self::PublishNews | Self::ManageContacts => ADMINS,
            Self::ManageUsers | Self::ManageSettings => SUPER_ADMIN,
        }
    }

    /// Name used in error messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewDashboard => "VIEW_DASHBOARD",
            Self::ManageProfile => "MANAGE_PROFILE",
            Self::ManagePpdb => "MANAGE_PPDB",
            Self::ViewPpdb => "VIEW_PPDB",
            Self::ManageSkills => "MANAGE_SKILLS",
            Self::ManageNews => "MANAGE_NEWS",
            Self::PublishNews => "PUBLISH_NEWS",
            Self::ManageGallery => "MANAGE_GALLERY",
            Self::ManageContacts => "MANAGE_CONTACTS",
            Self::ManageUsers => "MANAGE_USERS",
            Self::ManageSettings => "MANAGE_SETTINGS",
        }
    }
}

/// Whether `role` holds `permission`.
#[must_use]
pub fn has_permission(role: Role, permission: Permission) -> bool {
    permission.roles().contains(&role)
}

/// Every permission `role` holds.
#[must_use]
pub fn permissions_for(role: Role) -> Vec<Permission> {
    Permission::ALL
        .into_iter()
        .filter(|p| has_permission(role, *p))
        .collect()
}

/// Fails with [`Error::Forbidden`] unless `admin` holds `permission`.
pub fn require(admin: &admin_user::Model, permission: Permission) -> Result<()> {
    if has_permission(admin.role, permission) {
        Ok(())
    } else {
        Err(Error::Forbidden {
            role: admin.role.as_str().to_string(),
            action: permission.as_str().to_string(),
        })
    }
}

/// One entry of the back-office navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Route
    pub path: &'static str,
    /// Label
    pub label: &'static str,
    /// Icon name
    pub icon: &'static str,
    /// Roles that see this entry
    pub roles: &'static [Role],
    /// Nested entries
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub submenu: Vec<MenuItem>,
}

impl MenuItem {
    const fn leaf(
        path: &'static str,
        label: &'static str,
        icon: &'static str,
        roles: &'static [Role],
    ) -> Self {
        Self {
            path,
            label,
            icon,
            roles,
            submenu: Vec::new(),
        }
    }
}

/// The full navigation.
#[must_use]
pub fn menu() -> Vec<MenuItem> {
    vec![
        MenuItem::leaf("/admin/dashboard", "Dashboard", "home", ALL_ROLES),
        MenuItem::leaf("/admin/profile", "Profil Sekolah", "user", ALL_ROLES),
        MenuItem {
            submenu: vec![
                MenuItem::leaf("/admin/ppdb", "Periode PPDB", "calendar", ADMINS),
                MenuItem::leaf("/admin/ppdb/registrations", "Pendaftaran", "file-text", ADMINS),
            ],
            ..MenuItem::leaf("/admin/ppdb", "PPDB", "users", ADMINS)
        },
        MenuItem::leaf("/admin/skills", "Kompetensi Keahlian", "book-open", ALL_ROLES),
        MenuItem::leaf("/admin/news", "Berita", "newspaper", ALL_ROLES),
        MenuItem::leaf("/admin/gallery", "Galeri", "camera", ALL_ROLES),
        MenuItem::leaf("/admin/contacts", "Kontak", "phone", ADMINS),
    ]
}

/// The navigation entries (and sub-entries) visible to `role`.
#[must_use]
pub fn menu_for(role: Role) -> Vec<MenuItem> {
    fn visible(items: Vec<MenuItem>, role: Role) -> Vec<MenuItem> {
        items
            .into_iter()
            .filter(|item| item.roles.contains(&role))
            .map(|mut item| {
                item.submenu = visible(std::mem::take(&mut item.submenu), role);
                item
            })
            .collect()
    }
    visible(menu(), role)
}

fn hashing_failed(e: impl std::fmt::Display) -> Error {
    Error::PasswordHash {
        message: e.to_string(),
    }
}

/// Hashes a password with bcrypt and a fresh salt.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(hashing_failed)?
        .map_err(hashing_failed)
}

/// Checks a password against a stored bcrypt hash. Malformed hashes never match.
pub async fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let password = password.to_string();
    let stored = stored.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored).unwrap_or(false))
        .await
        .map_err(hashing_failed)
}

/// A new bearer token: two v4 UUIDs, 64 hex characters.
#[must_use]
pub fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// What the `sessions` table stores for `token`.
#[must_use]
pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize)]
pub struct SignIn {
    /// Bearer token for subsequent requests
    pub token: String,
    /// When the token stops working
    pub expires_at: DateTime<Utc>,
    /// The signed-in admin
    pub admin: admin_user::Model,
    /// What the admin may do
    pub permissions: Vec<Permission>,
}

fn invalid_credentials() -> Error {
    Error::Unauthorized {
        message: "Email atau password salah".to_string(),
    }
}

/// Normalised form of an email used for lookups
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Verifies credentials and opens a session lasting `ttl`.
#[instrument(skip(db, password))]
pub async fn sign_in(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<SignIn> {
    let Some(admin) = AdminUser::find()
        .filter(admin_user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
    else {
        let dummy = DUMMY_HASH
            .get_or_try_init(|| hash_password("kata-sandi-tidak-dipakai"))
            .await?;
        verify_password(password, dummy).await?;
        return Err(invalid_credentials());
    };

    if !verify_password(password, &admin.password_hash).await? {
        warn!("Failed sign-in for admin {}", admin.id);
        return Err(invalid_credentials());
    }
    if !admin.is_active {
        return Err(Error::Unauthorized {
            message: "Akun admin tidak aktif".to_string(),
        });
    }

    let token = new_session_token();
    let expires_at = now + ttl;
    let txn = db.begin().await?;

    Session::delete_many()
        .filter(session::Column::AdminUserId.eq(admin.id))
        .filter(session::Column::ExpiresAt.lte(now))
        .exec(&txn)
        .await?;
    session::ActiveModel {
        token_hash: Set(token_digest(&token)),
        admin_user_id: Set(admin.id),
        created_at: Set(now),
        expires_at: Set(expires_at),
    }
    .insert(&txn)
    .await?;

    let mut model: admin_user::ActiveModel = admin.into();
    model.last_login = Set(Some(now));
    let admin = model.update(&txn).await?;
    txn.commit().await?;

    info!("Admin {} signed in", admin.id);
    Ok(SignIn {
        token,
        expires_at,
        permissions: permissions_for(admin.role),
        admin,
    })
}

/// Ends a session. Unknown tokens are ignored.
#[instrument(skip_all)]
pub async fn sign_out(db: &DatabaseConnection, token: &str) -> Result<()> {
    Session::delete_by_id(token_digest(token)).exec(db).await?;
    Ok(())
}

/// Resolves a bearer token to an active admin.
pub async fn current_admin(
    db: &DatabaseConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<admin_user::Model> {
    let unauthorized = || Error::Unauthorized {
        message: "Sesi tidak valid atau telah berakhir".to_string(),
    };

    let session = Session::find_by_id(token_digest(token))
        .one(db)
        .await?
        .ok_or_else(unauthorized)?;
    if session.expires_at <= now {
        session.delete(db).await?;
        return Err(unauthorized());
    }

    let admin = AdminUser::find_by_id(session.admin_user_id)
        .one(db)
        .await?
        .ok_or_else(unauthorized)?;
    if !admin.is_active {
        return Err(unauthorized());
    }
    Ok(admin)
}
