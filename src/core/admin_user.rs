//! Admin account management.

use crate::{
    core::{
        auth::{MAX_PASSWORD_BYTES, hash_password, normalize_email},
        validation::FieldCheck,
    },
    entities::{AdminUser, Role, Session, admin_user, session},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 8;

/// Values accepted when creating or editing an admin account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminInput {
    /// Sign-in email
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Role
    pub role: Role,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// New password; required on create, optional on update
    #[serde(default)]
    pub password: Option<String>,
}

impl AdminInput {
    fn validate(&self, password_required: bool) -> Result<()> {
        let mut check = FieldCheck::new();
        check
            .required("email", &self.email)
            .email("email", Some(&self.email))
            .required("full_name", &self.full_name);
        match self.password.as_deref() {
            None | Some("") if password_required => {
                check.required("password", "");
            }
            Some(password) if !password.is_empty() && password.chars().count() < MIN_PASSWORD_LEN => {
                check.fail("password", format!("Minimal {MIN_PASSWORD_LEN} karakter"));
            }
            Some(password) if password.len() > MAX_PASSWORD_BYTES => {
                check.fail("password", format!("Maksimal {MAX_PASSWORD_BYTES} karakter"));
            }
            _ => {}
        }
        check.finish()
    }
}

async fn ensure_email_free<C>(db: &C, email: &str, exclude_id: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut query = AdminUser::find().filter(admin_user::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        query = query.filter(admin_user::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(Error::field("email", "Email sudah terdaftar"));
    }
    Ok(())
}

/// All admin accounts, alphabetically by name.
pub async fn list_admins(db: &DatabaseConnection) -> Result<Vec<admin_user::Model>> {
    AdminUser::find()
        .order_by_asc(admin_user::Column::FullName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an admin by id.
pub async fn get_admin(db: &DatabaseConnection, id: i64) -> Result<admin_user::Model> {
    AdminUser::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("admin user", id))
}

/// Creates an active admin account.
#[instrument(skip(db, input), fields(email = %input.email, role = ?input.role))]
pub async fn create_admin(db: &DatabaseConnection, input: AdminInput) -> Result<admin_user::Model> {
    input.validate(true)?;
    let email = normalize_email(&input.email);
    ensure_email_free(db, &email, None).await?;

    let password_hash = hash_password(input.password.as_deref().unwrap_or_default()).await?;
    let now = Utc::now();
    let admin = admin_user::ActiveModel {
        email: Set(email),
        full_name: Set(input.full_name.trim().to_string()),
        role: Set(input.role),
        avatar_url: Set(input.avatar_url.filter(|u| !u.trim().is_empty())),
        password_hash: Set(password_hash),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created admin {}", admin.id);
    Ok(admin)
}

/// Updates an account; the password changes only when a new one is given.
#[instrument(skip(db, input))]
pub async fn update_admin(
    db: &DatabaseConnection,
    id: i64,
    input: AdminInput,
) -> Result<admin_user::Model> {
    input.validate(false)?;
    let email = normalize_email(&input.email);
    ensure_email_free(db, &email, Some(id)).await?;

    let mut model: admin_user::ActiveModel = get_admin(db, id).await?.into();
    model.email = Set(email);
    model.full_name = Set(input.full_name.trim().to_string());
    model.role = Set(input.role);
    model.avatar_url = Set(input.avatar_url.filter(|u| !u.trim().is_empty()));
    if let Some(password) = input.password.as_deref().filter(|p| !p.is_empty()) {
        model.password_hash = Set(hash_password(password).await?);
    }
    model.updated_at = Set(Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Activates or deactivates an account. Deactivation ends its sessions.
#[instrument(skip(db))]
pub async fn set_admin_active(
    db: &DatabaseConnection,
    id: i64,
    active: bool,
) -> Result<admin_user::Model> {
    let txn = db.begin().await?;
    let admin = AdminUser::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("admin user", id))?;

    if !active {
        Session::delete_many()
            .filter(session::Column::AdminUserId.eq(id))
            .exec(&txn)
            .await?;
    }
    let mut model: admin_user::ActiveModel = admin.into();
    model.is_active = Set(active);
    model.updated_at = Set(Utc::now());
    let updated = model.update(&txn).await?;
    txn.commit().await?;

    info!("Admin {id} active = {active}");
    Ok(updated)
}

/// Deletes an account and its sessions.
#[instrument(skip(db))]
pub async fn delete_admin(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    Session::delete_many()
        .filter(session::Column::AdminUserId.eq(id))
        .exec(&txn)
        .await?;
    let result = AdminUser::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("admin user", id));
    }
    txn.commit().await?;
    info!("Deleted admin {id}");
    Ok(())
}
