//! Admin account management; `super_admin` only.

use super::super::{AppState, auth::CurrentAdmin};
use crate::{
    core::{
        admin_user::{self, AdminInput},
        auth::Permission,
        table::{Page, TableQuery},
    },
    entities::admin_user as admin_entity,
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;

fn not_self(current: &CurrentAdmin, id: i64) -> Result<()> {
    if current.admin.id == id {
        return Err(Error::Conflict {
            message: "Tidak dapat mengubah status akun sendiri".to_string(),
        });
    }
    Ok(())
}

async fn list_users(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Query(table): Query<TableQuery>,
) -> Result<Json<Page<admin_entity::Model>>> {
    current.require(Permission::ManageUsers)?;
    Ok(Json(table.apply(admin_user::list_admins(&state.db).await?)))
}

async fn create_user(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(input): Json<AdminInput>,
) -> Result<(StatusCode, Json<admin_entity::Model>)> {
    current.require(Permission::ManageUsers)?;
    let created = admin_user::create_admin(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_user(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<admin_entity::Model>> {
    current.require(Permission::ManageUsers)?;
    Ok(Json(admin_user::get_admin(&state.db, id).await?))
}

async fn update_user(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(input): Json<AdminInput>,
) -> Result<Json<admin_entity::Model>> {
    current.require(Permission::ManageUsers)?;
    if current.admin.id == id && input.role != current.admin.role {
        return Err(Error::Conflict {
            message: "Tidak dapat mengubah peran akun sendiri".to_string(),
        });
    }
    Ok(Json(admin_user::update_admin(&state.db, id, input).await?))
}

#[derive(Debug, Deserialize)]
struct ActiveFlag {
    is_active: bool,
}

async fn set_user_active(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(body): Json<ActiveFlag>,
) -> Result<Json<admin_entity::Model>> {
    current.require(Permission::ManageUsers)?;
    not_self(&current, id)?;
    Ok(Json(
        admin_user::set_admin_active(&state.db, id, body.is_active).await?,
    ))
}

async fn delete_user(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    current.require(Permission::ManageUsers)?;
    not_self(&current, id)?;
    admin_user::delete_admin(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{id}/active", put(set_user_active))
}
