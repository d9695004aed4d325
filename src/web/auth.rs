//! Bearer-token sessions for the admin API.

use super::AppState;
use crate::{
    core::auth::{self, MenuItem, Permission, SignIn},
    entities::admin_user,
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

fn bearer_token(headers: &HeaderMap) -> Result<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Unauthorized {
            message: "Silakan masuk terlebih dahulu".to_string(),
        })
}

/// The signed-in admin resolved from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    /// The admin account
    pub admin: admin_user::Model,
    /// The session token presented
    pub token: String,
}

impl CurrentAdmin {
    /// Fails with 403 unless the admin holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<()> {
        auth::require(&self.admin, permission)
    }
}

impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers)?;
        let admin = auth::current_admin(&state.db, &token, Utc::now()).await?;
        Ok(Self { admin, token })
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct Me {
    admin: admin_user::Model,
    permissions: Vec<Permission>,
    menu: Vec<MenuItem>,
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Result<Json<SignIn>> {
    let ttl = Duration::hours(state.settings.auth.session_ttl_hours);
    let signed = auth::sign_in(&state.db, &body.email, &body.password, Utc::now(), ttl).await?;
    Ok(Json(signed))
}

async fn logout(State(state): State<AppState>, current: CurrentAdmin) -> Result<StatusCode> {
    auth::sign_out(&state.db, &current.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(current: CurrentAdmin) -> Json<Me> {
    let role = current.admin.role;
    Json(Me {
        admin: current.admin,
        permissions: auth::permissions_for(role),
        menu: auth::menu_for(role),
    })
}

/// `/auth/login`, `/auth/logout`, `/auth/me`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
