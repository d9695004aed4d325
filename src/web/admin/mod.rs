//! Back-office API, mounted under `/api/admin`.
//!
//! Every handler takes a [`CurrentAdmin`] and checks one permission before
//! touching data.

mod content;
mod ppdb;
mod users;

use super::{
    AppState,
    auth::CurrentAdmin,
    upload::{FilePayload, UploadPurpose, store_upload},
};
use crate::{
    core::{
        auth::Permission,
        dashboard::{self, Dashboard},
    },
    errors::{Error, Result},
    storage::{Bucket, StoredObject},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RecentQuery {
    recent: Option<u64>,
}

async fn get_dashboard(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Dashboard>> {
    current.require(Permission::ViewDashboard)?;
    Ok(Json(dashboard::dashboard(&state.db, query.recent).await?))
}

#[derive(Debug, Deserialize)]
struct UploadRequest {
    purpose: UploadPurpose,
    file: FilePayload,
}

const fn upload_permission(purpose: UploadPurpose) -> Permission {
    match purpose {
        UploadPurpose::SkillImage => Permission::ManageSkills,
        UploadPurpose::Logo | UploadPurpose::HeaderImage | UploadPurpose::SchoolVideo => {
            Permission::ManageProfile
        }
        UploadPurpose::NewsImage => Permission::ManageNews,
        UploadPurpose::GalleryMedia => Permission::ManageGallery,
    }
}

async fn upload(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(body): Json<UploadRequest>,
) -> Result<(StatusCode, Json<StoredObject>)> {
    current.require(upload_permission(body.purpose))?;
    let file = body.file.decode("file")?;
    let stored = store_upload(&state.storage, body.purpose, file).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn remove_upload(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path((bucket, path)): Path<(String, String)>,
) -> Result<StatusCode> {
    let bucket = Bucket::parse(&bucket)
        .filter(|b| b.is_public())
        .ok_or_else(|| Error::NotFound {
            entity: "bucket",
            key: bucket.clone(),
        })?;
    current.require(match bucket {
        Bucket::NewsImages => Permission::ManageNews,
        Bucket::Gallery => Permission::ManageGallery,
        _ => Permission::ManageProfile,
    })?;
    state.storage.remove(bucket, &path).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Admin routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/uploads", post(upload))
        .route("/uploads/{bucket}/{*path}", delete(remove_upload))
        .merge(content::routes())
        .merge(ppdb::routes())
        .merge(users::routes())
}
