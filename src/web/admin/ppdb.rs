//! Admission periods and registration review.

use super::super::{AppState, auth::CurrentAdmin, upload::content_type_for};
use crate::{
    core::{
        admission::{self, PeriodInput, period_form_fields},
        auth::Permission,
        export,
        form::FieldSpec,
        registration::{self, DocumentKind, RegistrationFilter, RegistrationRow, StatusCounts},
        table::{Page, TableQuery},
    },
    entities::{RegistrationStatus, admission_period, registration as registration_entity},
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Map, Value};

// Periods

async fn list_periods(
    State(state): State<AppState>,
    current: CurrentAdmin,
) -> Result<Json<Vec<admission_period::Model>>> {
    current.require(Permission::ViewPpdb)?;
    Ok(Json(admission::list_periods(&state.db).await?))
}

async fn period_form(current: CurrentAdmin) -> Result<Json<Vec<FieldSpec>>> {
    current.require(Permission::ManagePpdb)?;
    Ok(Json(period_form_fields()))
}

async fn create_period(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(values): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<admission_period::Model>)> {
    current.require(Permission::ManagePpdb)?;
    let input = PeriodInput::from_values(&values)?;
    let created = admission::create_period(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_period(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<admission_period::Model>> {
    current.require(Permission::ViewPpdb)?;
    Ok(Json(admission::get_period(&state.db, id).await?))
}

async fn update_period(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(values): Json<Map<String, Value>>,
) -> Result<Json<admission_period::Model>> {
    current.require(Permission::ManagePpdb)?;
    let input = PeriodInput::from_values(&values)?;
    Ok(Json(admission::update_period(&state.db, id, input).await?))
}

async fn delete_period(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    current.require(Permission::ManagePpdb)?;
    admission::delete_period(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ActiveFlag {
    is_active: bool,
}

async fn activate_period(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(body): Json<ActiveFlag>,
) -> Result<Json<admission_period::Model>> {
    current.require(Permission::ManagePpdb)?;
    Ok(Json(admission::set_period_active(&state.db, id, body.is_active).await?))
}

// Registrations

async fn list_registrations(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Query(filter): Query<RegistrationFilter>,
    Query(table): Query<TableQuery>,
) -> Result<Json<Page<RegistrationRow>>> {
    current.require(Permission::ViewPpdb)?;
    let rows = registration::list_registrations(&state.db, filter).await?;
    Ok(Json(table.apply(rows)))
}

#[derive(Debug, Deserialize)]
struct PeriodQuery {
    period_id: Option<i64>,
}

async fn registration_counts(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<StatusCounts>> {
    current.require(Permission::ViewPpdb)?;
    Ok(Json(registration::status_counts(&state.db, query.period_id).await?))
}

async fn export_csv(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Query(filter): Query<RegistrationFilter>,
) -> Result<impl IntoResponse> {
    current.require(Permission::ManagePpdb)?;
    let rows = registration::list_registrations(&state.db, filter).await?;
    let body = export::registrations_csv(&rows, state.timezone()?);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::export_filename(state.today()?)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

async fn get_registration(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<registration_entity::Model>> {
    current.require(Permission::ViewPpdb)?;
    Ok(Json(registration::get_registration(&state.db, id).await?))
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: RegistrationStatus,
    #[serde(default)]
    notes: Option<String>,
}

async fn update_status(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(body): Json<StatusChange>,
) -> Result<Json<registration_entity::Model>> {
    current.require(Permission::ManagePpdb)?;
    Ok(Json(
        registration::update_status(&state.db, id, body.status, body.notes).await?,
    ))
}

async fn delete_registration(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    current.require(Permission::ManagePpdb)?;
    registration::delete_registration(&state.db, &state.storage, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_document(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path((id, kind)): Path<(i64, String)>,
) -> Result<impl IntoResponse> {
    current.require(Permission::ManagePpdb)?;
    let kind = DocumentKind::parse(&kind).ok_or_else(|| Error::NotFound {
        entity: "document kind",
        key: kind.clone(),
    })?;
    let (path, bytes) = registration::read_document(&state.db, &state.storage, id, kind).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], bytes))
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/ppdb/periods", get(list_periods).post(create_period))
        .route("/ppdb/periods/form", get(period_form))
        .route(
            "/ppdb/periods/{id}",
            get(get_period).put(update_period).delete(delete_period),
        )
        .route("/ppdb/periods/{id}/active", put(activate_period))
        .route("/ppdb/registrations", get(list_registrations))
        .route("/ppdb/registrations/counts", get(registration_counts))
        .route("/ppdb/registrations/export.csv", get(export_csv))
        .route(
            "/ppdb/registrations/{id}",
            get(get_registration).delete(delete_registration),
        )
        .route("/ppdb/registrations/{id}/status", post(update_status))
        .route(
            "/ppdb/registrations/{id}/documents/{kind}",
            get(download_document),
        )
}
