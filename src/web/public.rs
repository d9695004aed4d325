//! Read-only site API and the admission form submission.

use super::{AppState, upload::FilePayload};
use crate::{
    core::{
        admission::{self, AdmissionStatus},
        contact,
        form::FieldSpec,
        gallery, news, profile,
        registration::{self, AdmissionDocuments, DocumentKind, RegistrationForm},
        skill,
    },
    entities::{
        GalleryCategory, RegistrationStatus, contact as contact_entity, gallery as gallery_entity,
        news as news_entity, school_profile, skill as skill_entity,
    },
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CategoryQuery {
    category: Option<GalleryCategory>,
}

async fn get_profile(State(state): State<AppState>) -> Result<Json<Option<school_profile::Model>>> {
    Ok(Json(profile::get_profile(&state.db).await?))
}

async fn list_skills(State(state): State<AppState>) -> Result<Json<Vec<skill_entity::Model>>> {
    Ok(Json(skill::list_active_skills(&state.db).await?))
}

async fn get_skill(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<skill_entity::Model>> {
    let skill = skill::get_skill(&state.db, id).await?;
    if !skill.is_active {
        return Err(Error::not_found("skill", id));
    }
    Ok(Json(skill))
}

async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<news_entity::Model>>> {
    Ok(Json(news::list_published(&state.db, query.limit).await?))
}

async fn featured_news(State(state): State<AppState>) -> Result<Json<Vec<news_entity::Model>>> {
    Ok(Json(news::list_featured(&state.db).await?))
}

async fn news_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<news_entity::Model>> {
    Ok(Json(news::get_published_by_slug(&state.db, &slug).await?))
}

async fn list_gallery(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<gallery_entity::Model>>> {
    Ok(Json(gallery::list_gallery(&state.db, query.category).await?))
}

async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<contact_entity::Model>>> {
    Ok(Json(contact::list_contacts(&state.db).await?))
}

/// Everything the public admission page needs
#[derive(Debug, Serialize)]
struct AdmissionPage {
    #[serde(flatten)]
    status: AdmissionStatus,
    skills: Vec<skill_entity::Model>,
    form: Vec<FieldSpec>,
}

async fn admission_page(State(state): State<AppState>) -> Result<Json<AdmissionPage>> {
    let status = admission::admission_status(&state.db, state.today()?).await?;
    Ok(Json(AdmissionPage {
        status,
        skills: skill::list_active_skills(&state.db).await?,
        form: registration::admission_form_fields(),
    }))
}

/// Admission form values plus the four documents keyed `ktp`, `kk`, `ijazah`, `foto`
#[derive(Debug, Deserialize)]
struct RegistrationRequest {
    form: Map<String, Value>,
    #[serde(default)]
    documents: HashMap<String, FilePayload>,
}

#[derive(Debug, Serialize)]
struct RegistrationReceipt {
    id: i64,
    registration_number: String,
    status: RegistrationStatus,
}

async fn submit_registration(
    State(state): State<AppState>,
    Json(body): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationReceipt>)> {
    let form = RegistrationForm::from_values(&body.form)?;

    let mut documents = AdmissionDocuments::new();
    for (name, payload) in body.documents {
        let Some(kind) = DocumentKind::parse(&name) else {
            return Err(Error::field(&name, "Jenis dokumen tidak dikenal"));
        };
        documents.insert(kind, payload.decode(kind.as_str())?);
    }

    let created = registration::submit_registration(
        &state.db,
        &state.storage,
        form,
        &documents,
        Utc::now(),
        state.timezone()?,
    )
    .await?;
    info!("Accepted registration {}", created.registration_number);

    Ok((
        StatusCode::CREATED,
        Json(RegistrationReceipt {
            id: created.id,
            registration_number: created.registration_number,
            status: created.status,
        }),
    ))
}

/// Public routes, mounted under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/skills", get(list_skills))
        .route("/skills/{id}", get(get_skill))
        .route("/news", get(list_news))
        .route("/news/featured", get(featured_news))
        .route("/news/{slug}", get(news_by_slug))
        .route("/gallery", get(list_gallery))
        .route("/contacts", get(list_contacts))
        .route("/ppdb", get(admission_page))
        .route("/ppdb/registrations", post(submit_registration))
}
