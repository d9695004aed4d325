//! Profile, programs, news, gallery, and contacts.

use super::super::{AppState, auth::CurrentAdmin};
use crate::{
    core::{
        auth::Permission,
        contact::{self, ContactInput},
        gallery::{self, GalleryInput},
        news::{self, NewsInput},
        profile::{self, ProfileImage, ProfileInput},
        skill::{self, SkillInput},
        table::{Page, TableQuery},
    },
    entities::{
        GalleryCategory, contact as contact_entity, gallery as gallery_entity, news as news_entity,
        school_profile, skill as skill_entity,
    },
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;

// Profile

async fn get_profile(
    State(state): State<AppState>,
    current: CurrentAdmin,
) -> Result<Json<Option<school_profile::Model>>> {
    current.require(Permission::ManageProfile)?;
    Ok(Json(profile::get_profile(&state.db).await?))
}

async fn save_profile(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(input): Json<ProfileInput>,
) -> Result<Json<school_profile::Model>> {
    current.require(Permission::ManageProfile)?;
    Ok(Json(profile::upsert_profile(&state.db, input).await?))
}

#[derive(Debug, Deserialize)]
struct ImageUrl {
    url: String,
}

async fn set_profile_image(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(kind): Path<ProfileImage>,
    Json(body): Json<ImageUrl>,
) -> Result<Json<school_profile::Model>> {
    current.require(Permission::ManageProfile)?;
    Ok(Json(profile::set_profile_image(&state.db, kind, body.url).await?))
}

// Programs

async fn list_skills(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Query(query): Query<TableQuery>,
) -> Result<Json<Page<skill_entity::Model>>> {
    current.require(Permission::ManageSkills)?;
    Ok(Json(query.apply(skill::list_all_skills(&state.db).await?)))
}

async fn create_skill(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(input): Json<SkillInput>,
) -> Result<(StatusCode, Json<skill_entity::Model>)> {
    current.require(Permission::ManageSkills)?;
    let created = skill::create_skill(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_skill(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<skill_entity::Model>> {
    current.require(Permission::ManageSkills)?;
    Ok(Json(skill::get_skill(&state.db, id).await?))
}

async fn update_skill(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(input): Json<SkillInput>,
) -> Result<Json<skill_entity::Model>> {
    current.require(Permission::ManageSkills)?;
    Ok(Json(skill::update_skill(&state.db, id, input).await?))
}

async fn delete_skill(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    current.require(Permission::ManageSkills)?;
    skill::delete_skill(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_skill(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<skill_entity::Model>> {
    current.require(Permission::ManageSkills)?;
    Ok(Json(skill::toggle_skill_active(&state.db, id).await?))
}

// News

async fn list_news(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Query(query): Query<TableQuery>,
) -> Result<Json<Page<news_entity::Model>>> {
    current.require(Permission::ManageNews)?;
    Ok(Json(query.apply(news::list_all_news(&state.db).await?)))
}

/// Editors may write drafts; publishing takes `PublishNews`.
fn check_publish(current: &CurrentAdmin, input: &NewsInput) -> Result<()> {
    if input.is_published {
        current.require(Permission::PublishNews)?;
    }
    Ok(())
}

async fn create_news(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(input): Json<NewsInput>,
) -> Result<(StatusCode, Json<news_entity::Model>)> {
    current.require(Permission::ManageNews)?;
    check_publish(&current, &input)?;
    let created = news::create_news(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_news(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<news_entity::Model>> {
    current.require(Permission::ManageNews)?;
    Ok(Json(news::get_news(&state.db, id).await?))
}

async fn update_news(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(input): Json<NewsInput>,
) -> Result<Json<news_entity::Model>> {
    current.require(Permission::ManageNews)?;
    let existing = news::get_news(&state.db, id).await?;
    if input.is_published != existing.is_published {
        current.require(Permission::PublishNews)?;
    }
    Ok(Json(news::update_news(&state.db, id, input).await?))
}

async fn delete_news(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    current.require(Permission::ManageNews)?;
    news::delete_news(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_news_published(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<news_entity::Model>> {
    current.require(Permission::PublishNews)?;
    Ok(Json(news::toggle_published(&state.db, id).await?))
}

async fn toggle_news_featured(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<news_entity::Model>> {
    current.require(Permission::ManageNews)?;
    Ok(Json(news::toggle_featured(&state.db, id).await?))
}

// Gallery

#[derive(Debug, Deserialize)]
struct CategoryFilter {
    category: Option<GalleryCategory>,
}

async fn list_gallery(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Query(filter): Query<CategoryFilter>,
    Query(table): Query<TableQuery>,
) -> Result<Json<Page<gallery_entity::Model>>> {
    current.require(Permission::ManageGallery)?;
    let items = gallery::list_gallery(&state.db, filter.category).await?;
    Ok(Json(table.apply(items)))
}

async fn create_gallery_item(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(input): Json<GalleryInput>,
) -> Result<(StatusCode, Json<gallery_entity::Model>)> {
    current.require(Permission::ManageGallery)?;
    let created = gallery::create_gallery_item(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_gallery_item(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<gallery_entity::Model>> {
    current.require(Permission::ManageGallery)?;
    Ok(Json(gallery::get_gallery_item(&state.db, id).await?))
}

async fn update_gallery_item(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(input): Json<GalleryInput>,
) -> Result<Json<gallery_entity::Model>> {
    current.require(Permission::ManageGallery)?;
    Ok(Json(gallery::update_gallery_item(&state.db, id, input).await?))
}

async fn delete_gallery_item(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    current.require(Permission::ManageGallery)?;
    gallery::delete_gallery_item(&state.db, &state.storage, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_gallery_featured(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<gallery_entity::Model>> {
    current.require(Permission::ManageGallery)?;
    Ok(Json(gallery::toggle_gallery_featured(&state.db, id).await?))
}

// Contacts

async fn list_contacts(
    State(state): State<AppState>,
    current: CurrentAdmin,
) -> Result<Json<Vec<contact_entity::Model>>> {
    current.require(Permission::ManageContacts)?;
    Ok(Json(contact::list_contacts(&state.db).await?))
}

async fn create_contact(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(input): Json<ContactInput>,
) -> Result<(StatusCode, Json<contact_entity::Model>)> {
    current.require(Permission::ManageContacts)?;
    let created = contact::create_contact(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_contact(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(input): Json<ContactInput>,
) -> Result<Json<contact_entity::Model>> {
    current.require(Permission::ManageContacts)?;
    Ok(Json(contact::update_contact(&state.db, id, input).await?))
}

async fn delete_contact(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    current.require(Permission::ManageContacts)?;
    contact::delete_contact(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct PrimaryFlag {
    is_primary: bool,
}

async fn set_contact_primary(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(body): Json<PrimaryFlag>,
) -> Result<Json<contact_entity::Model>> {
    current.require(Permission::ManageContacts)?;
    Ok(Json(contact::set_primary(&state.db, id, body.is_primary).await?))
}

#[derive(Debug, Deserialize)]
struct ContactOrder {
    ids: Vec<i64>,
}

async fn reorder_contacts(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(body): Json<ContactOrder>,
) -> Result<Json<Vec<contact_entity::Model>>> {
    current.require(Permission::ManageContacts)?;
    Ok(Json(contact::reorder(&state.db, &body.ids).await?))
}

#[derive(Debug, Deserialize)]
struct MoveTarget {
    target_id: i64,
}

async fn move_contact(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Path(id): Path<i64>,
    Json(body): Json<MoveTarget>,
) -> Result<Json<Vec<contact_entity::Model>>> {
    current.require(Permission::ManageContacts)?;
    Ok(Json(contact::move_contact(&state.db, id, body.target_id).await?))
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(save_profile))
        .route("/profile/images/{kind}", put(set_profile_image))
        .route("/skills", get(list_skills).post(create_skill))
        .route(
            "/skills/{id}",
            get(get_skill).put(update_skill).delete(delete_skill),
        )
        .route("/skills/{id}/toggle-active", post(toggle_skill))
        .route("/news", get(list_news).post(create_news))
        .route(
            "/news/{id}",
            get(get_news).put(update_news).delete(delete_news),
        )
        .route("/news/{id}/toggle-published", post(toggle_news_published))
        .route("/news/{id}/toggle-featured", post(toggle_news_featured))
        .route("/gallery", get(list_gallery).post(create_gallery_item))
        .route(
            "/gallery/{id}",
            get(get_gallery_item)
                .put(update_gallery_item)
                .delete(delete_gallery_item),
        )
        .route("/gallery/{id}/toggle-featured", post(toggle_gallery_featured))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/order", put(reorder_contacts))
        .route("/contacts/{id}", put(update_contact).delete(delete_contact))
        .route("/contacts/{id}/primary", put(set_contact_primary))
        .route("/contacts/{id}/move", post(move_contact))
}
