//! Back-office dashboard figures.

use crate::{
    core::registration::{RegistrationRow, recent_registrations},
    entities::{Gallery, News, Registration, RegistrationStatus, Skill, registration, skill},
    errors::Result,
};
use sea_orm::{PaginatorTrait, prelude::*};
use serde::Serialize;

/// Headline counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// All registrations
    pub total_registrations: u64,
    /// Registrations awaiting review
    pub pending_registrations: u64,
    /// Admitted applicants
    pub accepted_registrations: u64,
    /// News items, published or not
    pub total_news: u64,
    /// Programs currently offered
    pub active_skills: u64,
    /// Gallery items
    pub gallery_items: u64,
}

/// Counts plus the latest registrations
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Headline counts
    pub stats: DashboardStats,
    /// Newest registrations
    pub recent_registrations: Vec<RegistrationRow>,
}

/// Computes the headline counts with count-only queries.
pub async fn dashboard_stats(db: &DatabaseConnection) -> Result<DashboardStats> {
    let by_status = |status: RegistrationStatus| {
        Registration::find()
            .filter(registration::Column::Status.eq(status))
            .count(db)
    };

    Ok(DashboardStats {
        total_registrations: Registration::find().count(db).await?,
        pending_registrations: by_status(RegistrationStatus::Pending).await?,
        accepted_registrations: by_status(RegistrationStatus::Accepted).await?,
        total_news: News::find().count(db).await?,
        active_skills: Skill::find()
            .filter(skill::Column::IsActive.eq(true))
            .count(db)
            .await?,
        gallery_items: Gallery::find().count(db).await?,
    })
}

/// Stats and the `recent` newest registrations (default 5).
pub async fn dashboard(db: &DatabaseConnection, recent: Option<u64>) -> Result<Dashboard> {
    Ok(Dashboard {
        stats: dashboard_stats(db).await?,
        recent_registrations: recent_registrations(db, recent).await?,
    })
}
