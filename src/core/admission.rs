//! Admission (PPDB) periods and the registration window.
//!
//! At most one period is active. Activation deactivates every other period
//! inside the same database transaction.

use crate::{
    core::form::{self, FieldKind, FieldSpec},
    core::validation::FieldCheck,
    entities::{AdmissionPeriod, Registration, StringList, admission_period, registration},
    errors::{Error, Result},
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

/// Where "today" falls relative to a period's registration dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AdmissionWindow {
    /// Registration has not started; opens on `opens_on`
    NotYetOpen {
        /// First registration day
        opens_on: NaiveDate,
    },
    /// Registration is accepted today
    Open,
    /// Registration ended on `closed_on`
    Closed {
        /// Last registration day
        closed_on: NaiveDate,
    },
}

impl AdmissionWindow {
    /// True only for [`AdmissionWindow::Open`]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Message shown on the public admission page
    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::NotYetOpen { opens_on } => {
                format!("Pendaftaran akan dibuka pada {}", opens_on.format("%d/%m/%Y"))
            }
            Self::Open => "Pendaftaran sedang dibuka".to_string(),
            Self::Closed { closed_on } => {
                format!("Pendaftaran telah ditutup pada {}", closed_on.format("%d/%m/%Y"))
            }
        }
    }
}

/// Classifies `today` against an inclusive `[start, end]` day range.
///
/// Comparing calendar days is the same as normalising `today` and `start` to
/// midnight and `end` to the last instant of its day.
#[must_use]
pub fn classify_window(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> AdmissionWindow {
    if today < start {
        AdmissionWindow::NotYetOpen { opens_on: start }
    } else if today > end {
        AdmissionWindow::Closed { closed_on: end }
    } else {
        AdmissionWindow::Open
    }
}

/// The calendar day of `now` in the school's timezone.
#[must_use]
pub fn local_today(now: DateTime<Utc>, timezone: FixedOffset) -> NaiveDate {
    now.with_timezone(&timezone).date_naive()
}

/// Public view of the admission state.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionStatus {
    /// The active period, if any
    pub period: Option<admission_period::Model>,
    /// Window classification of the active period
    pub window: Option<AdmissionWindow>,
    /// Convenience flag for clients
    pub is_open: bool,
    /// Message for display
    pub message: String,
}

/// Looks up the active period and classifies `today` against it.
pub async fn admission_status(db: &DatabaseConnection, today: NaiveDate) -> Result<AdmissionStatus> {
    let period = get_active_period(db).await?;
    Ok(match period {
        None => AdmissionStatus {
            period: None,
            window: None,
            is_open: false,
            message: "Tidak ada periode aktif".to_string(),
        },
        Some(period) => {
            let window =
                classify_window(period.registration_start, period.registration_end, today);
            AdmissionStatus {
                period: Some(period),
                window: Some(window),
                is_open: window.is_open(),
                message: window.message(),
            }
        }
    })
}

/// Values accepted when creating or editing a period.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodInput {
    /// e.g. "2025/2026"
    pub academic_year: String,
    /// First registration day
    pub registration_start: NaiveDate,
    /// Last registration day, inclusive
    pub registration_end: NaiveDate,
    /// Announcement day
    #[serde(default)]
    pub announcement_date: Option<NaiveDate>,
    /// Quota
    pub max_students: i32,
    /// Fee in rupiah
    #[serde(default)]
    pub registration_fee: i64,
    /// General requirements
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Documents to upload
    #[serde(default)]
    pub documents_needed: Vec<String>,
    /// Selection steps
    #[serde(default)]
    pub selection_process: Vec<String>,
}

/// Form schema for the period editor.
#[must_use]
pub fn period_form_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("academic_year", "Tahun Ajaran", FieldKind::Text).required(),
        FieldSpec::new("registration_start", "Tanggal Mulai Pendaftaran", FieldKind::Date)
            .required(),
        FieldSpec::new("registration_end", "Tanggal Akhir Pendaftaran", FieldKind::Date)
            .required(),
        FieldSpec::new("announcement_date", "Tanggal Pengumuman", FieldKind::Date),
        FieldSpec::new("max_students", "Kuota Siswa", FieldKind::Number)
            .required()
            .min(0.0),
        FieldSpec::new("registration_fee", "Biaya Pendaftaran", FieldKind::Number).min(0.0),
        FieldSpec::new("requirements", "Persyaratan", FieldKind::List),
        FieldSpec::new("documents_needed", "Dokumen yang Diperlukan", FieldKind::List),
        FieldSpec::new("selection_process", "Proses Seleksi", FieldKind::List),
    ]
}

impl PeriodInput {
    /// Validates raw form values against [`period_form_fields`] and converts them.
    ///
    /// Numbers may arrive as JSON numbers or numeric strings, as browsers send them.
    pub fn from_values(values: &Map<String, Value>) -> Result<Self> {
        let mut check = FieldCheck::new();
        check.extend(form::validate(&period_form_fields(), values));
        check.finish()?;

        let input: Self = serde_json::from_value(Value::Object(form::normalize(
            &period_form_fields(),
            values,
        )))
        .map_err(|e| Error::field("form", e.to_string()))?;
        input.validate()?;
        Ok(input)
    }

    fn validate(&self) -> Result<()> {
        let mut check = FieldCheck::new();
        check.required("academic_year", &self.academic_year);
        if self.registration_end < self.registration_start {
            check.fail(
                "registration_end",
                "Tanggal akhir harus setelah tanggal mulai",
            );
        }
        if self.max_students < 0 {
            check.fail("max_students", "Minimal 0");
        }
        if self.registration_fee < 0 {
            check.fail("registration_fee", "Minimal 0");
        }
        check.finish()
    }
}

/// All periods, newest first.
pub async fn list_periods(db: &DatabaseConnection) -> Result<Vec<admission_period::Model>> {
    AdmissionPeriod::find()
        .order_by_desc(admission_period::Column::CreatedAt)
        .order_by_desc(admission_period::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The active period, if any.
pub async fn get_active_period(
    db: &DatabaseConnection,
) -> Result<Option<admission_period::Model>> {
    AdmissionPeriod::find()
        .filter(admission_period::Column::IsActive.eq(true))
        .order_by_desc(admission_period::Column::UpdatedAt)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a period by id.
pub async fn get_period(db: &DatabaseConnection, id: i64) -> Result<admission_period::Model> {
    AdmissionPeriod::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("admission period", id))
}

/// Creates an inactive period.
#[instrument(skip(db, input), fields(academic_year = %input.academic_year))]
pub async fn create_period(
    db: &DatabaseConnection,
    input: PeriodInput,
) -> Result<admission_period::Model> {
    input.validate()?;
    let now = Utc::now();
    let model = admission_period::ActiveModel {
        academic_year: Set(input.academic_year.trim().to_string()),
        registration_start: Set(input.registration_start),
        registration_end: Set(input.registration_end),
        announcement_date: Set(input.announcement_date),
        max_students: Set(input.max_students),
        registration_fee: Set(input.registration_fee),
        requirements: Set(StringList::cleaned(input.requirements)),
        documents_needed: Set(StringList::cleaned(input.documents_needed)),
        selection_process: Set(StringList::cleaned(input.selection_process)),
        is_active: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let period = model.insert(db).await?;
    info!("Created admission period {}", period.id);
    Ok(period)
}

/// Replaces the editable fields of a period; `is_active` is untouched.
#[instrument(skip(db, input))]
pub async fn update_period(
    db: &DatabaseConnection,
    id: i64,
    input: PeriodInput,
) -> Result<admission_period::Model> {
    input.validate()?;
    let mut model: admission_period::ActiveModel = get_period(db, id).await?.into();
    model.academic_year = Set(input.academic_year.trim().to_string());
    model.registration_start = Set(input.registration_start);
    model.registration_end = Set(input.registration_end);
    model.announcement_date = Set(input.announcement_date);
    model.max_students = Set(input.max_students);
    model.registration_fee = Set(input.registration_fee);
    model.requirements = Set(StringList::cleaned(input.requirements));
    model.documents_needed = Set(StringList::cleaned(input.documents_needed));
    model.selection_process = Set(StringList::cleaned(input.selection_process));
    model.updated_at = Set(Utc::now());
    model.update(db).await.map_err(Into::into)
}

/// Deletes a period that has no registrations.
#[instrument(skip(db))]
pub async fn delete_period(db: &DatabaseConnection, id: i64) -> Result<()> {
    let period = get_period(db, id).await?;
    let registrations = Registration::find()
        .filter(registration::Column::PeriodId.eq(id))
        .count(db)
        .await?;
    if registrations > 0 {
        return Err(Error::Conflict {
            message: format!(
                "period {} still has {registrations} registrations",
                period.academic_year
            ),
        });
    }
    period.delete(db).await?;
    info!("Deleted admission period {id}");
    Ok(())
}

/// Sets or clears the active flag of a period.
///
/// Activating clears the flag on every other period first; both writes commit
/// together, so sequential calls always leave at most one active period.
#[instrument(skip(db))]
pub async fn set_period_active(
    db: &DatabaseConnection,
    id: i64,
    active: bool,
) -> Result<admission_period::Model> {
    let txn = db.begin().await?;

    let period = AdmissionPeriod::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("admission period", id))?;

    let now = Utc::now();
    if active {
        AdmissionPeriod::update_many()
            .col_expr(admission_period::Column::IsActive, Expr::value(false))
            .col_expr(admission_period::Column::UpdatedAt, Expr::value(now))
            .filter(admission_period::Column::Id.ne(id))
            .filter(admission_period::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;
    }

    let mut model: admission_period::ActiveModel = period.into();
    model.is_active = Set(active);
    model.updated_at = Set(now);
    let updated = model.update(&txn).await?;

    txn.commit().await?;
    info!("Admission period {id} active = {active}");
    Ok(updated)
}
