//! Admission registration workflow.
//!
//! A submission is accepted only while the active period's window is open.
//! Documents are stored first, under the registration number, and removed
//! again if anything after the first upload fails.

use crate::{
    core::{
        admission::{classify_window, get_active_period, local_today},
        form::{self, FieldKind, FieldSpec},
        validation::{FieldCheck, UploadKind, check_upload, extension_for},
    },
    entities::{
        AdmissionPeriod, Gender, Registration, RegistrationDocuments, RegistrationStatus, Skill,
        admission_period, registration, skill,
    },
    errors::{Error, Result},
    storage::{Bucket, ObjectStorage},
};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use sea_orm::{
    PaginatorTrait, QueryOrder, QuerySelect, Select, Set, SqlErr, prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Message for a missing document
pub const MSG_DOCUMENT_REQUIRED: &str = "Dokumen ini wajib diunggah";
/// Recent registrations shown when no count is given
pub const DEFAULT_RECENT_LIMIT: u64 = 5;
/// Random suffixes tried before giving up on a free registration number
const MAX_NUMBER_ATTEMPTS: usize = 20;

/// The four documents every applicant uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Identity card
    Ktp,
    /// Family card
    Kk,
    /// Diploma
    Ijazah,
    /// Passport photo
    Foto,
}

impl DocumentKind {
    /// Upload order
    pub const ALL: [Self; 4] = [Self::Ktp, Self::Kk, Self::Ijazah, Self::Foto];

    /// Form key and file name prefix
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ktp => "ktp",
            Self::Kk => "kk",
            Self::Ijazah => "ijazah",
            Self::Foto => "foto",
        }
    }

    /// Parses a form key
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Size and type limits for this document
    #[must_use]
    pub const fn upload_kind(self) -> UploadKind {
        match self {
            Self::Foto => UploadKind::AdmissionPhoto,
            _ => UploadKind::AdmissionDocument,
        }
    }

    /// Stored path of this document on a registration
    #[must_use]
    pub fn stored_path(self, documents: &RegistrationDocuments) -> Option<&str> {
        match self {
            Self::Ktp => documents.ktp_url.as_deref(),
            Self::Kk => documents.kk_url.as_deref(),
            Self::Ijazah => documents.ijazah_url.as_deref(),
            Self::Foto => documents.foto_url.as_deref(),
        }
    }

    fn record(self, documents: &mut RegistrationDocuments, path: String) {
        let slot = match self {
            Self::Ktp => &mut documents.ktp_url,
            Self::Kk => &mut documents.kk_url,
            Self::Ijazah => &mut documents.ijazah_url,
            Self::Foto => &mut documents.foto_url,
        };
        *slot = Some(path);
    }
}

/// One uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Original file name
    pub file_name: String,
    /// MIME type reported by the client
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Extension for the stored object, derived from the checked MIME type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        extension_for(&self.content_type).unwrap_or("bin")
    }
}

/// The documents attached to a submission, keyed by kind
#[derive(Debug, Clone, Default)]
pub struct AdmissionDocuments {
    files: HashMap<DocumentKind, DocumentUpload>,
}

impl AdmissionDocuments {
    /// No documents
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches (or replaces) one document
    pub fn insert(&mut self, kind: DocumentKind, upload: DocumentUpload) -> &mut Self {
        self.files.insert(kind, upload);
        self
    }

    /// The document of `kind`, if attached
    #[must_use]
    pub fn get(&self, kind: DocumentKind) -> Option<&DocumentUpload> {
        self.files.get(&kind)
    }

    fn validate(&self, check: &mut FieldCheck) {
        for kind in DocumentKind::ALL {
            match self.get(kind) {
                None => {
                    check.fail(kind.as_str(), MSG_DOCUMENT_REQUIRED);
                }
                Some(upload) => {
                    if let Err(message) =
                        check_upload(kind.upload_kind(), upload.bytes.len(), &upload.content_type)
                    {
                        check.fail(kind.as_str(), message);
                    }
                }
            }
        }
    }
}

/// Applicant data from the public admission form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    /// Applicant's full name
    pub student_name: String,
    /// Applicant's email
    pub student_email: String,
    /// Applicant's phone
    pub student_phone: String,
    /// Parent or guardian name
    pub parent_name: String,
    /// Parent phone
    pub parent_phone: String,
    /// Parent email
    #[serde(default)]
    pub parent_email: Option<String>,
    /// Date of birth
    pub birth_date: NaiveDate,
    /// Place of birth
    pub birth_place: String,
    /// L or P
    pub gender: Gender,
    /// Home address
    pub address: String,
    /// School of origin
    pub previous_school: String,
    /// Chosen program
    pub chosen_skill_id: i64,
}

/// Form schema of the public admission form.
#[must_use]
pub fn admission_form_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("student_name", "Nama Lengkap", FieldKind::Text).required(),
        FieldSpec::new("student_email", "Email Siswa", FieldKind::Email).required(),
        FieldSpec::new("student_phone", "Telepon Siswa", FieldKind::Phone).required(),
        FieldSpec::new("birth_date", "Tanggal Lahir", FieldKind::Date).required(),
        FieldSpec::new("birth_place", "Tempat Lahir", FieldKind::Text).required(),
        FieldSpec::new("gender", "Jenis Kelamin", FieldKind::Select)
            .required()
            .options(&["L", "P"]),
        FieldSpec::new("address", "Alamat", FieldKind::Textarea).required(),
        FieldSpec::new("previous_school", "Sekolah Asal", FieldKind::Text).required(),
        FieldSpec::new("parent_name", "Nama Orang Tua/Wali", FieldKind::Text).required(),
        FieldSpec::new("parent_phone", "Telepon Orang Tua", FieldKind::Phone).required(),
        FieldSpec::new("parent_email", "Email Orang Tua", FieldKind::Email),
        FieldSpec::new("chosen_skill_id", "Kompetensi Keahlian", FieldKind::Number)
            .required()
            .min(1.0),
    ]
}

impl RegistrationForm {
    /// Validates raw form values against [`admission_form_fields`] and converts them.
    pub fn from_values(values: &Map<String, Value>) -> Result<Self> {
        let fields = admission_form_fields();
        let mut check = FieldCheck::new();
        check.extend(form::validate(&fields, values));
        check.finish()?;

        serde_json::from_value(Value::Object(form::normalize(&fields, values)))
            .map_err(|e| Error::field("form", e.to_string()))
    }

    fn check(&self, check: &mut FieldCheck) {
        check
            .required("student_name", &self.student_name)
            .required("student_email", &self.student_email)
            .required("student_phone", &self.student_phone)
            .required("parent_name", &self.parent_name)
            .required("parent_phone", &self.parent_phone)
            .required("birth_place", &self.birth_place)
            .required("address", &self.address)
            .required("previous_school", &self.previous_school)
            .email("student_email", Some(&self.student_email))
            .email("parent_email", self.parent_email.as_deref())
            .phone("student_phone", Some(&self.student_phone))
            .phone("parent_phone", Some(&self.parent_phone));
    }
}

/// `PPDB{YYYY}{MM}{NNNN}` for the given day and a suffix below 10000.
#[must_use]
pub fn generate_registration_number(date: NaiveDate, suffix: u16) -> String {
    format!(
        "PPDB{:04}{:02}{:04}",
        date.year(),
        date.month(),
        suffix % 10_000
    )
}

/// A registration number for `date` that no row uses yet.
pub async fn unique_registration_number<C>(db: &C, date: NaiveDate) -> Result<String>
where
    C: ConnectionTrait,
{
    for _ in 0..MAX_NUMBER_ATTEMPTS {
        let suffix = u16::try_from(Uuid::new_v4().as_u128() % 10_000).unwrap_or_default();
        let candidate = generate_registration_number(date, suffix);
        let taken = Registration::find()
            .filter(registration::Column::RegistrationNumber.eq(candidate.as_str()))
            .count(db)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    Err(Error::Conflict {
        message: "no free registration number this month, retry".to_string(),
    })
}

/// Uploads every document under `{number}/{kind}_{millis}.{ext}`.
///
/// On failure the documents stored so far are removed before the error is returned.
pub async fn store_documents(
    storage: &ObjectStorage,
    number: &str,
    documents: &AdmissionDocuments,
    millis: i64,
) -> Result<RegistrationDocuments> {
    let mut stored = RegistrationDocuments::default();
    let mut paths = Vec::new();

    for kind in DocumentKind::ALL {
        let Some(upload) = documents.get(kind) else {
            continue;
        };
        let path = format!("{number}/{}_{millis}.{}", kind.as_str(), upload.extension());
        match storage.upload(Bucket::PpdbDocuments, &path, &upload.bytes).await {
            Ok(_) => {
                paths.push(path.clone());
                kind.record(&mut stored, path);
            }
            Err(e) => {
                warn!("Upload of {path} failed, removing {} stored documents", paths.len());
                remove_documents(storage, &paths).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

async fn remove_documents(storage: &ObjectStorage, paths: &[String]) {
    for path in paths {
        if let Err(e) = storage.remove(Bucket::PpdbDocuments, path).await {
            warn!("Could not remove document {path}: {e}");
        }
    }
}

fn stored_paths(documents: &RegistrationDocuments) -> Vec<String> {
    DocumentKind::ALL
        .into_iter()
        .filter_map(|kind| kind.stored_path(documents).map(str::to_string))
        .collect()
}

/// Accepts a public admission submission.
///
/// Checks, in order: an active period whose window contains today (school
/// time), the form and documents, and that the chosen program is active.
/// The new registration is `pending`.
#[instrument(skip_all, fields(student = %form.student_name))]
pub async fn submit_registration(
    db: &DatabaseConnection,
    storage: &ObjectStorage,
    form: RegistrationForm,
    documents: &AdmissionDocuments,
    now: DateTime<Utc>,
    timezone: FixedOffset,
) -> Result<registration::Model> {
    let today = local_today(now, timezone);
    let period = get_active_period(db)
        .await?
        .ok_or_else(|| Error::RegistrationClosed {
            message: "Tidak ada periode pendaftaran aktif".to_string(),
        })?;
    let window = classify_window(period.registration_start, period.registration_end, today);
    if !window.is_open() {
        return Err(Error::RegistrationClosed {
            message: window.message(),
        });
    }

    let mut check = FieldCheck::new();
    form.check(&mut check);
    documents.validate(&mut check);
    let skill = Skill::find_by_id(form.chosen_skill_id).one(db).await?;
    if !skill.is_some_and(|s| s.is_active) {
        check.fail("chosen_skill_id", "Kompetensi keahlian tidak tersedia");
    }
    check.finish()?;

    let number = unique_registration_number(db, today).await?;
    let stored = store_documents(storage, &number, documents, now.timestamp_millis()).await?;
    let paths = stored_paths(&stored);

    let model = registration::ActiveModel {
        period_id: Set(period.id),
        registration_number: Set(number.clone()),
        student_name: Set(form.student_name.trim().to_string()),
        student_email: Set(form.student_email.trim().to_string()),
        student_phone: Set(form.student_phone.trim().to_string()),
        parent_name: Set(form.parent_name.trim().to_string()),
        parent_phone: Set(form.parent_phone.trim().to_string()),
        parent_email: Set(form
            .parent_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())),
        birth_date: Set(form.birth_date),
        birth_place: Set(form.birth_place.trim().to_string()),
        gender: Set(form.gender),
        address: Set(form.address.trim().to_string()),
        previous_school: Set(form.previous_school.trim().to_string()),
        chosen_skill_id: Set(form.chosen_skill_id),
        documents: Set(stored),
        status: Set(RegistrationStatus::Pending),
        notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(created) => {
            info!("Registration {number} submitted for period {}", period.id);
            Ok(created)
        }
        Err(e) => {
            remove_documents(storage, &paths).await;
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(Error::Conflict {
                    message: format!("registration number {number} was taken, retry"),
                });
            }
            Err(e.into())
        }
    }
}

/// A registration joined with its program name and period year.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRow {
    /// The registration itself
    #[serde(flatten)]
    pub registration: registration::Model,
    /// Name of the chosen program
    pub skill_name: Option<String>,
    /// Academic year of the period
    pub academic_year: Option<String>,
}

/// Admin list filter
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RegistrationFilter {
    /// Only this period
    #[serde(default)]
    pub period_id: Option<i64>,
    /// Only this status
    #[serde(default)]
    pub status: Option<RegistrationStatus>,
}

async fn load_rows(
    db: &DatabaseConnection,
    query: Select<Registration>,
) -> Result<Vec<RegistrationRow>> {
    let pairs: Vec<(registration::Model, Option<skill::Model>)> =
        query.find_also_related(Skill).all(db).await?;

    let mut period_ids: Vec<i64> = pairs.iter().map(|(r, _)| r.period_id).collect();
    period_ids.sort_unstable();
    period_ids.dedup();
    let years: HashMap<i64, String> = AdmissionPeriod::find()
        .filter(admission_period::Column::Id.is_in(period_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.academic_year))
        .collect();

    Ok(pairs
        .into_iter()
        .map(|(registration, skill)| RegistrationRow {
            academic_year: years.get(&registration.period_id).cloned(),
            skill_name: skill.map(|s| s.name),
            registration,
        })
        .collect())
}

fn filtered(filter: RegistrationFilter) -> Select<Registration> {
    let mut query = Registration::find();
    if let Some(period_id) = filter.period_id {
        query = query.filter(registration::Column::PeriodId.eq(period_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(registration::Column::Status.eq(status));
    }
    query
        .order_by_desc(registration::Column::CreatedAt)
        .order_by_desc(registration::Column::Id)
}

/// Registrations newest first, with program name and period year.
pub async fn list_registrations(
    db: &DatabaseConnection,
    filter: RegistrationFilter,
) -> Result<Vec<RegistrationRow>> {
    load_rows(db, filtered(filter)).await
}

/// The `limit` newest registrations.
pub async fn recent_registrations(
    db: &DatabaseConnection,
    limit: Option<u64>,
) -> Result<Vec<RegistrationRow>> {
    let query = filtered(RegistrationFilter::default()).limit(limit.unwrap_or(DEFAULT_RECENT_LIMIT));
    load_rows(db, query).await
}

/// Finds a registration by id.
pub async fn get_registration(db: &DatabaseConnection, id: i64) -> Result<registration::Model> {
    Registration::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("registration", id))
}

/// Sets the review status and notes.
#[instrument(skip(db, notes))]
pub async fn update_status(
    db: &DatabaseConnection,
    id: i64,
    status: RegistrationStatus,
    notes: Option<String>,
) -> Result<registration::Model> {
    let mut model: registration::ActiveModel = get_registration(db, id).await?.into();
    model.status = Set(status);
    model.notes = Set(notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()));
    model.updated_at = Set(Utc::now());
    let updated = model.update(db).await?;
    info!(
        "Registration {} is now {}",
        updated.registration_number,
        status.as_str()
    );
    Ok(updated)
}

/// Deletes a registration and, best effort, its documents.
#[instrument(skip(db, storage))]
pub async fn delete_registration(
    db: &DatabaseConnection,
    storage: &ObjectStorage,
    id: i64,
) -> Result<()> {
    let registration = get_registration(db, id).await?;
    let paths = stored_paths(&registration.documents);
    registration.delete(db).await?;
    remove_documents(storage, &paths).await;
    info!("Deleted registration {id}");
    Ok(())
}

/// Reads one stored document of a registration.
pub async fn read_document(
    db: &DatabaseConnection,
    storage: &ObjectStorage,
    id: i64,
    kind: DocumentKind,
) -> Result<(String, Vec<u8>)> {
    let registration = get_registration(db, id).await?;
    let path = kind
        .stored_path(&registration.documents)
        .ok_or_else(|| Error::NotFound {
            entity: "document",
            key: format!("{}/{}", registration.registration_number, kind.as_str()),
        })?
        .to_string();
    let bytes = storage.read(Bucket::PpdbDocuments, &path).await?;
    Ok((path, bytes))
}

/// Registrations per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// All registrations
    pub total: u64,
    /// Awaiting review
    pub pending: u64,
    /// Admitted
    pub accepted: u64,
    /// Not admitted
    pub rejected: u64,
}

/// Counts registrations by status, optionally within one period.
pub async fn status_counts(db: &DatabaseConnection, period_id: Option<i64>) -> Result<StatusCounts> {
    let count = |status: Option<RegistrationStatus>| async move {
        filtered(RegistrationFilter { period_id, status }).count(db).await
    };
    Ok(StatusCounts {
        total: count(None).await?,
        pending: count(Some(RegistrationStatus::Pending)).await?,
        accepted: count(Some(RegistrationStatus::Accepted)).await?,
        rejected: count(Some(RegistrationStatus::Rejected)).await?,
    })
}
