//! Input validators shared by the public forms and the admin screens.
//!
//! Messages are the Indonesian strings shown to end users.

use crate::errors::{Error, FieldErrors, Result};

/// Message for a missing required value
pub const MSG_REQUIRED: &str = "Field ini wajib diisi";
/// Message for a malformed email
pub const MSG_EMAIL: &str = "Format email tidak valid";
/// Message for a malformed phone number
pub const MSG_PHONE: &str = "Format nomor telepon tidak valid";
/// Message for a malformed URL
pub const MSG_URL: &str = "Format URL tidak valid (harus dimulai dengan http:// atau https://)";

const MB: usize = 1024 * 1024;

/// Accepts `local@domain.tld`: exactly one `@`, no whitespace, a non-empty
/// local part, and a dot in the domain with text on both sides.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Indonesian phone number as typed on the admission form.
///
/// Whitespace is ignored; then `+62`, `62` or `0`, a digit 2-9, and 7 to 11
/// more digits.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    let rest = compact
        .strip_prefix("+62")
        .or_else(|| compact.strip_prefix("62"))
        .or_else(|| compact.strip_prefix('0'));
    let Some(rest) = rest else {
        return false;
    };
    let mut chars = rest.chars();
    match chars.next() {
        Some('2'..='9') => {}
        _ => return false,
    }
    let tail = chars.as_str();
    (7..=11).contains(&tail.len()) && tail.chars().all(|c| c.is_ascii_digit())
}

/// Looser phone check used for contact entries: digits, spaces, `-`, `+`, `(`, `)`.
#[must_use]
pub fn is_valid_contact_phone(phone: &str) -> bool {
    !phone.is_empty()
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'))
}

/// `http://` or `https://` followed by at least one character.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
}

/// Collects per-field messages and turns them into [`Error::Validation`].
#[derive(Debug, Default)]
pub struct FieldCheck {
    errors: FieldErrors,
}

impl FieldCheck {
    /// Starts an empty check
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already has one.
    pub fn fail(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
        self
    }

    /// Value must be non-blank.
    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, MSG_REQUIRED);
        }
        self
    }

    /// Value, when present and non-blank, must be an email.
    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if !is_valid_email(v) {
                self.fail(field, MSG_EMAIL);
            }
        }
        self
    }

    /// Value, when present and non-blank, must be an admission-form phone number.
    pub fn phone(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if !is_valid_phone(v) {
                self.fail(field, MSG_PHONE);
            }
        }
        self
    }

    /// Value, when present and non-blank, must be a URL.
    pub fn url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if !is_valid_url(v) {
                self.fail(field, MSG_URL);
            }
        }
        self
    }

    /// Adds messages produced elsewhere (e.g. by a form schema)
    pub fn extend(&mut self, errors: FieldErrors) -> &mut Self {
        for (field, message) in errors {
            self.fail(&field, message);
        }
        self
    }

    /// True when nothing failed so far
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` or [`Error::Validation`] with every recorded message.
    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                fields: self.errors,
            })
        }
    }
}

/// What an uploaded file is going to be used for; decides size and type limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Program image
    SkillImage,
    /// School logo
    Logo,
    /// Profile header image
    HeaderImage,
    /// News cover image
    NewsImage,
    /// Gallery photo or video
    GalleryMedia,
    /// KTP, KK or ijazah scan
    AdmissionDocument,
    /// Applicant photo
    AdmissionPhoto,
}

impl UploadKind {
    /// Largest accepted file, in bytes
    #[must_use]
    pub const fn max_bytes(self) -> usize {
        match self {
            Self::SkillImage | Self::Logo | Self::NewsImage => 2 * MB,
            Self::HeaderImage | Self::AdmissionDocument | Self::AdmissionPhoto => 5 * MB,
            Self::GalleryMedia => 10 * MB,
        }
    }

    /// Whether `content_type` is acceptable for this kind
    #[must_use]
    pub fn accepts(self, content_type: &str) -> bool {
        let Some(ext) = extension_for(content_type) else {
            return false;
        };
        match self {
            Self::SkillImage | Self::Logo | Self::HeaderImage | Self::NewsImage => {
                matches!(ext, "jpg" | "png" | "webp" | "gif")
            }
            Self::GalleryMedia => matches!(ext, "jpg" | "png" | "webp" | "gif" | "mp4"),
            Self::AdmissionDocument => matches!(ext, "jpg" | "png" | "pdf"),
            Self::AdmissionPhoto => matches!(ext, "jpg" | "png"),
        }
    }
}

/// File extension stored for an accepted MIME type.
///
/// Stored files are named after this, never after the client's file name,
/// since the extension decides the `Content-Type` they are served with.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "video/mp4" => Some("mp4"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// Checks size and content type of an upload; the error is the user-facing message.
pub fn check_upload(kind: UploadKind, size: usize, content_type: &str) -> std::result::Result<(), String> {
    if size == 0 {
        return Err("File kosong".to_string());
    }
    if size > kind.max_bytes() {
        return Err(format!("Ukuran file maksimal {}MB", kind.max_bytes() / MB));
    }
    if !kind.accepts(content_type) {
        return Err(format!("Tipe file tidak didukung: {content_type}"));
    }
    Ok(())
}
