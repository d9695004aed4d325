//! File payloads sent as JSON with base64 content.

use crate::{
    core::{
        registration::DocumentUpload,
        validation::{UploadKind, check_upload},
    },
    errors::{Error, Result},
    storage::{Bucket, ObjectStorage, StoredObject},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use serde::Deserialize;

/// One file inside a JSON request
#[derive(Debug, Clone, Deserialize)]
pub struct FilePayload {
    /// Original file name
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// Base64 file contents; a `data:` URL prefix is accepted
    pub data: String,
}

impl FilePayload {
    /// Decodes the content. Errors are reported against `field`.
    pub fn decode(self, field: &str) -> Result<DocumentUpload> {
        let encoded = match self.data.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => self.data.as_str(),
        };
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| Error::field(field, "File tidak dapat dibaca"))?;
        Ok(DocumentUpload {
            file_name: self.file_name,
            content_type: self.content_type,
            bytes,
        })
    }
}

/// What an admin upload is for; decides the bucket and the limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPurpose {
    /// Program image
    SkillImage,
    /// School logo
    Logo,
    /// Profile header image
    HeaderImage,
    /// News cover
    NewsImage,
    /// Gallery photo or video
    GalleryMedia,
    /// School video
    SchoolVideo,
}

impl UploadPurpose {
    /// Destination bucket
    #[must_use]
    pub const fn bucket(self) -> Bucket {
        match self {
            Self::SkillImage | Self::Logo | Self::HeaderImage => Bucket::SchoolImages,
            Self::NewsImage => Bucket::NewsImages,
            Self::GalleryMedia => Bucket::Gallery,
            Self::SchoolVideo => Bucket::SchoolVideos,
        }
    }

    /// Size and type limits
    #[must_use]
    pub const fn kind(self) -> UploadKind {
        match self {
            Self::SkillImage => UploadKind::SkillImage,
            Self::Logo => UploadKind::Logo,
            Self::HeaderImage => UploadKind::HeaderImage,
            Self::NewsImage => UploadKind::NewsImage,
            Self::GalleryMedia | Self::SchoolVideo => UploadKind::GalleryMedia,
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::SkillImage => "skill",
            Self::Logo => "logo",
            Self::HeaderImage => "header",
            Self::NewsImage => "news",
            Self::GalleryMedia => "gallery",
            Self::SchoolVideo => "video",
        }
    }
}

/// Checks and stores an admin upload as `{prefix}_{millis}.{ext}`, the
/// extension following the checked MIME type.
pub async fn store_upload(
    storage: &ObjectStorage,
    purpose: UploadPurpose,
    file: DocumentUpload,
) -> Result<StoredObject> {
    check_upload(purpose.kind(), file.bytes.len(), &file.content_type)
        .map_err(|message| Error::field("file", message))?;
    let stem = format!("{}_{}", purpose.prefix(), Utc::now().timestamp_millis());
    let path = format!("{stem}.{}", file.extension());
    storage.upload(purpose.bucket(), &path, &file.bytes).await
}

/// MIME type for serving a stored file, from its extension.
#[must_use]
pub fn content_type_for(path: &str) -> &'static str {
    match crate::storage::file_extension(path).as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
