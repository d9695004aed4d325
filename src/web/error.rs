//! HTTP mapping of [`Error`].

use crate::errors::{Error, FieldErrors};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    fields: FieldErrors,
}

impl Error {
    /// Status code sent for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Conflict { .. } | Self::RegistrationClosed { .. } => StatusCode::CONFLICT,
            Self::Config { .. }
            | Self::Storage { .. }
            | Self::PasswordHash { .. }
            | Self::Database(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {self}");
            "Terjadi kesalahan pada server".to_string()
        } else {
            warn!("Request rejected: {self}");
            match &self {
                Self::Validation { .. } => "Data tidak valid".to_string(),
                Self::RegistrationClosed { message }
                | Self::Unauthorized { message }
                | Self::Conflict { message } => message.clone(),
                other => other.to_string(),
            }
        };
        let fields = match self {
            Self::Validation { fields } => fields,
            _ => FieldErrors::new(),
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                fields,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::field("email", "x").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(Error::not_found("news", 3).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::RegistrationClosed {
                message: "tutup".to_string()
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = Error::Storage {
            message: "/var/lib/portal is read-only".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
