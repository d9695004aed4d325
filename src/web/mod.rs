//! HTTP interface: router, shared state, and server lifecycle.

/// Back-office API
pub mod admin;
/// Session extractor and sign-in endpoints
pub mod auth;
/// HTTP mapping of errors
pub mod error;
/// Public site API
pub mod public;
/// Base64 file payloads
pub mod upload;

use crate::{
    config::settings::{ServerSettings, Settings},
    errors::Result,
    storage::{Bucket, ObjectStorage},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
};
use chrono::{FixedOffset, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeader,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Largest accepted request body; fits four base64-encoded admission documents.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection pool
    pub db: DatabaseConnection,
    /// Uploaded files
    pub storage: ObjectStorage,
    /// Loaded configuration
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Builds the state; storage is rooted where the settings say.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        Self {
            storage: ObjectStorage::new(&settings.storage),
            db,
            settings: Arc::new(settings),
        }
    }

    /// The school's timezone
    pub fn timezone(&self) -> Result<FixedOffset> {
        self.settings.school.timezone()
    }

    /// Today's date at the school
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(crate::core::admission::local_today(Utc::now(), self.timezone()?))
    }
}

fn cors_layer(server: &ServerSettings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if server.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// The complete application router.
///
/// Public buckets are served under `/storage/{bucket}` with
/// `X-Content-Type-Options: nosniff`; admission documents are only reachable
/// through the admin API.
pub fn router(state: AppState) -> Router {
    let api = public::routes()
        .merge(auth::routes())
        .nest("/admin", admin::routes());
    let mut app = Router::new().nest("/api", api);

    for bucket in Bucket::ALL.into_iter().filter(|b| b.is_public()) {
        app = app.nest_service(
            &format!("/storage/{}", bucket.as_str()),
            SetResponseHeader::overriding(
                ServeDir::new(state.storage.bucket_dir(bucket)),
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        );
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(&state.settings.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState) -> Result<()> {
    let bind = state.settings.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Could not listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::StorageSettings;
    use crate::entities::Role;
    use crate::errors::Result;
    use crate::test_utils::{create_test_admin, setup_open_admission, setup_test_db};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde_json::{Value, json};
    use std::path::Path;

    fn test_server(db: DatabaseConnection, root: &Path) -> TestServer {
        let settings = Settings {
            storage: StorageSettings {
                root: root.to_path_buf(),
                ..StorageSettings::default()
            },
            ..Settings::default()
        };
        TestServer::new(router(AppState::new(db, settings))).unwrap()
    }

    async fn login(server: &TestServer, email: &str, password: &str) -> String {
        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"].as_str().unwrap().to_string()
    }

    fn document(name: &str, content_type: &str, bytes: &[u8]) -> Value {
        json!({
            "file_name": name,
            "content_type": content_type,
            "data": STANDARD.encode(bytes),
        })
    }

    #[tokio::test]
    async fn test_public_pages_on_empty_site() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let server = test_server(setup_test_db().await?, dir.path());

        let profile = server.get("/api/profile").await;
        profile.assert_status_ok();
        assert_eq!(profile.json::<Value>(), Value::Null);

        let ppdb = server.get("/api/ppdb").await.json::<Value>();
        assert_eq!(ppdb["is_open"], json!(false));
        assert_eq!(ppdb["message"], json!("Tidak ada periode aktif"));
        assert!(!ppdb["form"].as_array().unwrap().is_empty());

        server
            .get("/api/news/tidak-ada")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_routes_require_session_and_permission() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = setup_test_db().await?;
        create_test_admin(&db, "editor@sekolah.sch.id", Role::Editor, "rahasia123").await?;
        let server = test_server(db, dir.path());

        server
            .get("/api/admin/users")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let token = login(&server, "editor@sekolah.sch.id", "rahasia123").await;
        server
            .get("/api/admin/users")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let me = server.get("/api/auth/me").authorization_bearer(&token).await;
        me.assert_status_ok();
        assert_eq!(me.json::<Value>()["admin"]["role"], json!("editor"));

        server
            .post("/api/auth/logout")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get("/api/auth/me")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = setup_test_db().await?;
        create_test_admin(&db, "admin@sekolah.sch.id", Role::Admin, "rahasia123").await?;
        let server = test_server(db, dir.path());

        server
            .post("/api/auth/login")
            .json(&json!({ "email": "admin@sekolah.sch.id", "password": "salah" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_skill_created_by_editor_is_listed_publicly() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = setup_test_db().await?;
        create_test_admin(&db, "editor@sekolah.sch.id", Role::Editor, "rahasia123").await?;
        let server = test_server(db, dir.path());
        let token = login(&server, "editor@sekolah.sch.id", "rahasia123").await;

        let created = server
            .post("/api/admin/skills")
            .authorization_bearer(&token)
            .json(&json!({ "name": "Rekayasa Perangkat Lunak", "subjects": ["Basis Data"] }))
            .await;
        created.assert_status(StatusCode::CREATED);

        let page = server
            .get("/api/admin/skills?search=rekayasa")
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert_eq!(page["total_items"], json!(1));

        let public = server.get("/api/skills").await.json::<Value>();
        assert_eq!(public[0]["name"], json!("Rekayasa Perangkat Lunak"));
        Ok(())
    }

    #[tokio::test]
    async fn test_registration_submission_and_export() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (db, _period, skill) = setup_open_admission().await?;
        create_test_admin(&db, "admin@sekolah.sch.id", Role::Admin, "rahasia123").await?;
        let server = test_server(db, dir.path());

        let body = json!({
            "form": {
                "student_name": "Siti Aminah",
                "student_email": "siti@example.com",
                "student_phone": "081234567890",
                "birth_date": "2010-05-17",
                "birth_place": "Bandung",
                "gender": "P",
                "address": "Jl. Merdeka No. 1",
                "previous_school": "SMP Negeri 1 Bandung",
                "parent_name": "Ahmad",
                "parent_phone": "081298765432",
                "chosen_skill_id": skill.id,
            },
            "documents": {
                "ktp": document("ktp.pdf", "application/pdf", b"%PDF-1.4 ktp"),
                "kk": document("kk.pdf", "application/pdf", b"%PDF-1.4 kk"),
                "ijazah": document("ijazah.pdf", "application/pdf", b"%PDF-1.4 ijazah"),
                "foto": document("foto.jpg", "image/jpeg", b"jpeg foto"),
            },
        });
        let receipt = server.post("/api/ppdb/registrations").json(&body).await;
        receipt.assert_status(StatusCode::CREATED);
        let receipt = receipt.json::<Value>();
        assert_eq!(receipt["status"], json!("pending"));
        let number = receipt["registration_number"].as_str().unwrap().to_string();
        assert!(number.starts_with("PPDB"));

        let token = login(&server, "admin@sekolah.sch.id", "rahasia123").await;
        let id = receipt["id"].as_i64().unwrap();
        let ktp = server
            .get(&format!("/api/admin/ppdb/registrations/{id}/documents/ktp"))
            .authorization_bearer(&token)
            .await;
        ktp.assert_status_ok();
        assert_eq!(ktp.as_bytes().to_vec(), b"%PDF-1.4 ktp".to_vec());

        let export = server
            .get("/api/admin/ppdb/registrations/export.csv")
            .authorization_bearer(&token)
            .await;
        export.assert_status_ok();
        assert_eq!(export.header("content-type"), "text/csv; charset=utf-8");
        assert!(export.text().contains(&number));
        Ok(())
    }

    #[tokio::test]
    async fn test_uploads_are_named_by_content_type_not_file_name() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = setup_test_db().await?;
        create_test_admin(&db, "editor@sekolah.sch.id", Role::Editor, "rahasia123").await?;
        let server = test_server(db, dir.path());
        let token = login(&server, "editor@sekolah.sch.id", "rahasia123").await;

        let html = b"<script>alert(localStorage.token)</script>";
        let stored = server
            .post("/api/admin/uploads")
            .authorization_bearer(&token)
            .json(&json!({
                "purpose": "gallery_media",
                "file": document("kegiatan.html", "image/png", html),
            }))
            .await;
        stored.assert_status(StatusCode::CREATED);
        let path = stored.json::<Value>()["path"].as_str().unwrap().to_string();
        assert!(path.ends_with(".png"), "stored as {path}");

        let served = server.get(&format!("/storage/gallery/{path}")).await;
        served.assert_status_ok();
        assert_eq!(served.header("content-type"), "image/png");
        assert_eq!(served.header("x-content-type-options"), "nosniff");

        server
            .post("/api/admin/uploads")
            .authorization_bearer(&token)
            .json(&json!({
                "purpose": "gallery_media",
                "file": document("logo.svg", "image/svg+xml", b"<svg onload=\"alert(1)\"/>"),
            }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }

    #[tokio::test]
    async fn test_registration_rejected_while_closed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let server = test_server(setup_test_db().await?, dir.path());

        let response = server
            .post("/api/ppdb/registrations")
            .json(&json!({ "form": {}, "documents": {} }))
            .await;
        assert!(response.status_code().is_client_error());
        Ok(())
    }
}
