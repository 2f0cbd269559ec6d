// 🌐 REST API - Axum router over the records core
//
// One SQLite connection behind a mutex; every handler takes the lock for
// the duration of its synchronous work, so mutations are serialized.

pub mod logs;
pub mod records;
pub mod response;

pub use response::{ApiError, ApiResponse, JsonBody};

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::admin::{self, AdminProfile, PasswordChange, ProfilePatch};
use crate::cascade::CascadeEngine;
use crate::config::AppConfig;
use crate::entities::{AcademicYear, Course, Department, Faculty, Record, Student};
use crate::error::RecordsError;
use crate::stats::{self, SchoolStats};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub engine: CascadeEngine,
    pub log_page_size: usize,
}

impl AppState {
    pub fn new(conn: Connection, config: &AppConfig) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
            engine: CascadeEngine::new(),
            log_page_size: config.log_page_size,
        }
    }

    /// Run `op` with the connection locked
    pub fn with_db<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut conn = self
            .db
            .lock()
            .map_err(|_| ApiError::from(RecordsError::StorageUnavailable))?;
        op(&mut conn)
    }
}

// ============================================================================
// Router
// ============================================================================

fn mount<R: Record>(router: Router<AppState>) -> Router<AppState> {
    router.nest(&format!("/{}", R::KIND.slug()), records::routes::<R>())
}

pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut api = Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/admin", get(get_admin).put(update_admin))
        .route("/admin/password", post(change_admin_password))
        .nest("/logs", logs::routes());

    api = mount::<Student>(api);
    api = mount::<Faculty>(api);
    api = mount::<Course>(api);
    api = mount::<Department>(api);
    api = mount::<AcademicYear>(api);

    let app = Router::new().nest("/api", api).with_state(state);

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(CorsLayer::permissive())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<ApiResponse<SchoolStats>>, ApiError> {
    let stats = state.with_db(|conn| Ok(stats::school_stats(conn)?))?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/admin
async fn get_admin(State(state): State<AppState>) -> Result<Json<ApiResponse<AdminProfile>>, ApiError> {
    let profile = state.with_db(|conn| Ok(admin::get_profile(conn)?))?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /api/admin
async fn update_admin(
    State(state): State<AppState>,
    JsonBody(patch): JsonBody<ProfilePatch>,
) -> Result<Json<ApiResponse<AdminProfile>>, ApiError> {
    let profile = state.with_db(|conn| Ok(admin::update_profile(conn, patch)?))?;
    Ok(Json(ApiResponse::ok(profile)))
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

/// POST /api/admin/password
async fn change_admin_password(
    State(state): State<AppState>,
    JsonBody(change): JsonBody<PasswordChange>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.with_db(|conn| Ok(admin::change_password(conn, &change)?))?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        admin::ensure_admin(&conn, "admin123").unwrap();
        build_router(AppState::new(conn, &AppConfig::default()), None)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(serde_json::to_vec(&body).unwrap())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        send(app, request).await
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn seed(app: &Router) -> String {
        let (status, dept) = call(
            app,
            "POST",
            "/api/departments/create",
            Some(json!({"name": "Engineering", "head": "Dr. Smith"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        call(
            app,
            "POST",
            "/api/courses/create",
            Some(json!({"name": "BSCE", "department": "Engineering"})),
        )
        .await;
        call(
            app,
            "POST",
            "/api/faculty/create",
            Some(json!({"name": "Prof. Brown", "email": "brown@school.edu", "department": "Engineering"})),
        )
        .await;
        call(
            app,
            "POST",
            "/api/students/create",
            Some(json!({"name": "Daniel Martinez", "email": "daniel@school.edu", "department": "Engineering", "course": "BSCE"})),
        )
        .await;

        dept["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": "OK"}));
    }

    #[tokio::test]
    async fn test_archive_department_over_http() {
        let app = app();
        let id = seed(&app).await;

        let (status, body) = call(
            &app,
            "PATCH",
            &format!("/api/departments/{}", id),
            Some(json!({"archived": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["archived"], json!(true));
        assert_eq!(body["data"]["status"], json!("Archived"));
        assert!(body.get("warnings").is_none());

        let (_, students) = call(&app, "GET", "/api/students/list", None).await;
        assert_eq!(students["data"], json!([]));

        let (_, archived) = call(&app, "GET", "/api/courses/archived", None).await;
        assert_eq!(archived["data"][0]["status"], json!("archived"));

        let (_, logs) = call(&app, "GET", "/api/logs", None).await;
        assert_eq!(logs["data"][0]["action"], json!("Archived"));
        assert_eq!(logs["data"][0]["type"], json!("Department"));
        assert_eq!(
            logs["data"][0]["details"],
            json!("Archived department: Engineering (Also archived: 1 course(s), 1 faculty, 1 student(s))")
        );
    }

    #[tokio::test]
    async fn test_delete_returns_message_and_counts() {
        let app = app();
        let id = seed(&app).await;

        let (status, body) = call(&app, "DELETE", &format!("/api/departments/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], json!("Department deleted successfully"));
        assert_eq!(body["data"]["cascaded"].as_array().unwrap().len(), 3);

        let (status, _) = call(&app, "GET", &format!("/api/departments/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();

        let (status, body) = call(&app, "PUT", "/api/students/missing", Some(json!({"archived": true}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));

        let (status, _) = call(
            &app,
            "POST",
            "/api/students/create",
            Some(json!({"name": "Ava", "email": "not-an-email", "department": "Nursing"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            &app,
            "POST",
            "/api/admin/password",
            Some(json!({"current_password": "wrong", "new_password": "long-enough"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, logs) = call(&app, "GET", "/api/logs", None).await;
        assert_eq!(logs["data"], json!([]));
    }

    #[tokio::test]
    async fn test_list_filter_by_relation() {
        let app = app();
        seed(&app).await;
        call(
            &app,
            "POST",
            "/api/students/create",
            Some(json!({"name": "Ava Chen", "email": "ava@school.edu", "department": "Nursing"})),
        )
        .await;

        call(
            &app,
            "POST",
            "/api/students/create",
            Some(json!({"name": "Liam Ortiz", "email": "liam@school.edu", "department": "Engineering"})),
        )
        .await;

        async fn names(app: &Router, uri: &str) -> Vec<String> {
            let (status, body) = call(app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            body["data"]
                .as_array()
                .unwrap()
                .iter()
                .map(|s| s["name"].as_str().unwrap().to_string())
                .collect()
        }

        assert_eq!(names(&app, "/api/students/list?department=Nursing").await, vec!["Ava Chen"]);
        assert_eq!(
            names(&app, "/api/students/list?department=Engineering&course=BSCE").await,
            vec!["Daniel Martinez"]
        );

        // Unrelated keys do not narrow or break the listing
        assert_eq!(names(&app, "/api/students/list?_=1700000000").await.len(), 3);
        assert_eq!(
            names(&app, "/api/students/list?department=Engineering&_=1700000000").await,
            vec!["Daniel Martinez", "Liam Ortiz"]
        );

        let (status, body) = call(&app, "GET", "/api/students/list?subject=BSCE", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_direct_log_append_and_clear() {
        let app = app();

        let (status, body) = call(
            &app,
            "POST",
            "/api/logs",
            Some(json!({"action": "Updated", "type": "Settings", "details": "Changed theme"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["user"], json!("Admin"));
        assert_eq!(body["data"]["status"], json!("success"));

        let (status, body) = call(
            &app,
            "POST",
            "/api/logs",
            Some(json!({"action": "Exploded", "type": "Settings", "details": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].is_string());

        let (status, body) = call(&app, "POST", "/api/logs/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["cleared"], json!(1));

        let (status, _) = call(&app, "DELETE", "/api/logs/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_gets_envelope() {
        let app = app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/departments/create")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].is_string());

        let (status, body) = call(
            &app,
            "PATCH",
            "/api/courses/some-id",
            Some(json!({"credits": "three"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_stats_and_admin() {
        let app = app();
        seed(&app).await;

        let (_, stats) = call(&app, "GET", "/api/stats", None).await;
        assert_eq!(stats["data"]["total_students"], json!(1));
        assert_eq!(stats["data"]["students_by_department"][0]["name"], json!("Engineering"));

        let (status, profile) = call(&app, "PUT", "/api/admin", Some(json!({"name": "Registrar"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["data"]["name"], json!("Registrar"));
        assert_eq!(profile["data"]["email"], json!("admin@school.edu"));
    }
}
