pub mod admin;
pub mod auth;
pub mod bookings;
pub mod middleware;

use crate::state::AppState;
use axum::response::IntoResponse;
use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use salon_common::loyalty::LoyaltyStatus;
use salon_common::models::user::User;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// User as returned to clients, with the loyalty summary attached
#[derive(Debug, Serialize)]
pub struct UserPayload {
    #[serde(flatten)]
    pub user: User,
    pub loyalty: LoyaltyStatus,
}

impl From<User> for UserPayload {
    fn from(user: User) -> Self {
        let loyalty = user.loyalty();
        Self { user, loyalty }
    }
}

/// GET /api/health
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub fn build_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Booking lifecycle
        .route("/bookings/create", post(bookings::create_booking))
        .route("/bookings/cancel", post(bookings::cancel_booking))
        .route("/bookings/reschedule", post(bookings::reschedule_booking))
        .route("/bookings/list", get(bookings::list_bookings))
        // Admin dashboard
        .route("/admin/bookings", get(admin::list_bookings))
        .route("/admin/bookings/{id}", delete(admin::delete_booking))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use crate::auth::create_access_token;
    use crate::config::{AuthConfig, BookingsConfig, DbConfig, ServerConfig};
    use crate::state::AppState;
    use crate::testing::MemoryStore;
    use crate::web::build_router;
    use axum::body::Body;
    use axum::Router;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use salon_common::models::user::User;
    use serde_json::Value;
    use sqlx::PgPool;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    fn test_router(store: Arc<MemoryStore>) -> Router {
        let config = ServerConfig {
            listen: "127.0.0.1:0".to_string(),
            db: DbConfig {
                url: "postgres://invalid:5432/db".to_string(),
                max_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: SECRET.to_string(),
                access_token_ttl_secs: 900,
                refresh_token_ttl_days: 30,
                cookie_secure: false,
                initial_admin: None,
            },
            bookings: BookingsConfig::default(),
        };
        let state = AppState {
            pool: PgPool::connect_lazy("postgres://invalid:5432/db").unwrap(),
            store,
            config: Arc::new(config),
        };
        build_router(state)
    }

    fn token(user: &User) -> String {
        create_access_token(user.user_id, &user.email, SECRET, 60).unwrap()
    }

    fn raw_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn expect_validation_error(router: &Router, request: Request<Body>) -> String {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["kind"], "validation_error");
        body["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_cancel_with_malformed_booking_id() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("ana@example.com", false);
        let router = test_router(store);

        let error = expect_validation_error(
            &router,
            raw_request(
                "POST",
                "/api/bookings/cancel",
                Some(&token(&user)),
                r#"{"booking_id": "not-a-uuid"}"#,
            ),
        )
        .await;
        assert!(error.starts_with("Invalid body"));
    }

    #[tokio::test]
    async fn test_cancel_and_reschedule_without_booking_id() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("ana@example.com", false);
        let router = test_router(store);
        let token = token(&user);

        for uri in ["/api/bookings/cancel", "/api/bookings/reschedule"] {
            let error =
                expect_validation_error(&router, raw_request("POST", uri, Some(&token), "{}"))
                    .await;
            assert_eq!(error, "Missing required field: booking_id");
        }
    }

    #[tokio::test]
    async fn test_create_with_unparseable_body() {
        let store = Arc::new(MemoryStore::new());
        let user = store.add_user("ana@example.com", false);
        let router = test_router(store.clone());

        expect_validation_error(
            &router,
            raw_request("POST", "/api/bookings/create", Some(&token(&user)), "garbage"),
        )
        .await;
        assert_eq!(store.user(user.user_id).unwrap().haircut_count, 0);
    }

    #[tokio::test]
    async fn test_login_without_password() {
        let router = test_router(Arc::new(MemoryStore::new()));

        let error = expect_validation_error(
            &router,
            raw_request("POST", "/api/auth/login", None, r#"{"email": "a@b.c"}"#),
        )
        .await;
        assert_eq!(error, "Missing required field: password");
    }

    #[tokio::test]
    async fn test_admin_delete_with_malformed_path_id() {
        let store = Arc::new(MemoryStore::new());
        let admin = store.add_user("boss@example.com", true);
        let router = test_router(store);

        let error = expect_validation_error(
            &router,
            raw_request(
                "DELETE",
                "/api/admin/bookings/not-a-uuid",
                Some(&token(&admin)),
                "",
            ),
        )
        .await;
        assert!(error.starts_with("Invalid path"));
    }
}
