use crate::auth::{
    create_access_token, generate_refresh_token, hash_password, hash_refresh_token,
    verify_password,
};
use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::identity::IdentityError;
use crate::state::AppState;
use crate::web::api::middleware::Session;
use crate::web::api::UserPayload;
use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use axum_extra::extract::{CookieJar, WithRejection};
use chrono::{DateTime, Duration, Utc};
use salon_common::models::user::User;
use salon_common::validation::{required, ValidationError};
use salon_db::{RefreshTokenRepo, RefreshTokenRow, UserRepo};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub const REFRESH_COOKIE: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/api/auth";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH: &str = "Invalid or expired refresh token";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserPayload,
}

type SetCookie = AppendHeaders<[(HeaderName, String); 1]>;

fn refresh_cookie(config: &AuthConfig, raw_token: &str) -> SetCookie {
    let max_age = Duration::days(config.refresh_token_ttl_days).num_seconds();
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    AppendHeaders([(
        header::SET_COOKIE,
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path={}; Max-Age={}{}",
            REFRESH_COOKIE, raw_token, REFRESH_COOKIE_PATH, max_age, secure
        ),
    )])
}

fn clear_refresh_cookie(config: &AuthConfig) -> SetCookie {
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    AppendHeaders([(
        header::SET_COOKIE,
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path={}; Max-Age=0{}",
            REFRESH_COOKIE, REFRESH_COOKIE_PATH, secure
        ),
    )])
}

/// Sign an access token and store a fresh refresh token for `user`.
async fn issue_tokens(
    pool: &PgPool,
    config: &AuthConfig,
    user: User,
) -> Result<(SetCookie, TokenResponse), ApiError> {
    let token = create_access_token(
        user.user_id,
        &user.email,
        &config.jwt_secret,
        config.access_token_ttl_secs,
    )?;

    let (raw_refresh, refresh_hash) = generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(config.refresh_token_ttl_days);
    RefreshTokenRepo::create(pool, &refresh_hash, user.user_id, expires_at).await?;

    Ok((
        refresh_cookie(config, &raw_refresh),
        TokenResponse {
            token,
            user: user.into(),
        },
    ))
}

/// POST /api/auth/register
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let email = required("email", req.email.as_deref())?;
    let password = req
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(ValidationError::Missing("password"))?;
    let name = req.name.as_deref().map(str::trim).unwrap_or_default();

    let password_hash = hash_password(password)?;
    let user = UserRepo::create(
        &state.pool,
        Uuid::new_v4(),
        name,
        email,
        &password_hash,
        false,
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("User already exists".to_string()))?;

    tracing::info!(user_id = %user.user_id, "User registered");

    let (cookie, body) = issue_tokens(&state.pool, &state.config.auth, user.into()).await?;
    Ok((StatusCode::CREATED, cookie, Json(body)))
}

/// POST /api/auth/login
#[tracing::instrument(skip(state, req))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let email = required("email", req.email.as_deref())?;
    let password = req
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(ValidationError::Missing("password"))?;

    let user = UserRepo::get_by_email(&state.pool, email)
        .await?
        .ok_or(ApiError::Credentials(INVALID_CREDENTIALS))?;

    if !verify_password(password, &user.password_hash)? {
        return Err(ApiError::Credentials(INVALID_CREDENTIALS));
    }

    let (cookie, body) = issue_tokens(&state.pool, &state.config.auth, user.into()).await?;
    Ok((cookie, Json(body)))
}

/// POST /api/auth/refresh
///
/// Exchanges the refresh cookie for a new access token. The presented
/// refresh token is revoked and replaced in the same transaction.
#[tracing::instrument(skip(state, jar))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let config = &state.config.auth;
    let raw = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Credentials(INVALID_REFRESH))?;

    let presented_hash = hash_refresh_token(&raw);
    let (raw_refresh, refresh_hash) = generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(config.refresh_token_ttl_days);
    let Some(user_id) =
        RefreshTokenRepo::rotate(&state.pool, &presented_hash, &refresh_hash, expires_at).await?
    else {
        reject_refresh(&state.pool, &presented_hash).await?;
        return Err(ApiError::Credentials(INVALID_REFRESH));
    };

    let user: User = UserRepo::get_by_id(&state.pool, user_id)
        .await?
        .ok_or(IdentityError::UserNotFound)?
        .into();

    let token = create_access_token(
        user.user_id,
        &user.email,
        &config.jwt_secret,
        config.access_token_ttl_secs,
    )?;

    Ok((
        refresh_cookie(config, &raw_refresh),
        Json(TokenResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Why a presented refresh token failed to rotate.
#[derive(Debug, PartialEq, Eq)]
enum RefreshRejection {
    /// Revoked earlier, so it was copied after rotation
    Reused,
    Expired,
    /// Still usable when read back: a concurrent refresh rotated it first
    Raced,
}

fn classify_refresh(row: &RefreshTokenRow, now: DateTime<Utc>) -> RefreshRejection {
    if row.revoked {
        RefreshRejection::Reused
    } else if !row.is_usable(now) {
        RefreshRejection::Expired
    } else {
        RefreshRejection::Raced
    }
}

/// A revoked token coming back means it was copied after rotation: revoke
/// every session of its owner.
async fn reject_refresh(pool: &PgPool, token_hash: &str) -> Result<(), ApiError> {
    let Some(row) = RefreshTokenRepo::get_by_hash(pool, token_hash).await? else {
        tracing::debug!("Unknown refresh token presented");
        return Ok(());
    };
    match classify_refresh(&row, Utc::now()) {
        RefreshRejection::Reused => {
            let revoked = RefreshTokenRepo::revoke_all_for_user(pool, row.user_id).await?;
            tracing::warn!(
                user_id = %row.user_id,
                revoked,
                "Revoked refresh token reused, all sessions revoked"
            );
        }
        RefreshRejection::Expired => {
            tracing::debug!(
                user_id = %row.user_id,
                expires_at = %row.expires_at,
                "Expired refresh token presented"
            );
        }
        RefreshRejection::Raced => {
            tracing::debug!(user_id = %row.user_id, "Refresh token rotated concurrently");
        }
    }
    Ok(())
}

/// POST /api/auth/logout
#[tracing::instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        RefreshTokenRepo::revoke(&state.pool, &hash_refresh_token(cookie.value())).await?;
    }

    Ok((
        clear_refresh_cookie(&state.config.auth),
        Json(json!({"status": "ok"})),
    ))
}

/// GET /api/auth/me
#[tracing::instrument(skip_all)]
pub async fn me(Session(user): Session) -> impl IntoResponse {
    Json(json!({ "user": UserPayload::from(user) }))
}
