use crate::error::ApiError;
use crate::identity::authenticate;
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use salon_common::models::user::User;
use std::sync::Arc;

/// Extractor that runs the bearer token through the identity gate and
/// hands the resolved user to the handler.
#[derive(Debug)]
pub struct Session(pub User);

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap_or_default());

        let user = authenticate(
            state.store.as_ref(),
            &state.config.auth.jwt_secret,
            auth_header,
        )
        .await?;
        Ok(Session(user))
    }
}
