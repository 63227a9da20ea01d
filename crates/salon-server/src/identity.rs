//! Identity Gate: resolves a bearer credential to a user.

use crate::auth::validate_access_token;
use crate::error::ApiError;
use salon_common::models::user::User;
use salon_db::SalonStore;
use uuid::Uuid;

/// Why a credential was rejected. Callers answer all four with 401; the
/// variant is kept for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Missing authorization header")]
    MissingCredential,
    #[error("Invalid authorization header format")]
    MalformedCredential,
    #[error("Invalid or expired token")]
    InvalidOrExpiredCredential,
    #[error("User not found")]
    UserNotFound,
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, IdentityError> {
    let header = header.ok_or(IdentityError::MissingCredential)?;
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(IdentityError::MalformedCredential),
    }
}

/// Verify the credential in `header` and load its user.
///
/// Fails closed: any verification problem becomes
/// `InvalidOrExpiredCredential` without further detail. Storage failures
/// surface as internal errors.
pub async fn authenticate(
    store: &dyn SalonStore,
    jwt_secret: &str,
    header: Option<&str>,
) -> Result<User, ApiError> {
    let token = bearer_token(header)?;

    let claims = validate_access_token(token, jwt_secret)
        .map_err(|_| IdentityError::InvalidOrExpiredCredential)?;
    let user_id: Uuid = claims
        .sub
        .parse()
        .map_err(|_| IdentityError::InvalidOrExpiredCredential)?;

    store
        .user_by_id(user_id)
        .await?
        .ok_or(ApiError::Authentication(IdentityError::UserNotFound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_access_token;
    use crate::testing::MemoryStore;

    const SECRET: &str = "identity-test-secret";

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(Some("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(None), Err(IdentityError::MissingCredential));
        assert_eq!(
            bearer_token(Some("Bearer")),
            Err(IdentityError::MalformedCredential)
        );
        assert_eq!(
            bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(IdentityError::MalformedCredential)
        );
        assert_eq!(
            bearer_token(Some("Bearer a b")),
            Err(IdentityError::MalformedCredential)
        );
        assert_eq!(bearer_token(Some("")), Err(IdentityError::MalformedCredential));
    }

    fn assert_identity_error(result: Result<User, ApiError>, expected: IdentityError) {
        match result {
            Err(ApiError::Authentication(reason)) => assert_eq!(reason, expected),
            other => panic!("expected {:?}, got {:?}", expected, other),
        }
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let store = MemoryStore::new();
        let user = store.add_user("ana@example.com", false);
        let token = create_access_token(user.user_id, &user.email, SECRET, 60).unwrap();

        let header = format!("Bearer {}", token);
        let resolved = authenticate(&store, SECRET, Some(&header)).await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn test_missing_and_malformed() {
        let store = MemoryStore::new();
        assert_identity_error(
            authenticate(&store, SECRET, None).await,
            IdentityError::MissingCredential,
        );
        assert_identity_error(
            authenticate(&store, SECRET, Some("Token xyz")).await,
            IdentityError::MalformedCredential,
        );
    }

    #[tokio::test]
    async fn test_wrong_secret_and_expired() {
        let store = MemoryStore::new();
        let user = store.add_user("ana@example.com", false);

        let forged = create_access_token(user.user_id, &user.email, "other-secret", 60).unwrap();
        assert_identity_error(
            authenticate(&store, SECRET, Some(&format!("Bearer {}", forged))).await,
            IdentityError::InvalidOrExpiredCredential,
        );

        let expired = create_access_token(user.user_id, &user.email, SECRET, -60).unwrap();
        assert_identity_error(
            authenticate(&store, SECRET, Some(&format!("Bearer {}", expired))).await,
            IdentityError::InvalidOrExpiredCredential,
        );

        assert_identity_error(
            authenticate(&store, SECRET, Some("Bearer not-a-jwt")).await,
            IdentityError::InvalidOrExpiredCredential,
        );
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = MemoryStore::new();
        let token = create_access_token(Uuid::new_v4(), "ghost@example.com", SECRET, 60).unwrap();
        assert_identity_error(
            authenticate(&store, SECRET, Some(&format!("Bearer {}", token))).await,
            IdentityError::UserNotFound,
        );
    }
}
