use serde::{Deserialize, Serialize};

/// JWT claims carried by an access token.
///
/// `sub` is the user id as a string; the Identity Gate parses it back into a
/// `Uuid` and rejects the token if that fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}
