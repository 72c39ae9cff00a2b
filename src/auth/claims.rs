use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two issued tokens a JWT is. Only `Access` passes the gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload. `sub` is the external user id, never the row id.
///
/// `sub` is decoded before claim validation runs; the default lets a token
/// without it fail as a missing claim rather than as malformed JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Both tokens handed out on a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
