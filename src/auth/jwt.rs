use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind, TokenPair};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token has no subject claim")]
    MissingSubject,

    #[error("unexpected token kind")]
    WrongKind,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => Self::MissingSubject,
            _ => Self::Invalid(e),
        }
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    fn sign_with_kind_at(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token =
            encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Signing)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.sign_with_kind_at(user_id, TokenKind::Access, OffsetDateTime::now_utc())
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.sign_with_kind_at(user_id, TokenKind::Refresh, OffsetDateTime::now_utc())
    }

    /// Issues an access/refresh pair for `user_id`.
    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign_access(user_id)?,
            refresh_token: self.sign_refresh(user_id)?,
        })
    }

    /// Checks signature, expiry, issuer and audience. Every caller that trusts
    /// a token's subject goes through here.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Access {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }

    #[cfg(test)]
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }

    /// Subject of a verified access token.
    pub fn subject(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_access(token).map(|c| c.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 15,
            refresh_ttl_minutes: 60 * 24 * 7,
        })
    }

    #[test]
    fn subject_roundtrips_through_access_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let pair = keys.issue_pair(user_id).expect("issue pair");
        assert_eq!(keys.subject(&pair.access_token).expect("subject"), user_id);

        let claims = keys.verify(&pair.access_token).expect("verify");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn pair_tokens_differ_and_refresh_lives_seven_days() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let pair = keys.issue_pair(Uuid::new_v4()).expect("issue pair");
        assert!(!pair.access_token.is_empty());
        assert_ne!(pair.access_token, pair.refresh_token);

        let claims = keys.verify_refresh(&pair.refresh_token).expect("verify refresh");
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn verify_access_rejects_refresh_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign_refresh(Uuid::new_v4()).expect("sign refresh");
        assert!(keys.verify(&token).is_ok());
        assert!(matches!(keys.verify_access(&token), Err(TokenError::WrongKind)));
        assert!(matches!(keys.subject(&token), Err(TokenError::WrongKind)));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let an_hour_ago = OffsetDateTime::now_utc() - TimeDuration::hours(1);
        let token = keys
            .sign_with_kind_at(Uuid::new_v4(), TokenKind::Access, an_hour_ago)
            .expect("sign");
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn verify_rejects_token_expired_seconds_ago() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued =
            OffsetDateTime::now_utc() - TimeDuration::minutes(15) - TimeDuration::seconds(5);
        let token = keys
            .sign_with_kind_at(Uuid::new_v4(), TokenKind::Access, issued)
            .expect("sign");
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn verify_rejects_foreign_signature() {
        let ours = make_keys("secret-a", "iss", "aud");
        let theirs = make_keys("secret-b", "iss", "aud");
        let token = theirs.sign_access(Uuid::new_v4()).expect("sign");
        assert!(matches!(ours.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.sign_access(Uuid::new_v4()).expect("sign access");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn verify_reports_missing_subject() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let payload = serde_json::json!({
            "iat": now,
            "exp": now + 600,
            "iss": "iss",
            "aud": "aud",
            "kind": "access",
        });
        let token = encode(&Header::default(), &payload, &keys.encoding).expect("encode");
        assert!(matches!(keys.verify(&token), Err(TokenError::MissingSubject)));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(matches!(keys.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
    }
}
