use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::SessionClaims;
use crate::config::JwtConfig;

/// Signing and verification keys plus the claims policy.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    audience: String,
    ttl: TimeDuration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: TimeDuration::minutes(cfg.ttl_minutes),
        }
    }

    pub(crate) fn sign_at(
        &self,
        user_id: Uuid,
        email: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + self.ttl;
        let claims = SessionClaims {
            sub: user_id,
            email: email.to_string(),
            jti: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id = %user_id, jti = %claims.jti, "jwt signed");
        Ok(token)
    }

    pub fn sign(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        self.sign_at(user_id, email, OffsetDateTime::now_utc())
    }

    /// Checks signature, algorithm, expiry, issuer and audience.
    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, jti = %data.claims.jti, "jwt verified");
        Ok(data.claims)
    }
}
