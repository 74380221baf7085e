use axum::extract::FromRef;
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::debug;

use super::claims::{Claims, TokenKind};
use crate::state::AppState;

/// Verification side of the authentication service's HS256 tokens.
#[derive(Clone)]
pub struct JwtKeys {
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let cfg = &state.config.jwt;
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }
}

impl JwtKeys {
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Access {
            anyhow::bail!("not an access token");
        }
        Ok(claims)
    }
}

#[cfg(test)]
pub mod testing {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use super::*;
    use crate::config::JwtConfig;

    /// Signs a token the way the authentication service does.
    pub fn sign(cfg: &JwtConfig, user_id: Uuid, kind: TokenKind, ttl: Duration) -> String {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
            iss: cfg.issuer.clone(),
            aud: cfg.audience.clone(),
            kind,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .expect("sign test token")
    }
}

#[cfg(test)]
mod tests {
    use super::testing::sign;
    use super::*;
    use crate::config::JwtConfig;
    use time::Duration;
    use uuid::Uuid;

    fn cfg(issuer: &str, audience: &str) -> JwtConfig {
        JwtConfig {
            secret: "same-secret".into(),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    fn keys(cfg: &JwtConfig) -> JwtKeys {
        JwtKeys {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    #[test]
    fn verifies_access_token() {
        let cfg = cfg("nutrichat", "nutrichat-users");
        let user_id = Uuid::new_v4();
        let token = sign(&cfg, user_id, TokenKind::Access, Duration::minutes(5));
        let claims = keys(&cfg).verify_access(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "nutrichat");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn refresh_tokens_do_not_open_sessions() {
        let cfg = cfg("iss", "aud");
        let token = sign(&cfg, Uuid::new_v4(), TokenKind::Refresh, Duration::minutes(5));
        let err = keys(&cfg).verify_access(&token).unwrap_err();
        assert!(err.to_string().contains("not an access token"));
    }

    #[test]
    fn rejects_wrong_issuer_audience_or_expiry() {
        let good = cfg("good-iss", "good-aud");
        let bad = cfg("bad-iss", "bad-aud");
        let token = sign(&good, Uuid::new_v4(), TokenKind::Access, Duration::minutes(5));
        assert!(keys(&bad).verify(&token).is_err());

        let expired = sign(&good, Uuid::new_v4(), TokenKind::Access, Duration::hours(-2));
        assert!(keys(&good).verify(&expired).is_err());
    }
}
