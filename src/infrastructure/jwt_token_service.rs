use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::domain::{
    error::ServiceError,
    models::{
        role::Role,
        session::{ExternalAssertion, PendingTwoFactor, RememberedBrowser, SessionClaims},
    },
    services::token_service::{Token, TokenService},
};

// Each token kind signs its purpose into the claims, so presenting a
// pending token where a session is expected fails the same way as a
// forged one.
const PURPOSE_SESSION: &str = "session";
const PURPOSE_TWO_FACTOR_PENDING: &str = "two_factor_pending";
const PURPOSE_REMEMBERED_BROWSER: &str = "remembered_browser";
const PURPOSE_EXTERNAL_PENDING: &str = "external_pending";

#[derive(Debug, Serialize, Deserialize)]
struct SessionTokenClaims {
    sub: String,
    purpose: String,
    email: String,
    roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    given_name: Option<String>,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PendingTokenClaims {
    sub: String,
    purpose: String,
    remember_me: bool,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct BrowserTokenClaims {
    sub: String,
    purpose: String,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExternalTokenClaims {
    sub: String,
    purpose: String,
    provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    exp: i64,
    iat: i64,
}

#[derive(Clone)]
pub struct JwtTokenService {
    secret: String,
    session_minutes: i64,
    remembered_session_minutes: i64,
    pending_minutes: i64,
    remembered_browser_days: i64,
}

impl JwtTokenService {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            session_minutes: 60,
            remembered_session_minutes: 60 * 24 * 14,
            pending_minutes: 10,
            remembered_browser_days: 30,
        }
    }

    pub fn with_lifetimes(
        secret: String,
        session_minutes: i64,
        remembered_session_minutes: i64,
        pending_minutes: i64,
        remembered_browser_days: i64,
    ) -> Self {
        Self {
            secret,
            session_minutes,
            remembered_session_minutes,
            pending_minutes,
            remembered_browser_days,
        }
    }

    fn encode_claims<C: Serialize>(&self, claims: &C) -> Result<Token, ServiceError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ServiceError::TokenIssue(e.to_string()))
    }

    fn decode_claims<C: DeserializeOwned>(&self, token: &str) -> Result<C, ServiceError> {
        decode::<C>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ServiceError::TokenInvalid)
    }
}

impl TokenService for JwtTokenService {
    fn issue_session(
        &self,
        claims: &SessionClaims,
        remember_me: bool,
    ) -> Result<Token, ServiceError> {
        let now = Utc::now();
        let minutes = if remember_me {
            self.remembered_session_minutes
        } else {
            self.session_minutes
        };
        self.encode_claims(&SessionTokenClaims {
            sub: claims.credential_id.to_string(),
            purpose: PURPOSE_SESSION.to_string(),
            email: claims.email.clone(),
            roles: claims.roles.iter().map(|r| r.to_string()).collect(),
            given_name: claims.given_name.clone(),
            exp: (now + Duration::minutes(minutes)).timestamp(),
            iat: now.timestamp(),
        })
    }

    fn decode_session(&self, token: &str) -> Result<SessionClaims, ServiceError> {
        let claims: SessionTokenClaims = self.decode_claims(token)?;
        if claims.purpose != PURPOSE_SESSION {
            return Err(ServiceError::TokenInvalid);
        }
        let roles = claims
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ServiceError::TokenInvalid)?;
        Ok(SessionClaims {
            credential_id: parse_subject(&claims.sub)?,
            email: claims.email,
            roles,
            given_name: claims.given_name,
        })
    }

    fn issue_pending_two_factor(&self, pending: &PendingTwoFactor) -> Result<Token, ServiceError> {
        let now = Utc::now();
        self.encode_claims(&PendingTokenClaims {
            sub: pending.credential_id.to_string(),
            purpose: PURPOSE_TWO_FACTOR_PENDING.to_string(),
            remember_me: pending.remember_me,
            exp: (now + Duration::minutes(self.pending_minutes)).timestamp(),
            iat: now.timestamp(),
        })
    }

    fn decode_pending_two_factor(&self, token: &str) -> Result<PendingTwoFactor, ServiceError> {
        let claims: PendingTokenClaims = self.decode_claims(token)?;
        if claims.purpose != PURPOSE_TWO_FACTOR_PENDING {
            return Err(ServiceError::TokenInvalid);
        }
        Ok(PendingTwoFactor {
            credential_id: parse_subject(&claims.sub)?,
            remember_me: claims.remember_me,
        })
    }

    fn issue_remembered_browser(
        &self,
        browser: &RememberedBrowser,
    ) -> Result<Token, ServiceError> {
        let now = Utc::now();
        self.encode_claims(&BrowserTokenClaims {
            sub: browser.credential_id.to_string(),
            purpose: PURPOSE_REMEMBERED_BROWSER.to_string(),
            exp: (now + Duration::days(self.remembered_browser_days)).timestamp(),
            iat: now.timestamp(),
        })
    }

    fn decode_remembered_browser(&self, token: &str) -> Result<RememberedBrowser, ServiceError> {
        let claims: BrowserTokenClaims = self.decode_claims(token)?;
        if claims.purpose != PURPOSE_REMEMBERED_BROWSER {
            return Err(ServiceError::TokenInvalid);
        }
        Ok(RememberedBrowser {
            credential_id: parse_subject(&claims.sub)?,
        })
    }

    fn issue_external_pending(&self, assertion: &ExternalAssertion) -> Result<Token, ServiceError> {
        let now = Utc::now();
        self.encode_claims(&ExternalTokenClaims {
            sub: assertion.subject.clone(),
            purpose: PURPOSE_EXTERNAL_PENDING.to_string(),
            provider: assertion.provider.clone(),
            email: assertion.email.clone(),
            exp: (now + Duration::minutes(self.pending_minutes)).timestamp(),
            iat: now.timestamp(),
        })
    }

    fn decode_external_pending(&self, token: &str) -> Result<ExternalAssertion, ServiceError> {
        let claims: ExternalTokenClaims = self.decode_claims(token)?;
        if claims.purpose != PURPOSE_EXTERNAL_PENDING {
            return Err(ServiceError::TokenInvalid);
        }
        Ok(ExternalAssertion {
            provider: claims.provider,
            subject: claims.sub,
            email: claims.email,
        })
    }
}

fn parse_subject(sub: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(sub).map_err(|_| ServiceError::TokenInvalid)
}
