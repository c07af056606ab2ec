//! JWT verification service.
//!
//! The gateway trusts an already-authenticated session: the external
//! auth layer issues HS256 tokens whose subject is the verified account
//! id. This service only checks signatures and expiry; credentials,
//! registration and OTP flows live outside this crate.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::core_types::AccountId;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (account_id as string)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

/// Verified caller identity injected into request extensions.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
}

pub struct AuthVerifier {
    jwt_secret: String,
}

impl AuthVerifier {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    /// Verify a token and extract the verified account id.
    pub fn verify_token(&self, token: &str) -> Result<AuthenticatedAccount> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;

        let account_id = token_data
            .claims
            .sub
            .parse::<AccountId>()
            .context("token subject is not an account id")?;
        Ok(AuthenticatedAccount { account_id })
    }

    /// Issue a token for an account. Used by tests and dev tooling; in
    /// production tokens come from the external auth service.
    pub fn issue_token(&self, account_id: AccountId, ttl_hours: i64) -> Result<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(Duration::hours(ttl_hours))
            .context("valid timestamp")?
            .timestamp();

        let claims = Claims {
            sub: account_id.to_string(),
            exp: expiration as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .context("Failed to generate token")
    }
}
