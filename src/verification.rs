//! Phone verification provider (OTP)
//!
//! Capability interface consumed by the auth layer before an account may
//! originate transfers. The ledger core has no dependency on it: the
//! provider is a black box that either verifies a code or does not.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::OtpConfig;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Verification provider unreachable: {0}")]
    Unreachable(String),

    #[error("Verification provider rejected the request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Send a one-time code to a phone number. Returns the provider's
    /// request id, which the caller must present to `verify`.
    async fn send(&self, phone: &str) -> Result<String, VerificationError>;

    /// Check a code against an outstanding request.
    async fn verify(
        &self,
        request_id: &str,
        phone: &str,
        code: &str,
    ) -> Result<bool, VerificationError>;
}

#[derive(Serialize)]
struct SendOtpBody<'a> {
    #[serde(rename = "phoneNumber")]
    phone_number: &'a str,
}

#[derive(Serialize)]
struct VerifyOtpBody<'a> {
    #[serde(rename = "requestId")]
    request_id: &'a str,
    #[serde(rename = "phoneNumber")]
    phone_number: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct SendOtpResponse {
    #[serde(rename = "requestId")]
    request_id: String,
}

#[derive(Deserialize)]
struct VerifyOtpResponse {
    status: String,
}

/// HTTP-backed provider.
pub struct HttpVerificationProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpVerificationProvider {
    pub fn new(config: &OtpConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl VerificationProvider for HttpVerificationProvider {
    async fn send(&self, phone: &str) -> Result<String, VerificationError> {
        let resp = self
            .client
            .post(format!("{}/otp/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SendOtpBody { phone_number: phone })
            .send()
            .await
            .map_err(|e| VerificationError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(VerificationError::Rejected(resp.status().to_string()));
        }

        let body: SendOtpResponse = resp
            .json()
            .await
            .map_err(|e| VerificationError::Rejected(e.to_string()))?;
        Ok(body.request_id)
    }

    async fn verify(
        &self,
        request_id: &str,
        phone: &str,
        code: &str,
    ) -> Result<bool, VerificationError> {
        let resp = self
            .client
            .post(format!("{}/otp/verify", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&VerifyOtpBody {
                request_id,
                phone_number: phone,
                code,
            })
            .send()
            .await
            .map_err(|e| VerificationError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            return Ok(false);
        }

        let body: VerifyOtpResponse = resp
            .json()
            .await
            .map_err(|e| VerificationError::Rejected(e.to_string()))?;
        Ok(body.status == "success")
    }
}

/// Mock provider for tests and mock-api mode: accepts one fixed code.
pub struct MockVerificationProvider {
    accept_code: String,
}

impl MockVerificationProvider {
    pub fn new(accept_code: impl Into<String>) -> Self {
        Self {
            accept_code: accept_code.into(),
        }
    }
}

#[async_trait]
impl VerificationProvider for MockVerificationProvider {
    async fn send(&self, phone: &str) -> Result<String, VerificationError> {
        Ok(format!("mock-req-{phone}"))
    }

    async fn verify(
        &self,
        request_id: &str,
        phone: &str,
        code: &str,
    ) -> Result<bool, VerificationError> {
        Ok(request_id == format!("mock-req-{phone}") && code == self.accept_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_roundtrip() {
        let provider = MockVerificationProvider::new("123456");
        let req_id = provider.send("+233201234567").await.unwrap();

        assert!(provider.verify(&req_id, "+233201234567", "123456").await.unwrap());
        assert!(!provider.verify(&req_id, "+233201234567", "000000").await.unwrap());
        assert!(!provider.verify("bogus", "+233201234567", "123456").await.unwrap());
    }
}
