//! HTTP client for the remote content-quality check service
//!
//! The service is consumed through the [`CheckService`] trait so the
//! dispatcher pipeline can be exercised against fakes in tests. The real
//! implementation, [`CheckClient`], performs the two opaque remote calls:
//! `sign_in` (token + username -> access token) and `submit_check`
//! (access token + request -> quality result with named report links).
//!
//! HTTP failures are mapped onto the tagged error variants that
//! [`crate::retry::IsTransient`] classifies: 429 becomes
//! [`Error::RateLimited`], 5xx becomes [`Error::Server`], 401/403 become
//! [`Error::Auth`], and any other non-success status becomes
//! [`Error::Remote`].

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::types::{CheckMode, CheckRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque access token obtained from sign-in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken(pub String);

/// Response to a submitted check
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    /// Server-assigned check id
    pub id: String,

    /// Numeric quality score, when the service computed one
    #[serde(default)]
    pub quality_score: Option<f64>,

    /// Quality status label (e.g., "green", "red")
    #[serde(default)]
    pub quality_status: Option<String>,

    /// Named report links (e.g., "scorecard", "contentAnalysisDashboard")
    #[serde(default)]
    pub reports: HashMap<String, String>,
}

/// The remote check service as consumed by the pipeline
///
/// Implementations must be safe to call concurrently for different files;
/// the only shared state allowed is read-only configuration.
#[async_trait]
pub trait CheckService: Send + Sync {
    /// Sign in with the configured token and username, yielding an access token
    async fn sign_in(&self) -> Result<AccessToken>;

    /// Submit one check request under the given access token
    async fn submit_check(
        &self,
        token: &AccessToken,
        request: &CheckRequest,
    ) -> Result<CheckResponse>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInBody<'a> {
    token: &'a str,
    username: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    access_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitCheckBody<'a> {
    content: &'a str,
    file_path: String,
    batch_id: Option<&'a str>,
    check_mode: &'a str,
}

/// reqwest-backed implementation of [`CheckService`]
pub struct CheckClient {
    http: reqwest::Client,
    config: RemoteConfig,
}

impl CheckClient {
    /// Create a client for the given remote configuration
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Map a non-success response onto the tagged error taxonomy
    async fn classify_error(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();

        match status {
            401 | 403 => Error::Auth(if message.is_empty() {
                format!("remote service returned {status}")
            } else {
                message
            }),
            429 => Error::RateLimited(if message.is_empty() {
                "remote service returned 429".to_string()
            } else {
                message
            }),
            500..=599 => Error::Server { status, message },
            _ => Error::Remote { status, message },
        }
    }
}

#[async_trait]
impl CheckService for CheckClient {
    async fn sign_in(&self) -> Result<AccessToken> {
        let response = self
            .http
            .post(self.endpoint("auth/sign-in"))
            .header("X-Client-Signature", &self.config.client_signature)
            .json(&SignInBody {
                token: &self.config.api_token,
                username: &self.config.username,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_error(response).await);
        }

        let body: SignInResponse = response.json().await?;
        tracing::debug!(username = %self.config.username, "Signed in to check service");
        Ok(AccessToken(body.access_token))
    }

    async fn submit_check(
        &self,
        token: &AccessToken,
        request: &CheckRequest,
    ) -> Result<CheckResponse> {
        let check_mode = match request.check_mode {
            CheckMode::Automated => "automated",
            CheckMode::Batch => "batch",
        };

        let response = self
            .http
            .post(self.endpoint("checks"))
            .bearer_auth(&token.0)
            .header("X-Client-Signature", &self.config.client_signature)
            .json(&SubmitCheckBody {
                content: &request.content,
                file_path: request.file_path.display().to_string(),
                batch_id: request.batch_id.as_deref(),
                check_mode,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_error(response).await);
        }

        let body: CheckResponse = response.json().await?;
        tracing::debug!(
            file = %request.file_path.display(),
            check_id = %body.id,
            quality_status = body.quality_status.as_deref().unwrap_or("unknown"),
            "Check submitted"
        );
        Ok(body)
    }
}
