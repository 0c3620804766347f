//! `reqwest` transport for the funnel endpoints.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::FunnelApi;
use super::types::{
    ChatReply, ChatRequest, ErrorDetail, LoginRequest, LoginResponse, OnboardingReceipt,
    OnboardingSubmission,
};
use crate::config::FunnelConfig;
use crate::error::ApiError;

const ONBOARDING_PATH: &str = "/api/onboarding";
const CHAT_PATH: &str = "/api/chat";
const LOGIN_PATH: &str = "/api/auth/login";

/// HTTP client for the funnel backend.
pub struct HttpApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(config: &FunnelConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed {
                endpoint: config.base_url.clone(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Post `body` and decode a 2xx JSON response; anything else is an error.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self.post(path, body).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(endpoint = path, status = status.as_u16(), body = %body, "Backend rejected request");
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }
        resp.json::<R>().await.map_err(|e| ApiError::InvalidResponse {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl FunnelApi for HttpApi {
    async fn submit_onboarding(
        &self,
        submission: &OnboardingSubmission,
    ) -> Result<OnboardingReceipt, ApiError> {
        self.post_json(ONBOARDING_PATH, submission).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        self.post_json(CHAT_PATH, request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let resp = self.post(LOGIN_PATH, request).await?;
        if resp.status() == reqwest::StatusCode::OK {
            return Ok(LoginResponse::Accepted);
        }

        let status = resp.status();
        // Error bodies are optional; an unreadable one just has no detail.
        let detail = resp
            .json::<ErrorDetail>()
            .await
            .ok()
            .and_then(|body| body.detail);
        tracing::info!(status = status.as_u16(), "Login rejected");
        Ok(LoginResponse::Rejected { detail })
    }
}
