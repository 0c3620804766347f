//! Backend endpoints consumed by the funnel.
//!
//! Components talk to the backend through the [`FunnelApi`] trait so the
//! state machines can be driven against stubs; [`HttpApi`] is the real
//! transport.

pub mod http;
pub mod types;

pub use http::HttpApi;
pub use types::*;

use async_trait::async_trait;

use crate::error::ApiError;

/// The three backend endpoints the funnel calls.
#[async_trait]
pub trait FunnelApi: Send + Sync {
    /// `POST /api/onboarding`. Non-2xx responses are errors.
    async fn submit_onboarding(
        &self,
        submission: &OnboardingSubmission,
    ) -> Result<OnboardingReceipt, ApiError>;

    /// `POST /api/chat`.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;

    /// `POST /api/auth/login`. Only transport failures are errors; a
    /// rejected login is a [`LoginResponse::Rejected`].
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
}
