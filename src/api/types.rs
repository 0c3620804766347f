//! Request and response bodies for the funnel's backend endpoints.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::model::{ChatTurn, OnboardingData};

/// Merged onboarding record posted to `/api/onboarding`.
///
/// Serializes as the flat field map with chat answers nested under
/// `chat_qualificacao`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OnboardingSubmission {
    #[serde(flatten)]
    pub fields: OnboardingData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_qualificacao: Option<BTreeMap<String, String>>,
}

/// Response of `/api/onboarding`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingReceipt {
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Body of `/api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatTurn>,
}

/// Response of `/api/chat`. A missing reply means nothing to display.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
}

/// Body of `/api/auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "expose_password")]
    pub password: SecretString,
}

fn expose_password<S: Serializer>(password: &SecretString, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(password.expose_secret())
}

/// How the backend answered a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResponse {
    /// Status 200.
    Accepted,
    /// Any other status, with the `detail` field when the body carried one.
    Rejected { detail: Option<String> },
}

/// Error body shape used by the backend for rejected requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}
