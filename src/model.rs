//! Funnel records shared through the session store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::SessionKey;

/// Contact details captured on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
}

impl CheckoutData {
    /// Non-blank email, if captured.
    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// Non-blank WhatsApp number, if captured.
    pub fn whatsapp(&self) -> Option<&str> {
        non_blank(self.whatsapp.as_deref())
    }

    /// Look up a contact field by its form name.
    pub fn contact(&self, field: &str) -> Option<&str> {
        match field {
            "email" => self.email(),
            "whatsapp" => self.whatsapp(),
            _ => None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A single form value: free text or an ordered multi-selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Whether the value counts as empty for validation and precedence.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Multi(values) => values.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Multi(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// Snapshot of the onboarding form, keyed by field name.
pub type OnboardingData = BTreeMap<String, FieldValue>;

/// Cursor and answers of the scripted chat flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatState {
    pub stage: u8,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the chat history sent to the assistant endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chronological chat history.
pub type ChatHistory = Vec<ChatTurn>;

/// Session keys for the four funnel records.
pub mod session_keys {
    use super::*;

    /// Checkout contact record.
    pub const CHECKOUT: SessionKey<CheckoutData> = SessionKey::new("checkout");
    /// Latest onboarding form snapshot.
    pub const ONBOARDING: SessionKey<OnboardingData> = SessionKey::new("onboardingData");
    /// Scripted chat cursor and answers.
    pub const CHAT_STATE: SessionKey<ChatState> = SessionKey::new("chatQuali");
    /// Chat history sent to the assistant.
    pub const CHAT_HISTORY: SessionKey<ChatHistory> = SessionKey::new("chatHistory");

    /// Every key the funnel owns; cleared together on success.
    pub const ALL: [&str; 4] = [
        CHECKOUT.name(),
        ONBOARDING.name(),
        CHAT_STATE.name(),
        CHAT_HISTORY.name(),
    ];
}
