//! Login form: forwards credentials and reports the outcome.
//!
//! Credential checking happens on the backend; this only validates that both
//! fields were filled and maps the response to a route or a message.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::api::{FunnelApi, LoginRequest, LoginResponse};
use crate::view::LoginView;

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Preencha email e senha.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Credenciais inválidas.";
pub const CONNECTION_ERROR_MESSAGE: &str = "Erro de conexão.";

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Navigated to the contained route.
    LoggedIn(String),
    /// The user was shown the contained message.
    Failed(String),
}

pub struct LoginForm {
    api: Arc<dyn FunnelApi>,
    view: Arc<dyn LoginView>,
    dashboard_route: String,
}

impl LoginForm {
    pub fn new(api: Arc<dyn FunnelApi>, view: Arc<dyn LoginView>, dashboard_route: &str) -> Self {
        Self {
            api,
            view,
            dashboard_route: dashboard_route.to_string(),
        }
    }

    pub async fn submit(&self, email: &str, password: SecretString) -> LoginOutcome {
        let email = email.trim();
        let password = SecretString::from(password.expose_secret().trim());
        if email.is_empty() || password.expose_secret().is_empty() {
            return self.fail(MISSING_CREDENTIALS_MESSAGE);
        }

        let request = LoginRequest {
            email: email.to_string(),
            password,
        };
        match self.api.login(&request).await {
            Ok(LoginResponse::Accepted) => {
                tracing::info!("Login accepted");
                self.view.navigate(&self.dashboard_route);
                LoginOutcome::LoggedIn(self.dashboard_route.clone())
            }
            Ok(LoginResponse::Rejected { detail }) => {
                let message = detail
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string());
                self.fail(&message)
            }
            Err(e) => {
                tracing::warn!("Login request failed: {}", e);
                self.fail(CONNECTION_ERROR_MESSAGE)
            }
        }
    }

    fn fail(&self, message: &str) -> LoginOutcome {
        self.view.show_error(message);
        LoginOutcome::Failed(message.to_string())
    }
}
