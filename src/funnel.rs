//! Funnel coordinator: builds each page's component over the shared
//! session and runs the success-route cleanup.

use std::sync::Arc;

use crate::api::FunnelApi;
use crate::chat::ChatEngine;
use crate::checkout::CheckoutCapture;
use crate::config::FunnelConfig;
use crate::login::LoginForm;
use crate::model::session_keys;
use crate::store::{Session, SessionStore};
use crate::view::{LoginView, WizardView};
use crate::wizard::{FormSchema, OnboardingWizard};

/// Pages of the funnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Checkout,
    Onboarding,
    Success,
    Login,
    Dashboard,
    Other(String),
}

/// Ensure a path starts with `/`.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Owns the session, the backend client and the chat widget, which
/// is present on every funnel page.
pub struct Funnel {
    session: Session,
    api: Arc<dyn FunnelApi>,
    config: FunnelConfig,
    chat: ChatEngine,
}

impl Funnel {
    pub fn new(store: Arc<dyn SessionStore>, api: Arc<dyn FunnelApi>, config: FunnelConfig) -> Self {
        let session = Session::new(store);
        let chat = ChatEngine::new(session.clone(), api.clone());
        Self {
            session,
            api,
            config,
            chat,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    pub fn chat(&mut self) -> &mut ChatEngine {
        &mut self.chat
    }

    /// Classify `path`.
    pub fn route(&self, path: &str) -> Route {
        let path = normalize_path(path);
        if path == self.config.success_route {
            return Route::Success;
        }
        if path == self.config.onboarding_route {
            return Route::Onboarding;
        }
        if path == self.config.dashboard_route {
            return Route::Dashboard;
        }
        match path.as_str() {
            "/" => Route::Landing,
            "/checkout" => Route::Checkout,
            "/login" => Route::Login,
            _ => Route::Other(path),
        }
    }

    /// Enter a page. Reaching the success route ends the funnel.
    pub fn enter_route(&mut self, path: &str) -> Route {
        let route = self.route(path);
        tracing::debug!(?route, "Entered route");
        if route == Route::Success {
            self.finish();
        } else {
            // The widget's transcript is per page; everything else carries over.
            self.chat = ChatEngine::new(self.session.clone(), self.api.clone());
        }
        route
    }

    /// Remove every funnel record and reset the in-memory mirrors.
    pub fn finish(&mut self) {
        self.session.clear_all(&session_keys::ALL);
        self.chat.reset();
        tracing::info!("Funnel finished; session cleared");
    }

    pub fn checkout(&self) -> CheckoutCapture {
        CheckoutCapture::new(self.session.clone(), &self.config.onboarding_route)
    }

    pub fn wizard(&self, schema: FormSchema, view: Arc<dyn WizardView>) -> OnboardingWizard {
        OnboardingWizard::new(
            self.session.clone(),
            self.api.clone(),
            view,
            schema,
            &self.config,
        )
    }

    pub fn login(&self, view: Arc<dyn LoginView>) -> LoginForm {
        LoginForm::new(self.api.clone(), view, &self.config.dashboard_route)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::api::{
        ChatReply, ChatRequest, LoginRequest, LoginResponse, OnboardingReceipt,
        OnboardingSubmission,
    };
    use crate::error::ApiError;
    use crate::model::{ChatState, ChatTurn, CheckoutData, FieldValue, OnboardingData};
    use crate::store::MemorySessionStore;
    use crate::view::testing::RecordingWizardView;

    struct EchoApi;

    #[async_trait]
    impl FunnelApi for EchoApi {
        async fn submit_onboarding(
            &self,
            _submission: &OnboardingSubmission,
        ) -> Result<OnboardingReceipt, ApiError> {
            Ok(OnboardingReceipt { redirect: None })
        }
        async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
            Ok(ChatReply {
                reply: Some(format!("eco: {}", request.message)),
            })
        }
        async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, ApiError> {
            Ok(LoginResponse::Accepted)
        }
    }

    fn funnel() -> (Arc<MemorySessionStore>, Funnel) {
        let store = Arc::new(MemorySessionStore::new());
        let funnel = Funnel::new(store.clone(), Arc::new(EchoApi), FunnelConfig::default());
        (store, funnel)
    }

    #[test]
    fn normalize_adds_leading_slash() {
        assert_eq!(normalize_path("success"), "/success");
        assert_eq!(normalize_path("/success"), "/success");
    }

    #[test]
    fn routes_are_classified() {
        let (_, funnel) = funnel();
        assert_eq!(funnel.route("/"), Route::Landing);
        assert_eq!(funnel.route("checkout"), Route::Checkout);
        assert_eq!(funnel.route("/onboarding"), Route::Onboarding);
        assert_eq!(funnel.route("/success"), Route::Success);
        assert_eq!(funnel.route("/dashboard"), Route::Dashboard);
        assert_eq!(funnel.route("/precos"), Route::Other("/precos".to_string()));
    }

    #[test]
    fn success_route_clears_all_four_records() {
        let (store, mut funnel) = funnel();
        let session = funnel.session().clone();
        session.save(
            session_keys::CHECKOUT,
            &CheckoutData {
                email: Some("a@x.com".to_string()),
                whatsapp: None,
            },
        );
        let mut onboarding = OnboardingData::new();
        onboarding.insert("nome".to_string(), FieldValue::from("Ana"));
        session.save(session_keys::ONBOARDING, &onboarding);
        session.save(session_keys::CHAT_STATE, &ChatState { stage: 7, ..Default::default() });
        session.save(session_keys::CHAT_HISTORY, &vec![ChatTurn::user("oi")]);
        store.set("unrelated", "1".to_string()).unwrap();

        assert_eq!(funnel.enter_route("/success"), Route::Success);

        for key in session_keys::ALL {
            assert!(store.get(key).is_none(), "{key} should be cleared");
        }
        assert_eq!(store.get("unrelated").as_deref(), Some("1"));
        assert_eq!(funnel.chat().state(), &ChatState::default());
        assert!(funnel.chat().history().is_empty());
    }

    #[tokio::test]
    async fn full_funnel_walkthrough() {
        let (store, mut funnel) = funnel();

        funnel.enter_route("/checkout");
        let next = funnel.checkout().submit("a@x.com", "5511999990000");
        assert_eq!(funnel.enter_route(&next), Route::Onboarding);

        funnel.chat().toggle();
        funnel.chat().submit("começando do zero").await;
        assert_eq!(funnel.chat().stage(), 2);

        let view = Arc::new(RecordingWizardView::default());
        let mut wizard = funnel.wizard(FormSchema::landing(), view);
        assert_eq!(wizard.form().text("email"), "a@x.com");
        wizard.set_text("nome", "Ana").unwrap();
        wizard.next();
        wizard.set_text("empresa", "Loja da Ana").unwrap();
        wizard.set_text("segmento", "loja").unwrap();
        wizard.next();
        wizard.set_text("volume", "50").unwrap();
        wizard.next();
        wizard.set_text("urgencia", "agora").unwrap();

        let redirect = wizard.submit().await.unwrap();
        assert_eq!(funnel.enter_route(&redirect), Route::Success);
        assert!(store.is_empty());
    }
}
