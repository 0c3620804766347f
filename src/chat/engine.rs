//! ChatEngine: drives the scripted stages, then hands off to the assistant.

use std::sync::Arc;

use super::reveal::{BotMessage, Turn};
use super::script::{
    FAILURE_MESSAGE, FREEFORM_STAGE, GREETING, PURCHASE_CLOSING, SCRIPT_CLOSING,
    field_for_stage, is_closing_intent, prompt_for_stage,
};
use crate::api::{ChatRequest, FunnelApi};
use crate::model::{ChatHistory, ChatState, ChatTurn, session_keys};
use crate::store::Session;
use crate::view::Sender;

/// Which half of the dialogue the engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    /// Widget never opened this session.
    Dormant,
    /// Asking the scripted qualification questions.
    Scripted,
    /// Forwarding messages to the assistant.
    Freeform,
}

impl ChatPhase {
    pub fn for_stage(stage: u8) -> Self {
        match stage {
            0 => Self::Dormant,
            s if s < FREEFORM_STAGE => Self::Scripted,
            _ => Self::Freeform,
        }
    }
}

/// The chat widget's state machine.
///
/// `ChatState` and `ChatHistory` are mirrored in memory and written through
/// to the session on every change. The visible transcript is per page and
/// not persisted.
pub struct ChatEngine {
    session: Session,
    api: Arc<dyn FunnelApi>,
    state: ChatState,
    history: ChatHistory,
    transcript: Vec<(Sender, String)>,
    visible: bool,
}

impl ChatEngine {
    pub fn new(session: Session, api: Arc<dyn FunnelApi>) -> Self {
        let state = session.load(session_keys::CHAT_STATE);
        let history = session.load(session_keys::CHAT_HISTORY);
        tracing::debug!(stage = state.stage, turns = history.len(), "Chat engine loaded");
        Self {
            session,
            api,
            state,
            history,
            transcript: Vec::new(),
            visible: false,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn stage(&self) -> u8 {
        self.state.stage
    }

    pub fn phase(&self) -> ChatPhase {
        ChatPhase::for_stage(self.state.stage)
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Bubbles shown in this page's widget so far.
    pub fn transcript(&self) -> &[(Sender, String)] {
        &self.transcript
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Toggle the widget. Opening it on an empty transcript while dormant
    /// starts the scripted flow.
    pub fn toggle(&mut self) -> Turn {
        self.visible = !self.visible;
        if self.visible && self.transcript.is_empty() && self.state.stage == 0 {
            return self.start_flow();
        }
        Turn::default()
    }

    /// Hide the widget. Nothing else changes.
    pub fn close(&mut self) {
        self.visible = false;
    }

    /// Handle a message typed by the user.
    ///
    /// Blank messages are ignored. Every other message is recorded in the
    /// history before anything else happens.
    pub async fn submit(&mut self, message: &str) -> Turn {
        let message = message.trim();
        if message.is_empty() {
            return Turn::default();
        }

        self.record(Sender::User, message);
        self.history.push(ChatTurn::user(message));
        self.save_history();

        let mut turn = match self.phase() {
            ChatPhase::Dormant => self.start_flow(),
            ChatPhase::Scripted => self.answer(message),
            ChatPhase::Freeform => self.converse(message).await,
        };
        turn.user = Some(message.to_string());
        turn
    }

    /// Forget everything in memory. Persisted keys are left to the caller.
    pub fn reset(&mut self) {
        self.state = ChatState::default();
        self.history.clear();
        self.transcript.clear();
        self.visible = false;
    }

    /// Stage 0 → 1, with the greeting.
    fn start_flow(&mut self) -> Turn {
        self.state.stage = 1;
        self.save_state();
        tracing::info!("Chat qualification started");
        self.bot_turn(vec![BotMessage::typed(GREETING)])
    }

    /// Store a scripted answer and ask the next question.
    fn answer(&mut self, message: &str) -> Turn {
        let stage = self.state.stage;
        if let Some(field) = field_for_stage(stage) {
            self.state.data.insert(field.to_string(), message.to_string());
        }
        self.state.stage = stage + 1;
        self.save_state();
        tracing::debug!(from = stage, to = self.state.stage, "Chat stage advanced");

        let reply = match prompt_for_stage(self.state.stage) {
            Some(prompt) => prompt,
            None => {
                tracing::info!("Chat qualification complete");
                SCRIPT_CLOSING
            }
        };
        self.bot_turn(vec![BotMessage::typed(reply)])
    }

    /// Forward to the assistant with the full history.
    async fn converse(&mut self, message: &str) -> Turn {
        let request = ChatRequest {
            message: message.to_string(),
            history: self.history.clone(),
        };

        match self.api.chat(&request).await {
            Ok(reply) => {
                let mut messages = Vec::new();
                if let Some(text) = reply.reply.filter(|r| !r.is_empty()) {
                    self.history.push(ChatTurn::assistant(&text));
                    self.save_history();
                    messages.push(BotMessage::instant(text));
                }
                if is_closing_intent(message) {
                    tracing::info!("Closing intent detected");
                    messages.push(BotMessage::typed(PURCHASE_CLOSING));
                }
                self.bot_turn(messages)
            }
            Err(e) => {
                tracing::warn!("Chat endpoint failed: {}", e);
                self.bot_turn(vec![BotMessage::instant(FAILURE_MESSAGE)])
            }
        }
    }

    fn bot_turn(&mut self, messages: Vec<BotMessage>) -> Turn {
        for message in &messages {
            self.record(Sender::Bot, &message.text);
        }
        Turn {
            user: None,
            messages,
        }
    }

    fn record(&mut self, sender: Sender, text: &str) {
        self.transcript.push((sender, text.to_string()));
    }

    fn save_state(&self) {
        self.session.save(session_keys::CHAT_STATE, &self.state);
    }

    fn save_history(&self) {
        self.session.save(session_keys::CHAT_HISTORY, &self.history);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::api::{
        ChatReply, LoginRequest, LoginResponse, OnboardingReceipt, OnboardingSubmission,
    };
    use crate::chat::reveal::Delivery;
    use crate::error::ApiError;
    use crate::model::Role;
    use crate::store::MemorySessionStore;

    /// Replies with a fixed text (or nothing, or an error) and records requests.
    #[derive(Default)]
    struct StubAssistant {
        reply: Option<String>,
        fail: bool,
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl FunnelApi for StubAssistant {
        async fn submit_onboarding(
            &self,
            _submission: &OnboardingSubmission,
        ) -> Result<OnboardingReceipt, ApiError> {
            unimplemented!("not used in chat tests")
        }
        async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ApiError::RequestFailed {
                    endpoint: "/api/chat".to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Ok(ChatReply {
                reply: self.reply.clone(),
            })
        }
        async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, ApiError> {
            unimplemented!("not used in chat tests")
        }
    }

    fn engine_with(api: StubAssistant) -> (Session, Arc<StubAssistant>, ChatEngine) {
        let session = Session::new(Arc::new(MemorySessionStore::new()));
        let api = Arc::new(api);
        let engine = ChatEngine::new(session.clone(), api.clone());
        (session, api, engine)
    }

    const SCRIPTED_REPLIES: [&str; 6] = ["uso", "loja", "whatsapp", "20", "vendas", "esse mês"];

    async fn complete_script(engine: &mut ChatEngine) {
        engine.toggle();
        for reply in SCRIPTED_REPLIES {
            engine.submit(reply).await;
        }
    }

    #[test]
    fn opening_widget_greets_once() {
        let (session, _, mut engine) = engine_with(StubAssistant::default());
        assert_eq!(engine.phase(), ChatPhase::Dormant);

        let turn = engine.toggle();
        assert_eq!(turn.messages, vec![BotMessage::typed(GREETING)]);
        assert_eq!(engine.stage(), 1);
        assert_eq!(session.load(session_keys::CHAT_STATE).stage, 1);

        // Closing and reopening doesn't greet again
        assert!(engine.toggle().is_empty());
        assert!(engine.toggle().is_empty());
        assert_eq!(engine.stage(), 1);
    }

    #[tokio::test]
    async fn each_scripted_reply_advances_one_stage() {
        let (session, api, mut engine) = engine_with(StubAssistant::default());
        engine.toggle();

        for (k, reply) in SCRIPTED_REPLIES.iter().enumerate() {
            engine.submit(reply).await;
            let k = k + 1;
            assert_eq!(engine.stage() as usize, 1 + k);
            let stored = session.load(session_keys::CHAT_STATE);
            assert_eq!(stored.data.len(), k);
            for stage in 1..=k as u8 {
                assert!(stored.data.contains_key(field_for_stage(stage).unwrap()));
            }
        }
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scripted_flow_end_to_end() {
        let (session, api, mut engine) = engine_with(StubAssistant {
            reply: Some("Posso ajudar!".to_string()),
            ..Default::default()
        });

        engine.toggle();
        assert_eq!(engine.stage(), 1);

        let turn = engine.submit("uso").await;
        assert_eq!(engine.state().data["automacao"], "uso");
        assert_eq!(engine.stage(), 2);
        assert_eq!(turn.user.as_deref(), Some("uso"));
        assert_eq!(turn.messages[0].text, prompt_for_stage(2).unwrap());

        for reply in &SCRIPTED_REPLIES[1..5] {
            engine.submit(reply).await;
        }
        let turn = engine.submit("esse mês").await;
        assert_eq!(engine.state().data["urgencia"], "esse mês");
        assert_eq!(engine.stage(), FREEFORM_STAGE);
        assert_eq!(turn.messages, vec![BotMessage::typed(SCRIPT_CLOSING)]);
        assert_eq!(engine.phase(), ChatPhase::Freeform);

        // Next message goes to the assistant, not the script
        let turn = engine.submit("quanto custa?").await;
        assert_eq!(api.requests.lock().unwrap().len(), 1);
        assert_eq!(turn.messages, vec![BotMessage::instant("Posso ajudar!")]);
        assert_eq!(engine.stage(), FREEFORM_STAGE);
        assert_eq!(session.load(session_keys::CHAT_STATE).data.len(), 6);
    }

    #[tokio::test]
    async fn freeform_sends_entire_history() {
        let (session, api, mut engine) = engine_with(StubAssistant {
            reply: Some("claro".to_string()),
            ..Default::default()
        });
        complete_script(&mut engine).await;

        engine.submit("primeira").await;
        engine.submit("segunda").await;

        let requests = api.requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.message, "segunda");
        // Six scripted answers + first exchange + the new message
        assert_eq!(last.history.len(), 6 + 2 + 1);
        assert_eq!(last.history.last().unwrap(), &ChatTurn::user("segunda"));

        let stored = session.load(session_keys::CHAT_HISTORY);
        assert_eq!(stored.len(), 6 + 4);
        assert_eq!(stored.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn closing_intent_appends_scripted_close_after_reply() {
        let (_, _, mut engine) = engine_with(StubAssistant {
            reply: Some("Temos planos a partir de R$99".to_string()),
            ..Default::default()
        });
        complete_script(&mut engine).await;

        let turn = engine.submit("Quero ASSINAR").await;
        assert_eq!(
            turn.messages,
            vec![
                BotMessage::instant("Temos planos a partir de R$99"),
                BotMessage::typed(PURCHASE_CLOSING),
            ]
        );
    }

    #[tokio::test]
    async fn missing_reply_shows_nothing_but_keeps_closing() {
        let (session, _, mut engine) = engine_with(StubAssistant::default());
        complete_script(&mut engine).await;

        let turn = engine.submit("oi").await;
        assert!(turn.messages.is_empty());

        let turn = engine.submit("me manda o link").await;
        assert_eq!(turn.messages.len(), 1);
        assert_eq!(turn.messages[0].delivery, Delivery::Typed);

        let history = session.load(session_keys::CHAT_HISTORY);
        assert!(history.iter().all(|t| t.role == Role::User));
    }

    #[tokio::test]
    async fn endpoint_failure_apologizes_without_corrupting_state() {
        let (session, api, mut engine) = engine_with(StubAssistant {
            fail: true,
            ..Default::default()
        });
        complete_script(&mut engine).await;
        let state_before = session.load(session_keys::CHAT_STATE);

        let turn = engine.submit("quero contratar").await;
        assert_eq!(turn.messages, vec![BotMessage::instant(FAILURE_MESSAGE)]);
        assert_eq!(session.load(session_keys::CHAT_STATE), state_before);

        // The user turn is kept; a second attempt yields consecutive user turns
        engine.submit("quero contratar").await;
        let history = session.load(session_keys::CHAT_HISTORY);
        let tail: Vec<_> = history.iter().rev().take(2).map(|t| t.role).collect();
        assert_eq!(tail, [Role::User, Role::User]);
        assert_eq!(api.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_messages_are_ignored() {
        let (session, _, mut engine) = engine_with(StubAssistant::default());
        engine.toggle();
        assert!(engine.submit("   ").await.is_empty());
        assert_eq!(engine.stage(), 1);
        assert!(!session.contains(session_keys::CHAT_HISTORY));
    }

    #[tokio::test]
    async fn message_while_dormant_starts_flow_without_answering() {
        let (_, _, mut engine) = engine_with(StubAssistant::default());
        let turn = engine.submit("oi").await;
        assert_eq!(engine.stage(), 1);
        assert!(engine.state().data.is_empty());
        assert_eq!(turn.messages, vec![BotMessage::typed(GREETING)]);
    }

    #[tokio::test]
    async fn state_survives_navigation() {
        let (session, api, mut engine) = engine_with(StubAssistant::default());
        engine.toggle();
        engine.submit("uso").await;

        // A new page builds a new engine over the same session
        let mut next_page = ChatEngine::new(session.clone(), api);
        assert_eq!(next_page.stage(), 2);
        assert!(next_page.transcript().is_empty());
        // Reopening mid-flow doesn't restart the script
        assert!(next_page.toggle().is_empty());
        next_page.submit("loja").await;
        assert_eq!(next_page.state().data["segmento"], "loja");
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let (_, _, mut engine) = engine_with(StubAssistant::default());
        complete_script(&mut engine).await;
        engine.reset();
        assert_eq!(engine.state(), &ChatState::default());
        assert!(engine.history().is_empty());
        assert!(engine.transcript().is_empty());
        assert!(!engine.is_visible());
    }
}
