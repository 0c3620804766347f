//! Character-by-character reveal of bot messages.
//!
//! A [`Reveal`] is a lazy sequence of growing prefixes of a message; the
//! [`Typewriter`] plays a whole [`Turn`] onto a [`ChatView`], yielding to the
//! runtime between characters. Hosts queue turns through a [`Playback`] so
//! only one reveal is ever writing to the view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::view::{ChatView, Sender};

/// How a bot message is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Revealed one character at a time.
    Typed,
    /// Shown all at once.
    Instant,
}

/// A bot message produced by the chat engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotMessage {
    pub text: String,
    pub delivery: Delivery,
}

impl BotMessage {
    pub fn typed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delivery: Delivery::Typed,
        }
    }

    pub fn instant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delivery: Delivery::Instant,
        }
    }
}

/// Everything one engine event wants shown, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    /// The user's own message, echoed into the transcript first.
    pub user: Option<String>,
    pub messages: Vec<BotMessage>,
}

impl Turn {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.messages.is_empty()
    }
}

/// Growing prefixes of a message, one character longer each step.
///
/// Finite; clone it before consuming to play the same text again.
#[derive(Debug, Clone)]
pub struct Reveal<'a> {
    text: &'a str,
    end: usize,
}

impl<'a> Reveal<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, end: 0 }
    }
}

impl<'a> Iterator for Reveal<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.text.get(self.end..)?;
        let ch = rest.chars().next()?;
        self.end += ch.len_utf8();
        Some(&self.text[..self.end])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.text[self.end..].chars().count();
        (remaining, Some(remaining))
    }
}

/// Plays turns onto a chat view.
#[derive(Clone)]
pub struct Typewriter {
    view: Arc<dyn ChatView>,
    delay: Duration,
}

impl Typewriter {
    pub fn new(view: Arc<dyn ChatView>, delay: Duration) -> Self {
        Self { view, delay }
    }

    /// Show a turn. Bot messages are played strictly one after another, so a
    /// typed message finishes before the next message of the same turn.
    pub async fn play(&self, turn: &Turn) {
        if let Some(user) = &turn.user {
            self.view.append(Sender::User, user);
        }
        for message in &turn.messages {
            match message.delivery {
                Delivery::Instant => self.view.append(Sender::Bot, &message.text),
                Delivery::Typed => self.type_out(&message.text).await,
            }
        }
    }

    /// Move the typewriter onto a background task that plays queued turns
    /// in arrival order. The task ends once every [`Playback`] is dropped and
    /// the queue has drained.
    pub fn spawn(self) -> (Playback, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Turn>();
        let handle = tokio::spawn(async move {
            while let Some(turn) = rx.recv().await {
                self.play(&turn).await;
            }
            tracing::debug!("Playback queue closed");
        });
        (Playback { tx }, handle)
    }

    async fn type_out(&self, text: &str) {
        self.view.begin_reveal();
        for partial in Reveal::new(text) {
            self.view.update_reveal(partial);
            if self.delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}

/// Queue feeding a spawned [`Typewriter`].
#[derive(Clone)]
pub struct Playback {
    tx: mpsc::UnboundedSender<Turn>,
}

impl Playback {
    /// Queue `turn` behind whatever is still being revealed.
    pub fn enqueue(&self, turn: Turn) {
        if turn.is_empty() {
            return;
        }
        if self.tx.send(turn).is_err() {
            tracing::warn!("Playback task stopped; dropping turn");
        }
    }
}
