//! Chat qualification: a scripted dialogue that collects the lead's
//! answers stage by stage, then falls through to freeform assistant chat.

pub mod engine;
pub mod reveal;
pub mod script;

pub use engine::{ChatEngine, ChatPhase};
pub use reveal::{BotMessage, Delivery, Playback, Reveal, Turn, Typewriter};
pub use script::{FREEFORM_STAGE, is_closing_intent};
