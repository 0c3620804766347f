//! Persistence layer: session-scoped key-value storage shared by every
//! funnel component.

pub mod file;
pub mod memory;
pub mod session;
pub mod traits;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use session::{Session, SessionKey};
pub use traits::SessionStore;
