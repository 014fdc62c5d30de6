pub mod relay;
pub mod session;

pub use relay::{ChatError, ChatRelay, ChatTurn, DEFAULT_CONTEXT, DEFAULT_SYSTEM_MESSAGE, StreamEvent};
pub use session::{ConversationMessage, Session, SessionStore};
