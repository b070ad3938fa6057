//! Conversation log and the streaming controller that owns it

mod controller;
mod event;
mod message;


pub use controller::{ConversationController, Disposition, OpenSession};
pub use event::{SessionId, StreamEvent, StreamOutcome};
pub use message::{ConversationSnapshot, Message, Role};

#[cfg(test)]
pub use event::StreamEventKind;
#[cfg(test)]
pub use message::MessageKind;
