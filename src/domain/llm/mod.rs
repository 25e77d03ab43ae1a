//! Chat/completion domain types

mod message;
mod params;

pub use message::{ConversationTurn, Message, MessageRole};
pub use params::GenerationParams;

/// What a completion call is given: a structured conversation or one flattened prompt
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionInput {
    Messages(Vec<Message>),
    Prompt(String),
}

impl CompletionInput {
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Messages(_) => "structured",
            Self::Prompt(_) => "plain_text",
        }
    }
}
