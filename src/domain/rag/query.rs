//! Query inputs and answers

use serde::{Deserialize, Serialize};

use super::prompt::NumberedSource;
use crate::domain::llm::ConversationTurn;

/// A question against one knowledge base
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub prompt_instructions: Option<String>,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.prompt_instructions = Some(instructions.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }
}

/// Citation entry returned next to the answer text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub index: usize,
    pub label: String,
    pub score: f32,
}

impl From<&NumberedSource> for SourceRef {
    fn from(source: &NumberedSource) -> Self {
        Self {
            index: source.index,
            label: source.label.clone(),
            score: source.score,
        }
    }
}

/// Final answer, with the Sources section already appended to `answer`
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

impl RagAnswer {
    pub fn no_documents() -> Self {
        Self {
            answer: super::prompt::NO_DOCUMENTS_MESSAGE.to_string(),
            sources: Vec::new(),
        }
    }
}
