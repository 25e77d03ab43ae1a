//! Retrieval-augmented answering: prompt assembly and query types

pub mod prompt;
mod query;

pub use prompt::{
    build_context, format_answer, number_sources, recent_history, system_rules, NumberedSource,
    PromptParts, DEFAULT_HISTORY_LIMIT, NO_DOCUMENTS_MESSAGE, REFUSAL_SENTENCE,
};
pub use query::{QueryRequest, RagAnswer, SourceRef};
