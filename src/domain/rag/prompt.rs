//! Context, instruction and answer assembly for retrieval-augmented queries

use crate::domain::knowledge_base::ScoredChunk;
use crate::domain::llm::{CompletionInput, Message};

/// Returned verbatim when a knowledge base has nothing to retrieve
pub const NO_DOCUMENTS_MESSAGE: &str =
    "No documents found in this knowledge base. Please upload PDF documents first.";

/// Sentence the model must answer with when the context lacks the answer
pub const REFUSAL_SENTENCE: &str = "I don't have that information in the uploaded documents.";

/// Default number of prior turns forwarded to the model
pub const DEFAULT_HISTORY_LIMIT: usize = 12;

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// A retrieved chunk with its 1-based citation number
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedSource {
    pub index: usize,
    pub label: String,
    pub score: f32,
    pub content: String,
}

/// Number sources in retrieval order, starting at 1
pub fn number_sources(results: &[ScoredChunk]) -> Vec<NumberedSource> {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| NumberedSource {
            index: i + 1,
            label: result.chunk.source_label(),
            score: result.score,
            content: result.chunk.content.clone(),
        })
        .collect()
}

pub fn build_context(sources: &[NumberedSource]) -> String {
    sources
        .iter()
        .map(|s| {
            format!(
                "### Source {} (score={:.4}): {}\n\n{}",
                s.index, s.score, s.label, s.content
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Fixed answering rules, preceded by knowledge-base instructions when given
pub fn system_rules(instructions: Option<&str>) -> String {
    let mut rules = Vec::with_capacity(5);

    if let Some(instructions) = instructions.map(str::trim).filter(|i| !i.is_empty()) {
        rules.push(format!("Knowledge base instructions:\n{}", instructions));
    }

    rules.push(
        "You are a RAG assistant. Answer using ONLY the provided CONTEXT and the conversation history."
            .to_string(),
    );
    rules.push(format!(
        "If the answer is not in the context, respond exactly: \"{}\" Do not guess.",
        REFUSAL_SENTENCE
    ));
    rules.push("Return the answer in Markdown ONLY.".to_string());
    rules.push(
        "Include a short \"Sources\" section listing which Source numbers you used.".to_string(),
    );

    rules.join("\n\n")
}

/// The most recent `limit` non-blank turns, oldest first
pub fn recent_history(history: &[Message], limit: usize) -> Vec<Message> {
    let turns: Vec<&Message> = history.iter().filter(|m| !m.is_blank()).collect();
    let skip = turns.len().saturating_sub(limit);

    turns.into_iter().skip(skip).cloned().collect()
}

/// Everything the model sees for one question
#[derive(Debug, Clone)]
pub struct PromptParts {
    pub system: String,
    pub history: Vec<Message>,
    pub context: String,
    pub question: String,
}

impl PromptParts {
    /// System rules, prior turns, then one user turn carrying context and question
    pub fn to_messages(&self) -> CompletionInput {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::system(&self.system));
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(format!(
            "CONTEXT:\n\n{}\n\nUSER QUESTION:\n{}\n\nRemember: output Markdown.",
            self.context, self.question
        )));

        CompletionInput::Messages(messages)
    }

    /// The same content flattened into one prompt for providers that reject structured input
    pub fn to_plain_text(&self) -> CompletionInput {
        let mut sections = vec![self.system.clone()];

        if !self.history.is_empty() {
            let transcript = self
                .history
                .iter()
                .map(|m| format!("{}: {}", m.role.as_str(), m.content))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("CONVERSATION HISTORY:\n{}", transcript));
        }

        sections.push(format!("CONTEXT:\n\n{}", self.context));
        sections.push(format!("QUESTION: {}", self.question));
        sections.push("Return the answer in Markdown.".to_string());

        CompletionInput::Prompt(sections.join("\n\n"))
    }
}

/// Append the Sources list, using the same numbering as the context block
pub fn format_answer(raw: &str, sources: &[NumberedSource]) -> String {
    let answer = raw.trim_end();

    if sources.is_empty() {
        return answer.to_string();
    }

    let lines = sources
        .iter()
        .map(|s| format!("- Source {}: {}", s.index, s.label))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\nSources:\n{}", answer, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge_base::{KnowledgeBaseId, StoredChunk};
    use crate::domain::llm::MessageRole;
    use serde_json::json;
    use uuid::Uuid;

    fn scored(content: &str, metadata: serde_json::Value, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: StoredChunk {
                id: Uuid::new_v4(),
                knowledge_base_id: KnowledgeBaseId::new("kb1").unwrap(),
                content: content.to_string(),
                metadata: metadata.as_object().cloned().unwrap_or_default(),
            },
            score,
        }
    }

    fn sources() -> Vec<NumberedSource> {
        number_sources(&[
            scored("Alpha text", json!({"fileName": "a.pdf", "documentId": "d1"}), 0.91234),
            scored("Beta text", json!({}), 0.5),
        ])
    }

    #[test]
    fn test_sources_numbered_from_one() {
        let sources = sources();
        assert_eq!(sources[0].index, 1);
        assert_eq!(sources[0].label, "a.pdf | documentId=d1");
        assert_eq!(sources[1].index, 2);
        assert_eq!(sources[1].label, "unknown");
    }

    #[test]
    fn test_context_blocks() {
        let context = build_context(&sources());
        assert_eq!(
            context,
            "### Source 1 (score=0.9123): a.pdf | documentId=d1\n\nAlpha text\n\n---\n\n### Source 2 (score=0.5000): unknown\n\nBeta text"
        );
    }

    #[test]
    fn test_system_rules_with_instructions_first() {
        let rules = system_rules(Some("Answer in Spanish."));
        assert!(rules.starts_with("Knowledge base instructions:\nAnswer in Spanish."));
        assert!(rules.contains(REFUSAL_SENTENCE));
        assert!(rules.contains("Markdown ONLY"));
        assert!(rules.contains("\"Sources\""));
    }

    #[test]
    fn test_system_rules_ignore_blank_instructions() {
        let rules = system_rules(Some("   "));
        assert!(rules.starts_with("You are a RAG assistant."));
        assert_eq!(system_rules(None), rules);
    }

    #[test]
    fn test_recent_history_keeps_last_turns_in_order() {
        let history: Vec<Message> = (0..20)
            .map(|i| Message::user(format!("turn {}", i)))
            .collect();

        let recent = recent_history(&history, 12);

        assert_eq!(recent.len(), 12);
        assert_eq!(recent[0].content, "turn 8");
        assert_eq!(recent[11].content, "turn 19");
    }

    #[test]
    fn test_recent_history_skips_blank_turns() {
        let history = vec![
            Message::user("question"),
            Message::assistant(""),
            Message::assistant("answer"),
        ];

        let recent = recent_history(&history, 12);

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].content, "answer");
    }

    fn parts() -> PromptParts {
        PromptParts {
            system: system_rules(None),
            history: vec![Message::user("hi"), Message::assistant("hello")],
            context: build_context(&sources()),
            question: "What is alpha?".to_string(),
        }
    }

    #[test]
    fn test_structured_messages_order() {
        let CompletionInput::Messages(messages) = parts().to_messages() else {
            panic!("expected structured input");
        };

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "hi");
        assert_eq!(messages[2].role, MessageRole::Assistant);
        assert_eq!(messages[3].role, MessageRole::User);
        assert!(messages[3].content.starts_with("CONTEXT:\n\n### Source 1"));
        assert!(messages[3].content.contains("USER QUESTION:\nWhat is alpha?"));
    }

    #[test]
    fn test_plain_text_contains_everything() {
        let CompletionInput::Prompt(prompt) = parts().to_plain_text() else {
            panic!("expected plain prompt");
        };

        assert!(prompt.starts_with("You are a RAG assistant."));
        assert!(prompt.contains("user: hi\nassistant: hello"));
        assert!(prompt.contains("### Source 2 (score=0.5000): unknown"));
        assert!(prompt.contains("QUESTION: What is alpha?"));
    }

    #[test]
    fn test_format_answer_appends_sources() {
        let answer = format_answer("Alpha is first.\n", &sources());
        assert_eq!(
            answer,
            "Alpha is first.\n\nSources:\n- Source 1: a.pdf | documentId=d1\n- Source 2: unknown"
        );
    }

    #[test]
    fn test_format_answer_without_sources() {
        assert_eq!(format_answer("Nothing", &[]), "Nothing");
    }
}
