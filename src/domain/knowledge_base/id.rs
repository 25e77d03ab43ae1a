//! Knowledge base identifier

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Maximum length for knowledge base IDs (fits a hyphenated UUID with room to spare)
pub const MAX_KB_ID_LENGTH: usize = 64;

/// Alphanumeric start and end, hyphens and underscores in between
static KB_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9_-]*[a-zA-Z0-9])?$").expect("valid KB id pattern")
});

/// Knowledge base id validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeBaseIdError {
    Empty,
    TooLong { length: usize, max: usize },
    InvalidFormat { id: String },
}

impl fmt::Display for KnowledgeBaseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Knowledge base ID cannot be empty"),
            Self::TooLong { length, max } => write!(
                f,
                "Knowledge base ID too long: {} characters (max {})",
                length, max
            ),
            Self::InvalidFormat { id } => write!(
                f,
                "Invalid knowledge base ID format '{}': must be alphanumeric with hyphens or underscores",
                id
            ),
        }
    }
}

impl std::error::Error for KnowledgeBaseIdError {}

impl From<KnowledgeBaseIdError> for DomainError {
    fn from(err: KnowledgeBaseIdError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Partition key for every chunk stored in the vector store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KnowledgeBaseId(String);

impl KnowledgeBaseId {
    pub fn new(id: impl Into<String>) -> Result<Self, KnowledgeBaseIdError> {
        let id = id.into();

        if id.is_empty() {
            return Err(KnowledgeBaseIdError::Empty);
        }

        if id.len() > MAX_KB_ID_LENGTH {
            return Err(KnowledgeBaseIdError::TooLong {
                length: id.len(),
                max: MAX_KB_ID_LENGTH,
            });
        }

        if !KB_ID_PATTERN.is_match(&id) {
            return Err(KnowledgeBaseIdError::InvalidFormat { id });
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KnowledgeBaseId {
    type Error = KnowledgeBaseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KnowledgeBaseId> for String {
    fn from(id: KnowledgeBaseId) -> Self {
        id.0
    }
}

impl fmt::Display for KnowledgeBaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
