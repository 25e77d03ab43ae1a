use serde::{Deserialize, Serialize};

/// Generation parameters; `None` means "use the provider default" and is never sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl GenerationParams {
    /// Stop sequences, treating an empty list as absent
    pub fn stop(&self) -> Option<&[String]> {
        self.stop_sequences
            .as_deref()
            .filter(|stops| !stops.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serializes_empty() {
        let json = serde_json::to_value(GenerationParams::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_empty_stop_list_is_absent() {
        let params = GenerationParams {
            stop_sequences: Some(vec![]),
            ..Default::default()
        };
        assert!(params.stop().is_none());
    }
}
