use little_chat_model::{ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

use crate::GeminiConfig;

// -----------
// Shared types
// -----------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: Option<String>,
}

impl Candidate {
    /// Concatenates the text parts of this candidate.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .flat_map(|content| &content.parts)
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &GeminiConfig,
) -> GenerateContentRequest {
    let generation_config =
        if config.temperature.is_none() && config.max_output_tokens.is_none() {
            None
        } else {
            Some(GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            })
        };
    GenerateContentRequest {
        contents: req.messages.iter().map(create_content).collect(),
        generation_config,
    }
}

#[inline]
fn create_content(msg: &ModelMessage) -> Content {
    Content {
        role: Some(msg.role().to_owned()),
        parts: vec![Part {
            text: Some(msg.text().to_owned()),
        }],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::GeminiConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::User("Hello, I have 2 dogs.".to_owned()),
                ModelMessage::Model("Great to meet you.".to_owned()),
                ModelMessage::User("How many paws?".to_owned()),
            ],
        };
        let config = GeminiConfigBuilder::with_api_key("xxx")
            .with_temperature(0.5)
            .build();
        let body = serde_json::to_value(create_request(&request, &config))
            .unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "Hello, I have 2 dogs." }] },
                    { "role": "model", "parts": [{ "text": "Great to meet you." }] },
                    { "role": "user", "parts": [{ "text": "How many paws?" }] }
                ],
                "generationConfig": { "temperature": 0.5 }
            })
        );
    }

    #[test]
    fn test_omits_empty_generation_config() {
        let config = GeminiConfigBuilder::with_api_key("xxx").build();
        let body = serde_json::to_value(create_request(
            &ModelRequest::with_prompt("Hi"),
            &config,
        ))
        .unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_parse_chunk() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Two " }, { "text": "dogs" }]
                },
                "finishReason": "STOP",
                "index": 0
            }],
            "usageMetadata": { "promptTokenCount": 4 }
        }))
        .unwrap();
        assert_eq!(chunk.candidates[0].text(), "Two dogs");
        assert_eq!(chunk.candidates[0].finish_reason.as_deref(), Some("STOP"));
        assert!(chunk.prompt_feedback.is_none());
    }
}
