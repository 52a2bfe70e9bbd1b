use serde::{Deserialize, Serialize};

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The conversation turns, oldest first. The last one is usually the
    /// user input the model should respond to.
    pub messages: Vec<ModelMessage>,
}

impl ModelRequest {
    /// Creates a request with a single user turn.
    #[inline]
    pub fn with_prompt<S: Into<String>>(prompt: S) -> Self {
        Self {
            messages: vec![ModelMessage::User(prompt.into())],
        }
    }
}

/// A complete turn in the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "text", rename_all = "lowercase")]
pub enum ModelMessage {
    /// A user input text.
    User(String),
    /// A text generated by the model.
    Model(String),
}

impl ModelMessage {
    /// Returns the role name of this turn, as generative APIs spell it.
    #[inline]
    pub fn role(&self) -> &'static str {
        match self {
            ModelMessage::User(_) => "user",
            ModelMessage::Model(_) => "model",
        }
    }

    /// Returns the text of this turn.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            ModelMessage::User(text) | ModelMessage::Model(text) => text,
        }
    }
}
