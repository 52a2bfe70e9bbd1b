use little_chat_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// A scripted failure.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetFailure {
    /// The error message, which is also the `Display` output.
    pub message: String,
    /// The kind of the error.
    pub kind: ErrorKind,
}

impl PresetFailure {
    /// Creates a failure of the `Other` kind.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Other,
        }
    }

    /// Overrides the error kind.
    #[inline]
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "text_delta")]
    TextDelta(String),
    /// Fails the response in the middle of the stream.
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}

/// The preset response for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    #[serde(default)]
    pub events: Vec<PresetEvent>,
    /// If set, the request itself fails before any event is produced.
    #[serde(default)]
    pub failure: Option<PresetFailure>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a `PresetResponse` that streams the given fragments.
    #[inline]
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            fragments
                .into_iter()
                .map(|s| PresetEvent::TextDelta(s.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a `PresetResponse` that is rejected when sending the request.
    #[inline]
    pub fn failing(failure: PresetFailure) -> Self {
        Self {
            events: vec![],
            failure: Some(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_script() {
        let script = json!([
            {
                "events": [
                    { "type": "text_delta", "data": "Two dogs, " },
                    { "type": "text_delta", "data": "got it." }
                ]
            },
            {
                "events": [
                    { "type": "text_delta", "data": "Let me " },
                    {
                        "type": "failure",
                        "data": { "message": "boom", "kind": "other" }
                    }
                ]
            },
            {
                "failure": {
                    "message": "quota exceeded",
                    "kind": "rate_limit_exceeded"
                }
            }
        ]);

        let script: Vec<PresetResponse> =
            serde_json::from_value(script).unwrap();
        assert_eq!(
            script,
            vec![
                PresetResponse::with_fragments(["Two dogs, ", "got it."]),
                PresetResponse::with_events([
                    PresetEvent::TextDelta("Let me ".to_owned()),
                    PresetEvent::Failure(PresetFailure::new("boom")),
                ]),
                PresetResponse::failing(
                    PresetFailure::new("quota exceeded")
                        .with_kind(ErrorKind::RateLimitExceeded)
                ),
            ]
        );
    }
}
