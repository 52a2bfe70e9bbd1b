use std::error::Error;
use std::fmt::{self, Display};

use little_chat_model::ModelProviderError;

/// A failed generation, as seen by the user.
///
/// Whatever went wrong underneath (network, quota, moderation, a broken
/// payload), only the human-readable description is kept.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenerationFailure {
    description: String,
}

impl GenerationFailure {
    /// Creates a failure with the given description.
    #[inline]
    pub fn new<S: Into<String>>(description: S) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// The failure of a request whose caller went away before it finished.
    #[inline]
    pub fn cancelled() -> Self {
        Self::new("request cancelled")
    }

    /// Returns the description of this failure.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn from_provider<E: ModelProviderError>(err: E) -> Self {
        error!("model provider failed ({}): {err:?}", err.kind());
        Self::new(err.to_string())
    }
}

impl Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl Error for GenerationFailure {}

/// Returned when a view model is asked to start a request while another
/// one is still outstanding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestInFlight;

impl Display for RequestInFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "another request is still in flight".fmt(f)
    }
}

impl Error for RequestInFlight {}
