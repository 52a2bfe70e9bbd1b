use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
///
/// The `Display` output is what ends up in front of the user, so it
/// should be a human-readable description rather than a debug dump.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a model provider, the entry point for sampling
/// text from a generative model.
///
/// Once the provider is created, it should behave like a stateless object.
/// Conversation state lives in the requests, and the provider should be
/// prepared for being dropped anytime.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Returns the name of the model behind this provider.
    ///
    /// It's only used for diagnostics.
    fn model_name(&self) -> &str;

    /// Sends a request to the model.
    ///
    /// The returned future must not borrow `self`. Dropping it, or the
    /// response it resolves to, aborts the request.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
