//! State holders for chat and summarization front ends.
//!
//! The view models in this crate own the state a UI renders, and publish
//! every change through [`tokio::sync::watch`] channels. Requests to the
//! model go through [`ModelClient`], which turns any
//! [`ModelProvider`](little_chat_model::ModelProvider) into text results
//! and text streams.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod chat;
mod error;
mod model_client;
pub mod summarize;
pub mod transcript;

pub use chat::ChatViewModel;
pub use error::{GenerationFailure, RequestInFlight};
pub use model_client::{ChatSession, ModelClient, TextStream};
pub use summarize::{SummarizeUiState, SummarizeViewModel};
pub use transcript::{ChatMessage, MessageId, Participant, Transcript};
