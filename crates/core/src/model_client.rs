use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream::{self, Stream, StreamExt};
use little_chat_model::{
    ModelMessage, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use tracing::Instrument;

use crate::error::GenerationFailure;

type EventResult = Result<ModelResponseEvent, GenerationFailure>;
type EventStream = Pin<Box<dyn Stream<Item = EventResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> EventStream + Send + Sync>;

/// A stream of text fragments. It ends after the first failure.
pub type TextStream =
    Pin<Box<dyn Stream<Item = Result<String, GenerationFailure>> + Send>>;

/// A wrapper around a model provider that provides a type-erased,
/// text-oriented interface for the view models.
///
/// Cloning a `ModelClient` is cheap, and clones share the same provider.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    /// Creates a client backed by the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let span = trace_span!(
                "model client req",
                model = provider.model_name()
            );
            span.in_scope(|| trace!("got a request: {req:?}"));
            let fut = provider.send_request(&req);
            let state = ResponseState::<P>::Connecting(Box::pin(fut));
            Box::pin(stream::unfold(state, move |state| {
                next_event::<P>(state).instrument(span.clone())
            }))
        });
        Self { handler_fn }
    }

    /// Generates a complete text for a single prompt.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the future aborts the request.
    pub async fn generate<S: Into<String>>(
        &self,
        prompt: S,
    ) -> Result<String, GenerationFailure> {
        collect_text(self.events(ModelRequest::with_prompt(prompt))).await
    }

    /// Generates text for a single prompt, yielding fragments as soon as
    /// the model produces them.
    ///
    /// Dropping the stream aborts the request.
    pub fn generate_incremental<S: Into<String>>(
        &self,
        prompt: S,
    ) -> TextStream {
        let events = self.events(ModelRequest::with_prompt(prompt));
        Box::pin(events.filter_map(|event| {
            ready(match event {
                Ok(ModelResponseEvent::TextDelta(delta)) => Some(Ok(delta)),
                Ok(ModelResponseEvent::Completed(_)) => None,
                Err(failure) => Some(Err(failure)),
            })
        }))
    }

    /// Starts a multi-turn chat on top of the given history.
    #[inline]
    pub fn start_chat(&self, history: Vec<ModelMessage>) -> ChatSession {
        ChatSession {
            client: self.clone(),
            history,
        }
    }

    #[inline]
    fn events(&self, req: ModelRequest) -> EventStream {
        (self.handler_fn)(req)
    }
}

/// A multi-turn conversation with the model.
///
/// Every request carries the whole history. A turn is recorded only after
/// the model has replied successfully with some text.
pub struct ChatSession {
    client: ModelClient,
    history: Vec<ModelMessage>,
}

impl ChatSession {
    /// Returns the turns exchanged so far, oldest first.
    #[inline]
    pub fn history(&self) -> &[ModelMessage] {
        &self.history
    }

    /// Sends a user message and returns the complete reply.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. If the future is dropped, the history
    /// is left untouched.
    pub async fn send<S: Into<String>>(
        &mut self,
        text: S,
    ) -> Result<String, GenerationFailure> {
        let text = text.into();
        let mut messages = self.history.clone();
        messages.push(ModelMessage::User(text.clone()));

        let reply = collect_text(self.client.events(ModelRequest { messages }))
            .await?;

        if reply.is_empty() {
            debug!("not recording a turn with an empty reply");
        } else {
            self.history.push(ModelMessage::User(text));
            self.history.push(ModelMessage::Model(reply.clone()));
        }
        Ok(reply)
    }
}

enum ResponseState<P: ModelProvider> {
    Connecting(
        Pin<Box<dyn Future<Output = Result<P::Response, P::Error>> + Send>>,
    ),
    Receiving(Pin<Box<P::Response>>),
    Done,
}

async fn next_event<P: ModelProvider>(
    state: ResponseState<P>,
) -> Option<(EventResult, ResponseState<P>)> {
    let mut resp = match state {
        ResponseState::Connecting(fut) => match fut.await {
            Ok(resp) => {
                trace!("start receiving events");
                Box::pin(resp)
            }
            Err(err) => {
                let failure = GenerationFailure::from_provider(err);
                return Some((Err(failure), ResponseState::Done));
            }
        },
        ResponseState::Receiving(resp) => resp,
        ResponseState::Done => return None,
    };

    match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
        Ok(Some(event)) => {
            trace!("got an event: {event:?}");
            Some((Ok(event), ResponseState::Receiving(resp)))
        }
        Ok(None) => {
            trace!("finished a request");
            None
        }
        Err(err) => {
            let failure = GenerationFailure::from_provider(err);
            Some((Err(failure), ResponseState::Done))
        }
    }
}

async fn collect_text(
    mut events: EventStream,
) -> Result<String, GenerationFailure> {
    let mut text = String::new();
    while let Some(event) = events.next().await {
        match event? {
            ModelResponseEvent::TextDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::Completed(reason) => {
                debug!("model finished: {reason:?}");
            }
        }
    }
    Ok(text)
}
