//! Chat screen state.


use little_chat_model::ModelMessage;
use tokio::sync::{Mutex, watch};

use crate::error::{GenerationFailure, RequestInFlight};
use crate::model_client::{ChatSession, ModelClient};
use crate::transcript::{ChatMessage, MessageId, Participant, Transcript};

/// Owns the transcript of one chat and talks to the model on behalf of the
/// UI.
///
/// The transcript is published through a watch channel, so any number of
/// readers can follow it while the view model keeps being the only writer.
/// Only one message can be in flight at a time.
pub struct ChatViewModel {
    session: Mutex<ChatSession>,
    ui_state: watch::Sender<Transcript>,
}

impl ChatViewModel {
    /// Creates a view model whose chat starts from `history`.
    ///
    /// The history turns also show up in the transcript, already resolved.
    pub fn new(client: &ModelClient, history: Vec<ModelMessage>) -> Self {
        let session = client.start_chat(history);
        let transcript: Transcript =
            session.history().iter().map(ChatMessage::from).collect();
        let (ui_state, _) = watch::channel(transcript);
        Self {
            session: Mutex::new(session),
            ui_state,
        }
    }

    /// Subscribes to the transcript.
    #[inline]
    pub fn ui_state(&self) -> watch::Receiver<Transcript> {
        self.ui_state.subscribe()
    }

    /// Returns a snapshot of the current transcript.
    #[inline]
    pub fn transcript(&self) -> Transcript {
        self.ui_state.borrow().clone()
    }

    /// Sends a user message and waits for the reply.
    ///
    /// The message shows up in the transcript as pending right away. When
    /// the model replies, it's resolved and followed by the reply, or by an
    /// error message if the request failed. Failures are never returned to
    /// the caller; they become part of the transcript.
    ///
    /// # Errors
    ///
    /// Returns [`RequestInFlight`] without touching the transcript if
    /// another message is still pending.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. Dropping the future aborts the request,
    /// resolves the pending message, and appends a cancellation error.
    pub async fn send_message<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<(), RequestInFlight> {
        let Ok(mut session) = self.session.try_lock() else {
            warn!("a message is still pending, rejecting the new one");
            return Err(RequestInFlight);
        };

        let text = text.into();
        let pending = PendingMessage::append(
            &self.ui_state,
            ChatMessage::pending_user(text.clone()),
        );
        let reply = match session.send(text).await {
            Ok(reply) if reply.is_empty() => {
                debug!("got an empty reply");
                None
            }
            Ok(reply) => Some(ChatMessage::new(Participant::Model, reply)),
            Err(failure) => Some(error_message(&failure)),
        };
        pending.resolve(reply);
        Ok(())
    }
}

#[inline]
fn error_message(failure: &GenerationFailure) -> ChatMessage {
    ChatMessage::new(Participant::Error, failure.description())
}

/// A pending user message in the transcript.
///
/// If it's dropped before being resolved, the request it belongs to has
/// been cancelled.
struct PendingMessage<'a> {
    ui_state: &'a watch::Sender<Transcript>,
    id: MessageId,
    resolved: bool,
}

impl<'a> PendingMessage<'a> {
    fn append(
        ui_state: &'a watch::Sender<Transcript>,
        msg: ChatMessage,
    ) -> Self {
        let id = msg.id();
        ui_state.send_modify(|transcript| transcript.append(msg));
        trace!("appended pending message {id}");
        Self {
            ui_state,
            id,
            resolved: false,
        }
    }

    fn resolve(mut self, reply: Option<ChatMessage>) {
        self.resolved = true;
        self.finish(reply);
    }

    fn finish(&self, reply: Option<ChatMessage>) {
        self.ui_state.send_modify(|transcript| {
            if !transcript.resolve(self.id) {
                warn!("message {} is no longer pending", self.id);
            }
            if let Some(reply) = reply {
                transcript.append(reply);
            }
        });
        trace!("resolved pending message {}", self.id);
    }
}

impl Drop for PendingMessage<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            debug!("request for message {} was cancelled", self.id);
            self.finish(Some(error_message(&GenerationFailure::cancelled())));
        }
    }
}
