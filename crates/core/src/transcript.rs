//! Chat transcript types.

use std::fmt::{self, Display};

use little_chat_model::ModelMessage;
use uuid::Uuid;

/// The unique identifier of a [`ChatMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    #[inline]
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Participant {
    /// Typed by the user.
    User,
    /// Generated by the model.
    Model,
    /// A failure surfaced to the user.
    Error,
}

/// A message in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatMessage {
    id: MessageId,
    text: String,
    participant: Participant,
    pending: bool,
}

impl ChatMessage {
    /// Creates a resolved message.
    #[inline]
    pub fn new<S: Into<String>>(participant: Participant, text: S) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            participant,
            pending: false,
        }
    }

    /// Creates a user message that is still waiting for its reply.
    #[inline]
    pub fn pending_user<S: Into<String>>(text: S) -> Self {
        Self {
            pending: true,
            ..Self::new(Participant::User, text)
        }
    }

    /// Returns the identifier, which is unique across all messages.
    #[inline]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the message text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the author of this message.
    #[inline]
    pub fn participant(&self) -> Participant {
        self.participant
    }

    /// Returns whether this message is still waiting for a reply.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

impl From<&ModelMessage> for ChatMessage {
    fn from(msg: &ModelMessage) -> Self {
        match msg {
            ModelMessage::User(text) => Self::new(Participant::User, text),
            ModelMessage::Model(text) => Self::new(Participant::Model, text),
        }
    }
}

/// An ordered list of chat messages.
///
/// Messages are only ever appended. The one mutation allowed on existing
/// entries is resolving a pending message, which clears its pending flag
/// and leaves it where it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Returns the messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether the transcript has no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the most recent pending message, if any.
    #[inline]
    pub fn pending(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|msg| msg.pending)
    }

    /// Appends a message at the end.
    #[inline]
    pub fn append(&mut self, msg: ChatMessage) {
        self.messages.push(msg);
    }

    /// Resolves the pending message with the given id.
    ///
    /// Returns `false` if there is no such message, or it's not pending.
    pub fn resolve(&mut self, id: MessageId) -> bool {
        let Some(msg) = self.messages.iter_mut().find(|msg| msg.id == id)
        else {
            return false;
        };
        std::mem::replace(&mut msg.pending, false)
    }

    /// Resolves the most recent pending message, and returns its id.
    ///
    /// It's a no-op if nothing is pending.
    pub fn resolve_pending_tail(&mut self) -> Option<MessageId> {
        let msg = self.messages.iter_mut().rev().find(|msg| msg.pending)?;
        msg.pending = false;
        Some(msg.id)
    }
}

impl FromIterator<ChatMessage> for Transcript {
    fn from_iter<T: IntoIterator<Item = ChatMessage>>(iter: T) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = Transcript::default();
        let texts = ["one", "two", "three"];
        for (idx, text) in texts.iter().enumerate() {
            transcript.append(ChatMessage::new(Participant::User, *text));
            assert_eq!(transcript.len(), idx + 1);
        }
        let collected: Vec<_> =
            transcript.messages().iter().map(ChatMessage::text).collect();
        assert_eq!(collected, texts);
    }

    #[test]
    fn test_resolve_without_pending_is_noop() {
        let mut transcript: Transcript = [
            ChatMessage::new(Participant::User, "Hi"),
            ChatMessage::new(Participant::Model, "Hello"),
        ]
        .into_iter()
        .collect();
        let before = transcript.clone();

        assert_eq!(transcript.resolve_pending_tail(), None);
        assert_eq!(transcript, before);
    }

    #[test]
    fn test_resolve_pending_tail() {
        let mut transcript = Transcript::default();
        transcript.append(ChatMessage::new(Participant::Model, "Hello"));
        let pending = ChatMessage::pending_user("How are you?");
        transcript.append(pending.clone());
        assert_eq!(transcript.pending(), Some(&pending));

        assert_eq!(transcript.resolve_pending_tail(), Some(pending.id()));
        assert_eq!(transcript.len(), 2);
        assert!(transcript.pending().is_none());

        let resolved = &transcript.messages()[1];
        assert!(!resolved.is_pending());
        assert_eq!(resolved.id(), pending.id());
        assert_eq!(resolved.text(), "How are you?");
        assert_eq!(resolved.participant(), Participant::User);

        // The second call has nothing left to resolve.
        let before = transcript.clone();
        assert_eq!(transcript.resolve_pending_tail(), None);
        assert_eq!(transcript, before);
    }

    #[test]
    fn test_resolve_keeps_position() {
        let mut transcript = Transcript::default();
        let pending = ChatMessage::pending_user("First");
        transcript.append(pending.clone());
        transcript.append(ChatMessage::new(Participant::Error, "Oops"));

        assert!(transcript.resolve(pending.id()));
        assert!(!transcript.resolve(pending.id()));
        assert_eq!(transcript.messages()[0].id(), pending.id());
        assert!(!transcript.messages()[0].is_pending());
        assert_eq!(transcript.messages()[1].text(), "Oops");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ChatMessage::new(Participant::User, "same");
        let b = ChatMessage::new(Participant::User, "same");
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }
}
