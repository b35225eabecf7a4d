//! Append-only message log.
//!
//! Messages are ordered by insertion and never edited or removed
//! individually. Sealing the log (at session teardown) rejects every later
//! append, which is how the "no mutation after ENDED" rule is enforced at the
//! data level rather than by convention.

use std::{fmt, time::Duration};

use serde::Serialize;

use crate::{error::TranscriptError, peer::Peer};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SenderRole {
    /// The local student
    User,
    /// A synthetic peer
    Peer,
    /// Engine announcements (connection, disconnection)
    System,
}

/// Unique (per transcript) message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// A stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Insertion-ordered id
    pub id: MessageId,
    /// Author role
    pub sender: SenderRole,
    /// Speaking identity of a PEER message, when one is attached
    pub author: Option<Peer>,
    /// Message body
    pub text: String,
    /// Time since the session started
    pub created_at: Duration,
}

/// Ordered message log owned by one session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
    sealed: bool,
}

impl Transcript {
    /// Create an empty, unsealed log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the stored copy.
    ///
    /// # Errors
    ///
    /// - `TranscriptError::Sealed` after [`Self::seal`]
    pub fn append(
        &mut self,
        sender: SenderRole,
        text: impl Into<String>,
        created_at: Duration,
    ) -> Result<&Message, TranscriptError> {
        self.push(sender, None, text.into(), created_at)
    }

    /// Append a SYSTEM announcement.
    pub fn append_system(
        &mut self,
        text: impl Into<String>,
        created_at: Duration,
    ) -> Result<&Message, TranscriptError> {
        self.push(SenderRole::System, None, text.into(), created_at)
    }

    /// Append a PEER message attributed to a specific identity.
    pub fn append_from(
        &mut self,
        author: Peer,
        text: impl Into<String>,
        created_at: Duration,
    ) -> Result<&Message, TranscriptError> {
        self.push(SenderRole::Peer, Some(author), text.into(), created_at)
    }

    fn push(
        &mut self,
        sender: SenderRole,
        author: Option<Peer>,
        text: String,
        created_at: Duration,
    ) -> Result<&Message, TranscriptError> {
        if self.sealed {
            return Err(TranscriptError::Sealed);
        }
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message { id, sender, author, text, created_at });
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Reject all further appends.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// `true` once sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Messages in insertion order. Re-reading yields the same contents
    /// unless more were appended in between.
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Messages from one role, in order.
    pub fn by_role(&self, role: SenderRole) -> impl Iterator<Item = &Message> + Clone {
        self.messages.iter().filter(move |m| m.sender == role)
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// `true` if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::{AVATARS, Peer};

    #[test]
    fn ids_follow_insertion_order() {
        let mut log = Transcript::new();
        let a = log.append(SenderRole::User, "hi", Duration::ZERO).unwrap().id;
        let b = log.append_system("joined", Duration::from_secs(1)).unwrap().id;
        assert!(a < b);
        assert_eq!(log.history().iter().map(|m| m.id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn history_is_restartable() {
        let mut log = Transcript::new();
        log.append(SenderRole::User, "one", Duration::ZERO).unwrap();
        log.append(SenderRole::Peer, "two", Duration::ZERO).unwrap();

        let first: Vec<_> = log.history().iter().map(|m| m.text.clone()).collect();
        let second: Vec<_> = log.history().iter().map(|m| m.text.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn sealed_log_rejects_appends() {
        let mut log = Transcript::new();
        log.append(SenderRole::User, "before", Duration::ZERO).unwrap();
        log.seal();

        assert_eq!(
            log.append(SenderRole::User, "after", Duration::ZERO).unwrap_err(),
            TranscriptError::Sealed
        );
        assert_eq!(log.append_system("bye", Duration::ZERO).unwrap_err(), TranscriptError::Sealed);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn chatter_keeps_author() {
        let mut log = Transcript::new();
        let author = Peer::from_avatar(AVATARS[0], "Anonymous");
        let msg = log.append_from(author.clone(), "Coffee?", Duration::ZERO).unwrap();
        assert_eq!(msg.sender, SenderRole::Peer);
        assert_eq!(msg.author.as_ref(), Some(&author));
        assert_eq!(log.by_role(SenderRole::Peer).count(), 1);
        assert_eq!(log.by_role(SenderRole::User).count(), 0);
    }
}
