use tracing::debug;

use crate::model::{DataSelection, Message, MessageKind, QueryAnswer, Role};

const GREETING: &str = "Hello, how can I help you?";

/// Append-only message log with the optimistic query protocol.
///
/// Ids come from one monotonically increasing counter owned by the log.
/// The in-flight placeholder reserves a counter value up front and is
/// rewritten with a fresh id on success, so placeholder and final ids can
/// never collide.
#[derive(Debug)]
pub struct ConversationLog {
    messages: Vec<Message>,
    next_id: u64,
    pending: Option<u64>,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationLog {
    pub fn new() -> Self {
        let mut log = Self {
            messages: Vec::new(),
            next_id: 0,
            pending: None,
        };
        let id = log.alloc_id();
        log.messages.push(Message {
            id,
            role: Role::Ai,
            kind: MessageKind::Text,
            body: GREETING.to_string(),
        });
        log
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True while a query is awaiting its response.
    pub fn query_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a query may be issued against this selection at all:
    /// committed, non-media, and nothing already in flight.
    pub fn can_query(&self, selection: Option<&DataSelection>) -> bool {
        if self.pending.is_some() {
            return false;
        }
        matches!(selection, Some(s) if s.committed && !s.media)
    }

    /// Start a query: append the user message and the pending placeholder
    /// before any network round-trip, returning the placeholder id.
    ///
    /// A no-op (`None`) when the selection does not permit querying or a
    /// prior query is still in flight; the caller renders that as a
    /// disabled affordance, not an error.
    pub fn begin_query(&mut self, text: &str, selection: Option<&DataSelection>) -> Option<u64> {
        if !self.can_query(selection) {
            debug!("query rejected: selection not ready or query in flight");
            return None;
        }
        let user_id = self.alloc_id();
        self.messages.push(Message {
            id: user_id,
            role: Role::User,
            kind: MessageKind::Text,
            body: text.to_string(),
        });
        let pending_id = self.alloc_id();
        self.messages.push(Message {
            id: pending_id,
            role: Role::Ai,
            kind: MessageKind::Pending,
            body: String::new(),
        });
        self.pending = Some(pending_id);
        Some(pending_id)
    }

    /// Rewrite the placeholder in place with the final answer.
    pub fn complete_query(&mut self, pending_id: u64, answer: &QueryAnswer) {
        if self.pending == Some(pending_id) {
            self.pending = None;
        }
        let Some(position) = self.messages.iter().position(|m| m.id == pending_id) else {
            return;
        };
        let final_id = self.alloc_id();
        let message = &mut self.messages[position];
        message.id = final_id;
        message.kind = if answer.html {
            MessageKind::Html
        } else {
            MessageKind::Text
        };
        message.body = answer.answer_text();
    }

    /// Roll the log back to its pre-query shape, keeping the user message.
    /// Removal is by id, never by position.
    pub fn abort_query(&mut self, pending_id: u64) {
        self.messages.retain(|m| m.id != pending_id);
        if self.pending == Some(pending_id) {
            self.pending = None;
        }
    }

    /// Text of a prior user message, for re-populating the input field.
    /// Never a network operation.
    pub fn recall(&self, id: u64) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.id == id && m.role == Role::User)
            .map(|m| m.body.as_str())
    }
}
