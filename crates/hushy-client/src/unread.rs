//! Unread-count reconciliation.
//!
//! The server's counters lag behind what the user has seen: a conversation
//! opened a moment ago may still report unread messages. Conversations the
//! user marked read locally report 0 until the server agrees (or a new
//! message arrives).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use hushy_shared::types::{Conversation, ConversationId, UserId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnreadSummary {
    pub per_conversation: HashMap<ConversationId, u32>,
    pub total: u32,
}

#[derive(Debug, Default)]
pub struct UnreadTracker {
    counts: HashMap<ConversationId, u32>,
    locally_read: HashSet<ConversationId>,
}

impl UnreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_read_locally(&mut self, id: &ConversationId) {
        self.counts.insert(id.clone(), 0);
        self.locally_read.insert(id.clone());
    }

    pub fn is_locally_read(&self, id: &ConversationId) -> bool {
        self.locally_read.contains(id)
    }

    /// The server has news for `id` that the local read mark must not hide.
    /// The count itself is left to the next reconciliation.
    pub fn forget_local_read(&mut self, id: &ConversationId) {
        self.locally_read.remove(id);
    }

    /// A message arrived in `id` while it was not on screen.
    pub fn on_new_message(&mut self, id: &ConversationId) {
        self.locally_read.remove(id);
        *self.counts.entry(id.clone()).or_insert(0) += 1;
    }

    /// Replace the counts with the server's view of `conversations`,
    /// keeping local read marks authoritative.
    pub fn reconcile(&mut self, conversations: &[Conversation], user: &UserId) -> UnreadSummary {
        let mut counts = HashMap::with_capacity(conversations.len());

        for conv in conversations {
            let server_count = conv.unread_counts.for_user(user);
            let count = if self.locally_read.contains(&conv.id) {
                if server_count == 0 {
                    // server caught up
                    self.locally_read.remove(&conv.id);
                }
                0
            } else {
                server_count
            };
            counts.insert(conv.id.clone(), count);
        }

        self.locally_read.retain(|id| counts.contains_key(id));
        self.counts = counts;
        self.summary()
    }

    pub fn count(&self, id: &ConversationId) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().copied().fold(0u32, u32::saturating_add)
    }

    pub fn summary(&self) -> UnreadSummary {
        UnreadSummary {
            per_conversation: self.counts.clone(),
            total: self.total(),
        }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.locally_read.clear();
    }
}
