use tokio::sync::broadcast;

use hushy_shared::notification::NotificationRoute;
use hushy_shared::types::{ConversationId, SecretId};

use crate::unread::UnreadSummary;

const EVENT_CAPACITY: usize = 64;

/// State changes pushed to whatever UI layer sits on top of the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    SessionChanged { signed_in: bool },
    UnreadCountsChanged(UnreadSummary),
    Navigate(NotificationRoute),
    SecretPosted(SecretId),
    SecretDeleted(SecretId),
    ConversationOpened(ConversationId),
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ClientEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::trace!(event = ?e.0, "no event subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
