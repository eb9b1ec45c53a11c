use serde::{Deserialize, Serialize};

use crate::error::SharedError;
use crate::types::{ConversationId, SecretId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub platform: Platform,
    /// Simulators and emulators cannot receive pushes.
    pub is_simulator: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[serde(alias = "new_message")]
    Message,
    #[serde(alias = "secret_purchased", alias = "new_purchase")]
    Purchase,
    #[serde(alias = "secret_expiring", alias = "expiry_reminder")]
    Reminder,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Data carried by a push notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(default, alias = "notificationId")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    #[serde(default)]
    pub secret_id: Option<SecretId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Where the UI should go when a notification is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationRoute {
    Conversation(ConversationId),
    Secret(SecretId),
    MySecrets,
    Earnings,
    Home,
}

impl NotificationPayload {
    pub fn from_json(raw: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Key used to recognise a re-delivered notification. Falls back to the
    /// payload's content when the provider sent no id.
    pub fn dedup_key(&self) -> String {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        format!(
            "{:?}|{}|{}|{}",
            self.kind,
            self.conversation_id.as_ref().map(|c| c.as_str()).unwrap_or(""),
            self.secret_id.as_ref().map(|s| s.as_str()).unwrap_or(""),
            self.body.as_deref().unwrap_or(""),
        )
    }

    pub fn route(&self) -> NotificationRoute {
        match self.kind {
            NotificationKind::Message => match &self.conversation_id {
                Some(id) => NotificationRoute::Conversation(id.clone()),
                None => NotificationRoute::Home,
            },
            NotificationKind::Purchase => match &self.conversation_id {
                Some(id) => NotificationRoute::Conversation(id.clone()),
                None => NotificationRoute::Earnings,
            },
            NotificationKind::Reminder => match &self.secret_id {
                Some(id) => NotificationRoute::Secret(id.clone()),
                None => NotificationRoute::MySecrets,
            },
            NotificationKind::Unknown => NotificationRoute::Home,
        }
    }
}
