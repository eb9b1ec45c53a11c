use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

// Backend ids are opaque strings (Mongo object ids in practice).
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(UserId);
string_id!(SecretId);
string_id!(ConversationId);
string_id!(MessageId);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A priced, time-limited post a user sells access to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[serde(alias = "_id")]
    pub id: SecretId,
    pub content: String,
    pub label: String,
    pub price: f64,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(alias = "user", alias = "userId")]
    pub creator: UserId,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub share_link: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Secret {
    /// Expiry is enforced server-side; the client only hides what it
    /// already knows to be gone.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Per-user unread counters as the backend sends them.
///
/// Depending on how the document was serialized the field is either a plain
/// JSON object (`{"<userId>": 3}`) or a map-like list of entries
/// (`[["<userId>", 3]]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnreadCounts {
    Object(HashMap<String, i64>),
    Entries(Vec<(String, i64)>),
}

impl Default for UnreadCounts {
    fn default() -> Self {
        Self::Object(HashMap::new())
    }
}

impl UnreadCounts {
    /// Counter for `user`, 0 when absent. Negative values are clamped.
    pub fn for_user(&self, user: &UserId) -> u32 {
        let raw = match self {
            Self::Object(map) => map.get(user.as_str()).copied(),
            Self::Entries(entries) => entries
                .iter()
                .find(|(id, _)| id == user.as_str())
                .map(|(_, n)| *n),
        };
        raw.unwrap_or(0).clamp(0, u32::MAX as i64) as u32
    }
}

/// The private thread unlocked by a purchase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(alias = "_id")]
    pub id: ConversationId,
    #[serde(default)]
    pub participants: Vec<UserId>,
    #[serde(default, alias = "secret")]
    pub secret_id: Option<SecretId>,
    #[serde(default, alias = "unreadCount")]
    pub unread_counts: UnreadCounts,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Audio,
    Mixed,
}

impl MessageType {
    pub fn has_text(self) -> bool {
        matches!(self, Self::Text | Self::Mixed)
    }

    pub fn has_media(self) -> bool {
        !matches!(self, Self::Text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(alias = "_id")]
    pub id: MessageId,
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    pub sender: UserId,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(default = "enabled")]
    pub can_post: bool,
    #[serde(default = "enabled")]
    pub can_purchase: bool,
    #[serde(default = "enabled")]
    pub can_message: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            can_post: true,
            can_purchase: true,
            can_message: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub stripe_account_id: Option<String>,
    #[serde(default)]
    pub notification_token: Option<String>,
    #[serde(default)]
    pub permissions: Permissions,
}
