//! Request and response bodies exchanged with the backend REST API.

use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::notification::Platform;
use crate::types::{ConversationId, GeoPoint, MessageType, Secret, SecretId, User};

/// Body of `POST /api/secrets`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSecret {
    pub content: String,
    pub label: String,
    pub price: f64,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<GeoPoint>,
    pub duration_hours: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Body of `PATCH /api/users/me`. Only the set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Client-generated id so a resent message can be matched up.
    pub client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    #[serde(alias = "conversation")]
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub secret: Option<Secret>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkPreviewRequest<'a> {
    pub url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterToken<'a> {
    pub token: &'a str,
    pub platform: Platform,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenRef<'a> {
    pub token: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest<'a> {
    pub secret_id: &'a SecretId,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingLink {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordList {
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}
