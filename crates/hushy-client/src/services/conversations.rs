use tracing::{debug, info, warn};
use uuid::Uuid;

use hushy_shared::api::OutgoingMessage;
use hushy_shared::moderation::{KeywordFilter, MediaKind, ModerationVerdict};
use hushy_shared::types::{Conversation, ConversationId, Message, MessageType};

use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::state::Context;
use crate::unread::UnreadSummary;

/// A message as composed in the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub message_type: MessageType,
    pub content: Option<String>,
    pub media_url: Option<String>,
}

impl MessageDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Text,
            content: Some(content.into()),
            media_url: None,
        }
    }

    pub fn media(message_type: MessageType, media_url: impl Into<String>) -> Self {
        Self {
            message_type,
            content: None,
            media_url: Some(media_url.into()),
        }
    }
}

#[derive(Clone)]
pub struct ConversationService {
    ctx: Context,
}

impl ConversationService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Conversations the signed-in user takes part in, with their unread
    /// counters.
    pub async fn list(&self) -> Result<Vec<Conversation>> {
        self.ctx.require_user()?;
        self.ctx.api.get("/api/secrets/conversations").await
    }

    /// Message history of one conversation, oldest first.
    pub async fn messages(&self, id: &ConversationId) -> Result<Vec<Message>> {
        self.ctx.require_user()?;
        self.ctx
            .api
            .get(&format!("/api/secrets/conversations/{id}/messages"))
            .await
    }

    /// Moderate and send a message. Nothing reaches the backend when the
    /// draft is malformed or flagged.
    pub async fn send_message(&self, id: &ConversationId, draft: &MessageDraft) -> Result<Message> {
        let user = self.ctx.require_user()?;
        if !user.permissions.can_message {
            return Err(ClientError::Forbidden("messaging is disabled for this account".into()));
        }

        let filter = self.ctx.with_state(|s| s.keyword_filter.clone())?;
        let body = prepare_message(draft, &filter)?;

        let message: Message = self
            .ctx
            .api
            .post(&format!("/api/secrets/conversations/{id}/messages"), &body)
            .await?;
        debug!(conversation = %id, message = %message.id, "message sent");
        Ok(message)
    }

    /// Zero the conversation's unread count right away, then tell the
    /// backend. A failed request leaves the local state as is.
    pub async fn mark_as_read(&self, id: &ConversationId) -> Result<()> {
        self.ctx.require_user()?;

        let summary = self.ctx.with_state(|s| {
            s.unread.mark_read_locally(id);
            s.unread.summary()
        })?;
        self.ctx.events.emit(ClientEvent::UnreadCountsChanged(summary));

        if let Err(e) = self
            .ctx
            .api
            .post_no_content(
                &format!("/api/secrets/conversations/{id}/read"),
                &serde_json::json!({}),
            )
            .await
        {
            warn!(conversation = %id, error = %e, "failed to sync read state");
            return Err(e);
        }
        Ok(())
    }

    /// The UI opened `id`: incoming messages for it no longer count as
    /// unread and its notifications are not displayed.
    pub async fn open(&self, id: &ConversationId) -> Result<()> {
        self.ctx
            .with_state(|s| s.active_conversation = Some(id.clone()))?;
        self.ctx.events.emit(ClientEvent::ConversationOpened(id.clone()));
        self.mark_as_read(id).await
    }

    /// The UI left the conversation screen.
    pub fn close(&self) -> Result<()> {
        self.ctx.with_state(|s| s.active_conversation = None)
    }

    /// Re-read every conversation's counter from the backend. On failure
    /// the last known counts are returned.
    pub async fn refresh_unread_counts(&self) -> Result<UnreadSummary> {
        let user = self.ctx.require_user()?;

        let conversations = match self.list().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "failed to refresh unread counts");
                return self.ctx.with_state(|s| s.unread.summary());
            }
        };

        let summary = self
            .ctx
            .with_state(|s| s.unread.reconcile(&conversations, &user.id))?;
        info!(
            conversations = conversations.len(),
            total = summary.total,
            "unread counts refreshed"
        );
        self.ctx
            .events
            .emit(ClientEvent::UnreadCountsChanged(summary.clone()));
        Ok(summary)
    }

    /// Current counters without contacting the backend.
    pub fn unread_summary(&self) -> Result<UnreadSummary> {
        self.ctx.with_state(|s| s.unread.summary())
    }
}

fn media_kind(message_type: MessageType) -> Option<MediaKind> {
    match message_type {
        MessageType::Text => None,
        MessageType::Image | MessageType::Mixed => Some(MediaKind::Image),
        MessageType::Audio => Some(MediaKind::Audio),
    }
}

/// Check a draft's shape, moderate its text and media, and build the
/// request body.
fn prepare_message(draft: &MessageDraft, filter: &KeywordFilter) -> Result<OutgoingMessage> {
    let content = draft
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let media_url = draft
        .media_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    if draft.message_type.has_text() && content.is_none() {
        return Err(ClientError::InvalidMessage("text is required".into()));
    }
    if draft.message_type.has_media() && media_url.is_none() {
        return Err(ClientError::InvalidMessage("media URL is required".into()));
    }

    let text_verdict = content.map(|text| filter.check_text(text));
    let media_verdict = media_kind(draft.message_type).map(|kind| filter.check_media(kind));
    for verdict in [text_verdict, media_verdict].into_iter().flatten() {
        if let ModerationVerdict::Flagged { terms } = verdict {
            return Err(ClientError::Moderated { terms });
        }
    }

    Ok(OutgoingMessage {
        message_type: draft.message_type,
        content: content.map(str::to_string),
        media_url: media_url.map(str::to_string),
        client_id: Uuid::new_v4().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    fn check(draft: &MessageDraft) -> Result<OutgoingMessage> {
        prepare_message(draft, &KeywordFilter::with_defaults())
    }

    #[test]
    fn text_message_is_trimmed() {
        let body = check(&MessageDraft::text("  thanks for buying  ")).unwrap();
        assert_eq!(body.content.as_deref(), Some("thanks for buying"));
        assert!(body.media_url.is_none());
        assert!(!body.client_id.is_empty());
    }

    #[test]
    fn empty_text_rejected() {
        assert!(matches!(
            check(&MessageDraft::text("   ")),
            Err(ClientError::InvalidMessage(_))
        ));
    }

    #[test]
    fn media_needs_url() {
        let draft = MessageDraft {
            message_type: MessageType::Image,
            content: None,
            media_url: Some(" ".into()),
        };
        assert!(matches!(check(&draft), Err(ClientError::InvalidMessage(_))));

        let ok = check(&MessageDraft::media(MessageType::Audio, "https://cdn/a.m4a")).unwrap();
        assert_eq!(ok.message_type, MessageType::Audio);
    }

    #[test]
    fn mixed_needs_both() {
        let draft = MessageDraft {
            message_type: MessageType::Mixed,
            content: Some("look".into()),
            media_url: None,
        };
        assert!(check(&draft).is_err());
    }

    #[test]
    fn media_kinds_follow_message_type() {
        assert_eq!(media_kind(MessageType::Text), None);
        assert_eq!(media_kind(MessageType::Mixed), Some(MediaKind::Image));
        assert_eq!(media_kind(MessageType::Audio), Some(MediaKind::Audio));
    }

    #[test]
    fn mixed_message_with_flagged_caption_blocked() {
        let draft = MessageDraft {
            message_type: MessageType::Mixed,
            content: Some("kys".into()),
            media_url: Some("https://cdn/x.jpg".into()),
        };
        assert!(matches!(check(&draft), Err(ClientError::Moderated { .. })));
    }

    #[test]
    fn flagged_text_blocked_but_media_passes() {
        assert!(matches!(
            check(&MessageDraft::text("kys")),
            Err(ClientError::Moderated { .. })
        ));
        assert!(check(&MessageDraft::media(MessageType::Image, "https://cdn/x.jpg")).is_ok());
    }
}
