//! Push-notification registration and handling.
//!
//! Token registration, re-delivery filtering and routing live in this one
//! service; the UI only forwards what the push provider hands it.

use tracing::{debug, info, warn};

use hushy_shared::api::{RegisterToken, TokenRef};
use hushy_shared::notification::{
    DeviceInfo, NotificationKind, NotificationPayload, NotificationRoute,
};

use crate::error::Result;
use crate::events::ClientEvent;
use crate::state::{Context, PUSH_TOKEN_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Simulators cannot receive pushes; nothing was sent.
    SkippedSimulator,
    /// The backend already has this token.
    AlreadyRegistered,
    Registered,
}

/// How a notification reached the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Arrived while the app was in the foreground.
    Foreground,
    /// The user tapped it.
    Opened,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Already handled within the de-duplication window.
    Duplicate,
    Handled {
        route: NotificationRoute,
        /// Whether a banner should be shown (foreground only).
        display: bool,
    },
}

#[derive(Clone)]
pub struct NotificationService {
    ctx: Context,
}

impl NotificationService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Register this device's push token. A different token registered
    /// earlier is removed from the backend first.
    pub async fn register_device(&self, token: &str, device: DeviceInfo) -> Result<Registration> {
        if device.is_simulator {
            info!("simulator detected, skipping push registration");
            return Ok(Registration::SkippedSimulator);
        }
        self.ctx.require_user()?;

        let previous = self.ctx.with_state(|s| s.push_token.clone())?;
        if previous.as_deref() == Some(token) {
            debug!("push token unchanged");
            return Ok(Registration::AlreadyRegistered);
        }

        if let Some(old) = previous {
            if let Err(e) = self
                .ctx
                .api
                .delete_with_body("/api/notifications/token", &TokenRef { token: &old })
                .await
            {
                warn!(error = %e, "failed to remove stale push token");
            }
        }

        self.ctx
            .api
            .post_no_content(
                "/api/notifications/register-token",
                &RegisterToken {
                    token,
                    platform: device.platform,
                },
            )
            .await?;

        self.ctx
            .with_state(|s| s.push_token = Some(token.to_string()))?;
        self.ctx
            .with_db("persist push token", |db| db.kv_put(PUSH_TOKEN_KEY, &token));

        info!(platform = ?device.platform, "push token registered");
        Ok(Registration::Registered)
    }

    /// Remove this device's token from the backend and forget it locally.
    pub async fn unregister_device(&self) -> Result<()> {
        let Some(token) = self.ctx.with_state(|s| s.push_token.clone())? else {
            return Ok(());
        };

        self.ctx
            .api
            .delete_with_body("/api/notifications/token", &TokenRef { token: &token })
            .await?;

        self.ctx.with_state(|s| s.push_token = None)?;
        self.ctx
            .with_db("forget push token", |db| db.kv_delete(PUSH_TOKEN_KEY));
        info!("push token unregistered");
        Ok(())
    }

    /// Parse the provider's JSON and handle it. Unreadable payloads route
    /// to [`NotificationRoute::Home`].
    pub fn handle_raw(&self, raw: &str, delivery: Delivery) -> Result<NotificationOutcome> {
        match NotificationPayload::from_json(raw) {
            Ok(payload) => self.handle_notification(&payload, delivery),
            Err(e) => {
                warn!(error = %e, "unreadable notification payload");
                Ok(NotificationOutcome::Handled {
                    route: NotificationRoute::Home,
                    display: delivery == Delivery::Foreground,
                })
            }
        }
    }

    /// Process a notification the push provider delivered.
    ///
    /// De-duplication is per delivery source: the same notification id is
    /// handled at most once as [`Delivery::Foreground`] and at most once as
    /// [`Delivery::Opened`] within the window. A banner followed by the tap
    /// on it is therefore two events, each processed once.
    ///
    /// A message notification for a conversation that is not on screen
    /// clears that conversation's local read mark. In the foreground it also
    /// bumps the unread count.
    pub fn handle_notification(
        &self,
        payload: &NotificationPayload,
        delivery: Delivery,
    ) -> Result<NotificationOutcome> {
        let key = format!("{delivery:?}:{}", payload.dedup_key());
        let route = payload.route();

        let outcome = self.ctx.with_state(|s| {
            if !s.notifications.check_and_mark(&key) {
                return (NotificationOutcome::Duplicate, None);
            }

            let mut unread = None;
            let mut display = delivery == Delivery::Foreground;

            if let (NotificationKind::Message, Some(conv)) =
                (payload.kind, payload.conversation_id.as_ref())
            {
                let on_screen = s.active_conversation.as_ref() == Some(conv);
                if on_screen {
                    display = false;
                } else if delivery == Delivery::Foreground {
                    s.unread.on_new_message(conv);
                    unread = Some(s.unread.summary());
                } else {
                    s.unread.forget_local_read(conv);
                }
            }

            (
                NotificationOutcome::Handled {
                    route: route.clone(),
                    display,
                },
                unread,
            )
        })?;

        let (outcome, unread) = outcome;
        match &outcome {
            NotificationOutcome::Duplicate => {
                debug!(key = %key, "duplicate notification ignored");
            }
            NotificationOutcome::Handled { route, .. } => {
                if let Some(summary) = unread {
                    self.ctx.events.emit(ClientEvent::UnreadCountsChanged(summary));
                }
                if delivery == Delivery::Opened {
                    self.ctx.events.emit(ClientEvent::Navigate(route.clone()));
                }
            }
        }
        Ok(outcome)
    }
}
