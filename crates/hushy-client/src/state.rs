//! Application state shared across all services.
//!
//! The [`AppState`] struct is wrapped in `Arc<Mutex<>>` inside [`Context`]
//! so that every service can reach it. The lock is only ever held for short
//! synchronous sections, never across an `.await`.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use hushy_shared::currency::Currency;
use hushy_shared::moderation::KeywordFilter;
use hushy_shared::types::{ConversationId, User};
use hushy_store::Database;

use crate::dedup::NotificationDeduper;
use crate::error::{ClientError, Result};
use crate::events::EventBus;
use crate::http::ApiClient;
use crate::unread::UnreadTracker;

/// KV key the signed-in session is persisted under.
pub const SESSION_KEY: &str = "auth.session";
/// KV key of the last push token registered with the backend.
pub const PUSH_TOKEN_KEY: &str = "push.token";
/// KV key of the detected currency.
pub const CURRENCY_KEY: &str = "currency.detected";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Central application state.
pub struct AppState {
    /// Signed-in user and bearer token. `None` when signed out.
    pub session: Option<Session>,

    /// Local cache database. `None` when it could not be opened; caching
    /// is then memory-only.
    pub database: Option<Database>,

    /// Reconciled unread counters.
    pub unread: UnreadTracker,

    /// Conversation currently on screen, if any.
    pub active_conversation: Option<ConversationId>,

    /// Processed push notifications.
    pub notifications: NotificationDeduper,

    /// Keyword list applied to secrets and messages.
    pub keyword_filter: KeywordFilter,

    /// Currency detected for this device.
    pub currency: Option<Currency>,

    /// Push token currently registered with the backend.
    pub push_token: Option<String>,
}

impl AppState {
    pub fn new(database: Option<Database>) -> Self {
        Self {
            session: None,
            database,
            unread: UnreadTracker::new(),
            active_conversation: None,
            notifications: NotificationDeduper::default(),
            keyword_filter: KeywordFilter::with_defaults(),
            currency: None,
            push_token: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Handles every service needs.
#[derive(Clone)]
pub struct Context {
    pub api: ApiClient,
    pub state: Arc<Mutex<AppState>>,
    pub events: EventBus,
}

impl Context {
    pub fn new(api: ApiClient, state: AppState) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(state)),
            events: EventBus::new(),
        }
    }

    /// Run `f` with the state locked.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> Result<R> {
        let mut guard = self.state.lock().map_err(|_| ClientError::StatePoisoned)?;
        Ok(f(&mut guard))
    }

    /// Run `f` against the cache database. `None` when there is no
    /// database or the operation failed; failures are logged and the
    /// caller carries on without the cache.
    pub fn with_db<R>(
        &self,
        what: &str,
        f: impl FnOnce(&Database) -> hushy_store::StoreResult<R>,
    ) -> Option<R> {
        let guard = match self.state.lock() {
            Ok(g) => g,
            Err(_) => {
                tracing::warn!(op = what, "state lock poisoned, skipping cache");
                return None;
            }
        };
        let db = guard.database.as_ref()?;
        match f(db) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(op = what, error = %e, "cache operation failed");
                None
            }
        }
    }

    /// The signed-in user, or [`ClientError::NotAuthenticated`].
    pub fn require_user(&self) -> Result<User> {
        self.with_state(|s| s.session.as_ref().map(|s| s.user.clone()))?
            .ok_or(ClientError::NotAuthenticated)
    }
}
