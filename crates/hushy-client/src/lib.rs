//! # hushy-client
//!
//! Headless client core of the Hushy app: everything between the screens
//! and the backend REST API. [`HushyClient`] wires the shared HTTP client,
//! the local cache database and the application state into one set of
//! services.

pub mod config;
pub mod dedup;
pub mod error;
pub mod events;
pub mod http;
pub mod retry;
pub mod services;
pub mod state;
pub mod throttle;
pub mod unread;

use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use hushy_store::Database;

pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, Result};
pub use crate::events::ClientEvent;

use crate::http::ApiClient;
use crate::services::auth::AuthService;
use crate::services::conversations::ConversationService;
use crate::services::currency::CurrencyService;
use crate::services::link_preview::{LinkPreviewConfig, LinkPreviewService};
use crate::services::moderation::ModerationService;
use crate::services::notifications::NotificationService;
use crate::services::payouts::PayoutService;
use crate::services::secrets::SecretService;
use crate::state::{AppState, Context};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hushy_client=debug,hushy_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

pub struct HushyClient {
    ctx: Context,
    previews: LinkPreviewService,
}

impl HushyClient {
    /// Resolve the backend, open the cache database and restore any
    /// persisted session.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let base_url =
            http::resolve_base_url(&config.api_urls, config.health_check_timeout).await?;

        let database = match &config.db_path {
            Some(path) => Database::open_at(path),
            None => Database::new(),
        };
        let database = match database {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!(error = %e, "cache database unavailable, running without it");
                None
            }
        };

        let client = Self::with_parts(
            ApiClient::new(&base_url, config.request_timeout)?,
            database,
            LinkPreviewConfig {
                timeout: config.preview_timeout,
                ..LinkPreviewConfig::default()
            },
        );

        client.auth().restore_session()?;
        client.currency().cached()?;
        client.link_previews().purge_expired();

        tracing::info!(base_url = %base_url, "Hushy client ready");
        Ok(client)
    }

    /// Assemble a client from already-built parts, without any network or
    /// disk access.
    pub fn with_parts(
        api: ApiClient,
        database: Option<Database>,
        preview_config: LinkPreviewConfig,
    ) -> Self {
        let ctx = Context::new(api, AppState::new(database));
        let previews = LinkPreviewService::new(ctx.clone(), preview_config);
        Self { ctx, previews }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.ctx.events.subscribe()
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.ctx.clone())
    }

    pub fn secrets(&self) -> SecretService {
        SecretService::new(self.ctx.clone())
    }

    pub fn conversations(&self) -> ConversationService {
        ConversationService::new(self.ctx.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.ctx.clone())
    }

    pub fn currency(&self) -> CurrencyService {
        CurrencyService::new(self.ctx.clone())
    }

    pub fn payouts(&self) -> PayoutService {
        PayoutService::new(self.ctx.clone())
    }

    pub fn moderation(&self) -> ModerationService {
        ModerationService::new(self.ctx.clone())
    }

    pub fn link_previews(&self) -> &LinkPreviewService {
        &self.previews
    }
}
