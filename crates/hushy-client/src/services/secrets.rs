use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use hushy_shared::api::PurchaseResponse;
use hushy_shared::constants::SHARE_BASE_URL;
use hushy_shared::types::{GeoPoint, Secret, SecretId};
use hushy_shared::validation::{validate_draft, SecretDraft};

use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::state::Context;

/// Filters for the swipe feed.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    #[serde(rename = "lat", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(rename = "lng", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<u32>,
}

impl FeedQuery {
    pub fn near(point: GeoPoint, radius_km: u32) -> Self {
        Self {
            latitude: Some(point.latitude),
            longitude: Some(point.longitude),
            radius_km: Some(radius_km),
        }
    }
}

#[derive(Clone)]
pub struct SecretService {
    ctx: Context,
}

impl SecretService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Validate `draft` locally, then publish it. Nothing is sent when
    /// validation fails.
    pub async fn post_secret(&self, draft: &SecretDraft) -> Result<Secret> {
        let user = self.ctx.require_user()?;
        if !user.permissions.can_post {
            return Err(ClientError::Forbidden("posting is disabled for this account".into()));
        }

        let (currency, filter) = self
            .ctx
            .with_state(|s| (s.currency.unwrap_or_default(), s.keyword_filter.clone()))?;

        let body = validate_draft(draft, currency, &filter)?;

        let secret: Secret = self.ctx.api.post("/api/secrets", &body).await?;
        info!(secret = %secret.id, label = %secret.label, price = secret.price, "secret posted");
        self.ctx.events.emit(ClientEvent::SecretPosted(secret.id.clone()));
        Ok(secret)
    }

    /// Take down one of the user's own secrets.
    pub async fn delete_secret(&self, id: &SecretId) -> Result<()> {
        self.ctx.require_user()?;
        self.ctx.api.delete(&format!("/api/secrets/{id}")).await?;
        info!(secret = %id, "secret deleted");
        self.ctx.events.emit(ClientEvent::SecretDeleted(id.clone()));
        Ok(())
    }

    /// Secrets to swipe through, optionally around a location. Ones already
    /// past their expiry are dropped.
    pub async fn feed(&self, query: &FeedQuery) -> Result<Vec<Secret>> {
        let secrets: Vec<Secret> = self
            .ctx
            .api
            .get_with_query("/api/secrets/feed", query)
            .await?;
        let fetched = secrets.len();
        let live = drop_expired(secrets);
        debug!(fetched, live = live.len(), "feed loaded");
        Ok(live)
    }

    /// Secrets the signed-in user has posted.
    pub async fn my_secrets(&self) -> Result<Vec<Secret>> {
        self.ctx.require_user()?;
        self.ctx.api.get("/api/secrets/mine").await
    }

    /// Unlock a secret. Payment confirmation happens in the payment sheet
    /// before this call; the backend answers with the new conversation.
    pub async fn purchase(&self, id: &SecretId) -> Result<PurchaseResponse> {
        let user = self.ctx.require_user()?;
        if !user.permissions.can_purchase {
            return Err(ClientError::Forbidden("purchases are disabled for this account".into()));
        }

        let resp: PurchaseResponse = self
            .ctx
            .api
            .post(&format!("/api/secrets/{id}/purchase"), &serde_json::json!({}))
            .await?;
        info!(secret = %id, conversation = %resp.conversation_id, "secret purchased");
        Ok(resp)
    }

    /// Link to share a secret: the backend's own link when it sent one.
    pub fn share_url(secret: &Secret) -> String {
        secret
            .share_link
            .clone()
            .filter(|link| !link.is_empty())
            .unwrap_or_else(|| format!("{SHARE_BASE_URL}/{}", secret.id))
    }
}

fn drop_expired(secrets: Vec<Secret>) -> Vec<Secret> {
    let now = Utc::now();
    secrets.into_iter().filter(|s| !s.is_expired_at(now)).collect()
}
