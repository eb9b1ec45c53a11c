use tracing::info;
use url::Url;

use hushy_shared::api::{OnboardingLink, PaymentIntent, PaymentIntentRequest};
use hushy_shared::payout::{AccountStatusResponse, PayoutStatus};
use hushy_shared::types::SecretId;

use crate::error::{ClientError, Result};
use crate::state::Context;

/// Seller payouts and buyer payments through the payment processor. The
/// processor's own UI (payment sheet, onboarding pages) is not driven from
/// here; this service only fetches what it needs from the backend.
#[derive(Clone)]
pub struct PayoutService {
    ctx: Context,
}

impl PayoutService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Payout readiness of the seller's connected account, with the raw
    /// response for the details screen.
    pub async fn account_status(&self) -> Result<(PayoutStatus, AccountStatusResponse)> {
        self.ctx.require_user()?;
        let resp: AccountStatusResponse = self.ctx.api.get("/api/payments/account-status").await?;
        Ok((resp.status(), resp))
    }

    /// URL of the processor-hosted onboarding flow.
    pub async fn onboarding_link(&self) -> Result<Url> {
        self.ctx.require_user()?;
        let link: OnboardingLink = self
            .ctx
            .api
            .post("/api/payments/onboarding-link", &serde_json::json!({}))
            .await?;

        let url = Url::parse(&link.url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", link.url)))?;
        if url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!("insecure onboarding URL {url}")));
        }
        info!("onboarding link issued");
        Ok(url)
    }

    /// Client secret for the payment sheet that buys `secret_id`.
    pub async fn create_payment_intent(&self, secret_id: &SecretId) -> Result<PaymentIntent> {
        let user = self.ctx.require_user()?;
        if !user.permissions.can_purchase {
            return Err(ClientError::Forbidden("purchases are disabled for this account".into()));
        }

        let intent: PaymentIntent = self
            .ctx
            .api
            .post(
                "/api/payments/payment-intent",
                &PaymentIntentRequest { secret_id },
            )
            .await?;
        info!(secret = %secret_id, "payment intent created");
        Ok(intent)
    }
}
