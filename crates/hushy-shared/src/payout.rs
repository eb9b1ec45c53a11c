use serde::{Deserialize, Serialize};

// Connected-account state as reported by the payment processor, relayed by
// the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatusResponse {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub details_submitted: bool,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
    #[serde(default)]
    pub requirements_due: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// No connected account yet: onboarding must be started.
    NotStarted,
    /// Account exists but identity or bank details are still pending.
    Pending,
    /// Sales can be paid out.
    Active,
}

impl AccountStatusResponse {
    pub fn status(&self) -> PayoutStatus {
        if self.account_id.is_none() && !self.details_submitted {
            return PayoutStatus::NotStarted;
        }
        if self.details_submitted && self.charges_enabled && self.payouts_enabled {
            PayoutStatus::Active
        } else {
            PayoutStatus::Pending
        }
    }
}
