//! Client-side checks run on a new secret before anything is sent.

use crate::api::NewSecret;
use crate::constants::{
    DEFAULT_SECRET_DURATION_HOURS, MAX_LABEL_CHARS, MAX_SECRET_CONTENT_CHARS, MAX_SECRET_PRICE,
    MIN_SECRET_PRICE,
};
use crate::currency::Currency;
use crate::error::ValidationError;
use crate::moderation::{KeywordFilter, ModerationVerdict};
use crate::types::GeoPoint;

/// What the poster typed, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretDraft {
    pub content: String,
    pub label: String,
    pub price: f64,
    pub location: Option<GeoPoint>,
    pub duration_hours: Option<u32>,
}

impl SecretDraft {
    pub fn new(content: impl Into<String>, label: impl Into<String>, price: f64) -> Self {
        Self {
            content: content.into(),
            label: label.into(),
            price,
            location: None,
            duration_hours: None,
        }
    }
}

pub fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() {
        return Err(ValidationError::PriceNotFinite);
    }
    if price < MIN_SECRET_PRICE {
        return Err(ValidationError::PriceTooLow {
            price,
            min: MIN_SECRET_PRICE,
        });
    }
    if price > MAX_SECRET_PRICE {
        return Err(ValidationError::PriceTooHigh {
            price,
            max: MAX_SECRET_PRICE,
        });
    }
    Ok(())
}

/// Validate a draft and turn it into the request body.
pub fn validate_draft(
    draft: &SecretDraft,
    currency: Currency,
    filter: &KeywordFilter,
) -> Result<NewSecret, ValidationError> {
    validate_price(draft.price)?;

    let content = draft.content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    let len = content.chars().count();
    if len > MAX_SECRET_CONTENT_CHARS {
        return Err(ValidationError::ContentTooLong {
            len,
            max: MAX_SECRET_CONTENT_CHARS,
        });
    }

    let label = draft.label.trim();
    if label.is_empty() {
        return Err(ValidationError::EmptyLabel);
    }
    let label_len = label.chars().count();
    if label_len > MAX_LABEL_CHARS {
        return Err(ValidationError::LabelTooLong {
            len: label_len,
            max: MAX_LABEL_CHARS,
        });
    }

    let duration_hours = draft.duration_hours.unwrap_or(DEFAULT_SECRET_DURATION_HOURS);
    if duration_hours == 0 {
        return Err(ValidationError::InvalidDuration);
    }

    if let ModerationVerdict::Flagged { terms } = filter.check_text(content) {
        return Err(ValidationError::Moderated { terms });
    }

    Ok(NewSecret {
        content: content.to_string(),
        label: label.to_string(),
        price: draft.price,
        currency,
        location: draft.location,
        duration_hours,
    })
}
