use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons a new secret is refused before it reaches the network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Price must be a number")]
    PriceNotFinite,

    #[error("Price {price} is below the minimum of {min}")]
    PriceTooLow { price: f64, min: f64 },

    #[error("Price {price} is above the maximum of {max}")]
    PriceTooHigh { price: f64, max: f64 },

    #[error("Secret content is empty")]
    EmptyContent,

    #[error("Secret content too long: {len} characters (max {max})")]
    ContentTooLong { len: usize, max: usize },

    #[error("Label is empty")]
    EmptyLabel,

    #[error("Label too long: {len} characters (max {max})")]
    LabelTooLong { len: usize, max: usize },

    #[error("Duration must be at least one hour")]
    InvalidDuration,

    #[error("Content blocked by moderation: {}", terms.join(", "))]
    Moderated { terms: Vec<String> },
}
