//! # hushy-shared
//!
//! Types and pure logic shared by the Hushy client crates: backend records,
//! request payloads, validation of new secrets, keyword moderation, currency
//! detection and push-notification routing.

pub mod api;
pub mod constants;
pub mod currency;
pub mod error;
pub mod moderation;
pub mod notification;
pub mod payout;
pub mod types;
pub mod validation;
