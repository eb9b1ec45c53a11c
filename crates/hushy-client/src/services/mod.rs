//! Services wrapping the backend API.
//!
//! Each sub-module groups related operations by domain. Services are cheap
//! to clone: they only hold a [`Context`](crate::state::Context).

pub mod auth;
pub mod conversations;
pub mod currency;
pub mod link_preview;
pub mod moderation;
pub mod notifications;
pub mod payouts;
pub mod secrets;
