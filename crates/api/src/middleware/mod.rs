//! Request extractors.
//!
//! - [`auth::AuthUser`] -- the verified caller from a Bearer token.

pub mod auth;
