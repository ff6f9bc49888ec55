//! Bearer token validation.
//!
//! Identity is issued elsewhere; this service only verifies HS256 access
//! tokens and reads the caller's user id from `sub`.

pub mod jwt;
