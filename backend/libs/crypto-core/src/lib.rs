//! Shared cryptographic helpers for Socially services
//!
//! - `jwt`: identity-provider session token verification

pub mod jwt;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_keys;
