// src/email/mod.rs
// =============================================================================
// This module contains the email address model.
//
// Submodules:
// - address: Parses one token into local part, domain, TLD and country
// - extract: Finds all email-like tokens in a block of text
// =============================================================================

mod address;
mod extract;

pub use address::{EmailAddress, EMAIL_TLDS, SKIP_TYPES};
pub use extract::EmailExtractor;

use thiserror::Error;

/// Reasons a token is not accepted as an email address.
///
/// The extractor drops candidates with any of these errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    /// Not exactly one `@`, or an empty side
    #[error("malformed address '{0}'")]
    MalformedAddress(String),
    /// Domain looks like a file name or has empty labels
    #[error("invalid domain '{0}'")]
    InvalidDomain(String),
    #[error("invalid top level domain '{0}'")]
    InvalidTopLevelDomain(String),
    #[error("invalid country code '{0}'")]
    InvalidCountry(String),
}
