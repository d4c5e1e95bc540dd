// src/email/address.rs
// =============================================================================
// This module turns one email-like token into a structured address.
//
// Text scraped from web pages is noisy. A match like "logo@2x.png" or
// "JANE@EXAMPLE.COMcontact" looks like an email to a regex, so parsing uses a
// few heuristics:
// - Filenames (last label is a known file extension) are rejected
// - A trailing 2-letter label is a country code ("uk", "de")
// - The next label is a top-level domain if it STARTS with a known one,
//   which tolerates run-on garbage like "comcontact"
// - All-numeric domains (IP literals) are kept exactly as written
//
// Rust concepts:
// - Result<T, E>: parse returns an error instead of panicking
// - impl Display: gives us .to_string() for the reconstructed address
// - Manual PartialEq/Hash: equality ignores the raw text we started from
// =============================================================================

use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::EmailError;

/// Top-level domains we accept in an email address.
pub const EMAIL_TLDS: [&str; 8] = ["bank", "com", "org", "net", "int", "edu", "gov", "mil"];

/// File extensions that show up after an `@` in image names, downloads, etc.
///
/// The crawler also uses this list to avoid following links to binary files.
pub const SKIP_TYPES: [&str; 12] = [
    "doc", "docx", "xls", "xlsx", "pdf", "png", "jpg", "jpeg", "zip", "mp3", "mp4", "exe",
];

// Minified javascript produces "@md.x" style tokens
const PLACEHOLDER_LABEL: &str = "x";

/// A parsed email address.
#[derive(Debug, Clone, Serialize)]
pub struct EmailAddress {
    /// The text exactly as it was matched
    raw: String,
    local_part: String,
    domain_labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_level_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
}

impl EmailAddress {
    // Parses a raw token into an EmailAddress
    //
    // Examples:
    //   "user@sub.example.gov.uk" -> local "user", labels ["sub", "example"],
    //                                tld "gov", country "uk"
    //   "a@b.comxyz"              -> tld "com" (run-on text is dropped)
    //   "icon@2x.png"             -> Err(InvalidDomain)
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let mut parts = raw.split('@');
        let (local_part, domain) = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => (local, domain),
            _ => return Err(EmailError::MalformedAddress(raw.to_string())),
        };

        if local_part.is_empty() || domain.is_empty() {
            return Err(EmailError::MalformedAddress(raw.to_string()));
        }

        let mut labels: Vec<String> = domain.split('.').map(str::to_string).collect();

        if labels.iter().any(|label| label.is_empty()) {
            return Err(EmailError::InvalidDomain(domain.to_string()));
        }

        // split() always yields at least one item, so last() is present
        let last = labels.last().map(|l| l.to_ascii_lowercase()).unwrap_or_default();
        if last == PLACEHOLDER_LABEL || SKIP_TYPES.contains(&last.as_str()) {
            return Err(EmailError::InvalidDomain(domain.to_string()));
        }

        let mut top_level_domain = None;
        let mut country = None;

        let all_numeric = labels
            .iter()
            .all(|label| label.chars().all(|c| c.is_ascii_digit()));

        if !all_numeric {
            if labels.len() > 1 && labels.last().is_some_and(|l| l.chars().count() == 2) {
                country = labels.pop().map(|c| c.to_lowercase());
            }

            if labels.len() > 1 {
                if let Some(tld) = labels.last().and_then(|l| starts_with_tld(l)) {
                    top_level_domain = Some(tld.to_string());
                    labels.pop();
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            local_part: local_part.to_string(),
            domain_labels: labels,
            top_level_domain,
            country,
        })
    }

    /// Returns a copy with a different top-level domain.
    ///
    /// Fails with `InvalidTopLevelDomain` unless `tld` is one of [`EMAIL_TLDS`].
    pub fn with_top_level_domain(&self, tld: Option<&str>) -> Result<Self, EmailError> {
        let top_level_domain = match tld {
            Some(value) => {
                let lowered = value.to_lowercase();
                if !EMAIL_TLDS.contains(&lowered.as_str()) {
                    return Err(EmailError::InvalidTopLevelDomain(lowered));
                }
                Some(lowered)
            }
            None => None,
        };

        Ok(Self {
            top_level_domain,
            ..self.clone()
        })
    }

    /// Returns a copy with a different country code (exactly 2 characters).
    pub fn with_country(&self, country: Option<&str>) -> Result<Self, EmailError> {
        let country = match country {
            Some(value) if value.chars().count() == 2 => Some(value.to_lowercase()),
            Some(value) => return Err(EmailError::InvalidCountry(value.to_string())),
            None => None,
        };

        Ok(Self {
            country,
            ..self.clone()
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain_labels(&self) -> &[String] {
        &self.domain_labels
    }

    /// The domain without top-level domain and country.
    pub fn domain(&self) -> String {
        self.domain_labels.join(".")
    }

    pub fn top_level_domain(&self) -> Option<&str> {
        self.top_level_domain.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

// Checks whether a label starts with a known TLD and returns that TLD
//
// None of the TLDs is a prefix of another, so at most one can match.
fn starts_with_tld(label: &str) -> Option<&'static str> {
    let lowered = label.to_lowercase();
    EMAIL_TLDS.iter().copied().find(|tld| lowered.starts_with(tld))
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain())?;
        if let Some(tld) = &self.top_level_domain {
            write!(f, ".{}", tld)?;
        }
        if let Some(country) = &self.country {
            write!(f, ".{}", country)?;
        }
        Ok(())
    }
}

impl PartialEq for EmailAddress {
    fn eq(&self, other: &Self) -> bool {
        self.local_part == other.local_part
            && self.domain_labels == other.domain_labels
            && self.top_level_domain == other.top_level_domain
            && self.country == other.country
    }
}

impl Eq for EmailAddress {}

impl Hash for EmailAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local_part.hash(state);
        self.domain_labels.hash(state);
        self.top_level_domain.hash(state);
        self.country.hash(state);
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why implement PartialEq and Hash by hand?
//    - #[derive] would compare every field, including `raw`
//    - "a@b.comxyz" and "a@b.com" parse to the same address, and we want a
//      HashSet to keep only one of them
//    - Eq and Hash must agree: equal values must hash the same, so both
//      skip `raw`
//
// 2. What is `..self.clone()`?
//    - Struct update syntax: take the named fields from the left, fill the
//      rest from another value of the same type
//
// 3. Why return a new value from with_top_level_domain?
//    - Validation happens before anything is built
//    - If it fails, the original address is untouched
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gov_with_country() {
        let email = EmailAddress::parse("user@sub.example.gov.uk").unwrap();
        assert_eq!(email.local_part(), "user");
        assert_eq!(email.domain_labels(), ["sub", "example"]);
        assert_eq!(email.top_level_domain(), Some("gov"));
        assert_eq!(email.country(), Some("uk"));
        assert_eq!(email.to_string(), "user@sub.example.gov.uk");
    }

    #[test]
    fn test_parse_plain_com() {
        let email = EmailAddress::parse("jane.doe@example.com").unwrap();
        assert_eq!(email.local_part(), "jane.doe");
        assert_eq!(email.domain(), "example");
        assert_eq!(email.top_level_domain(), Some("com"));
        assert_eq!(email.country(), None);
    }

    #[test]
    fn test_uppercase_country_and_tld_are_lowered() {
        let email = EmailAddress::parse("JANE.DOE@EXAMPLE.COM.UK").unwrap();
        assert_eq!(email.domain(), "EXAMPLE");
        assert_eq!(email.top_level_domain(), Some("com"));
        assert_eq!(email.country(), Some("uk"));
        assert_eq!(email.to_string(), "JANE.DOE@EXAMPLE.com.uk");
    }

    #[test]
    fn test_run_on_tld_is_trimmed() {
        let email = EmailAddress::parse("info@bank.comContact").unwrap();
        assert_eq!(email.domain(), "bank");
        assert_eq!(email.top_level_domain(), Some("com"));
        assert_eq!(email.raw(), "info@bank.comContact");
        assert_eq!(email.to_string(), "info@bank.com");
    }

    #[test]
    fn test_unknown_tld_stays_in_domain() {
        let email = EmailAddress::parse("hello@example.xyz").unwrap();
        assert_eq!(email.domain(), "example.xyz");
        assert_eq!(email.top_level_domain(), None);
    }

    #[test]
    fn test_numeric_domain_untouched() {
        let email = EmailAddress::parse("root@10.0.0.12").unwrap();
        assert_eq!(email.domain(), "10.0.0.12");
        assert_eq!(email.top_level_domain(), None);
        assert_eq!(email.country(), None);
    }

    #[test]
    fn test_reject_file_names() {
        assert!(matches!(
            EmailAddress::parse("logo@2x.png"),
            Err(EmailError::InvalidDomain(_))
        ));
        assert!(matches!(
            EmailAddress::parse("banner@large.JPG"),
            Err(EmailError::InvalidDomain(_))
        ));
        assert!(matches!(
            EmailAddress::parse("a@md.x"),
            Err(EmailError::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_placeholder_label_ignores_case() {
        assert!(matches!(
            EmailAddress::parse("a@b.X"),
            Err(EmailError::InvalidDomain(_))
        ));
        assert!(EmailAddress::parse("a@b.xy").is_ok());
    }

    #[test]
    fn test_reject_malformed() {
        assert!(matches!(
            EmailAddress::parse("no-at-sign.com"),
            Err(EmailError::MalformedAddress(_))
        ));
        assert!(matches!(
            EmailAddress::parse("a@b@c.com"),
            Err(EmailError::MalformedAddress(_))
        ));
        assert!(matches!(
            EmailAddress::parse("@example.com"),
            Err(EmailError::MalformedAddress(_))
        ));
        assert!(matches!(
            EmailAddress::parse("a@example..com"),
            Err(EmailError::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_setting_unknown_tld_fails() {
        let email = EmailAddress::parse("a@b.com").unwrap();
        let result = email.with_top_level_domain(Some("xyz"));
        assert!(matches!(result, Err(EmailError::InvalidTopLevelDomain(ref t)) if t == "xyz"));
        // The original is unchanged
        assert_eq!(email.top_level_domain(), Some("com"));

        let updated = email.with_top_level_domain(Some("ORG")).unwrap();
        assert_eq!(updated.to_string(), "a@b.org");
    }

    #[test]
    fn test_setting_country() {
        let email = EmailAddress::parse("a@b.com").unwrap();
        assert_eq!(email.with_country(Some("DE")).unwrap().to_string(), "a@b.com.de");
        assert!(matches!(
            email.with_country(Some("deu")),
            Err(EmailError::InvalidCountry(_))
        ));
    }

    #[test]
    fn test_round_trip_is_stable() {
        let samples = [
            "user@sub.example.gov.uk",
            "JANE.DOE@EXAMPLE.COM.UK",
            "info@bank.comContact",
            "a@b.comm.uk",
            "a@b.com.comx",
            "a@b.uk.com",
            "a@com.uk",
            "root@10.0.0.12",
            "x@12.com.34",
            "hello@example.xyz",
            "team@mail.example.edu",
        ];

        for sample in samples {
            let first = EmailAddress::parse(sample).unwrap();
            let second = EmailAddress::parse(&first.to_string()).unwrap();
            assert_eq!(first, second, "round trip changed {}", sample);
            assert_eq!(first.to_string(), second.to_string());
        }
    }

    #[test]
    fn test_equality_ignores_raw_text() {
        let a = EmailAddress::parse("a@b.comxyz").unwrap();
        let b = EmailAddress::parse("a@b.com").unwrap();
        assert_eq!(a, b);
        assert_ne!(a.raw(), b.raw());
    }
}
