// src/email/extract.rs
// =============================================================================
// This module finds email addresses in arbitrary text (usually a whole HTML
// page).
//
// Extraction is best-effort:
// - A regex finds everything that looks roughly like an email
// - Duplicate matches are collapsed before parsing
// - Anything EmailAddress::parse rejects is dropped silently
// =============================================================================

use regex::Regex;
use std::collections::HashSet;
use tracing::trace;

use super::EmailAddress;

// local-chars @ domain-chars . tld-chars
const EMAIL_PATTERN: &str = r"[a-zA-Z0-9_.\-]+@[a-zA-Z0-9_.\-]+\.[a-zA-Z0-9_\-]+";

/// Scans text for email addresses.
#[derive(Debug, Clone)]
pub struct EmailExtractor {
    pattern: Regex,
}

impl EmailExtractor {
    pub fn new() -> Self {
        Self {
            // The pattern is a constant, so failing here is a programmer error
            pattern: Regex::new(EMAIL_PATTERN).expect("email pattern is valid"),
        }
    }

    // Returns every distinct address found in `text`
    //
    // Order is irrelevant, so the result is a HashSet.
    pub fn find_all(&self, text: &str) -> HashSet<EmailAddress> {
        let unique: HashSet<&str> = self.pattern.find_iter(text).map(|m| m.as_str()).collect();

        unique
            .into_iter()
            .filter_map(|candidate| match EmailAddress::parse(candidate) {
                Ok(address) => Some(address),
                Err(e) => {
                    trace!("discarding candidate {}: {}", candidate, e);
                    None
                }
            })
            .collect()
    }
}

impl Default for EmailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse() {
        let extractor = EmailExtractor::new();
        let found = extractor.find_all("mail info@example.com or info@example.com today");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_case_variants_are_distinct() {
        let extractor = EmailExtractor::new();
        let found = extractor.find_all("contact jane.doe@example.com or JANE.DOE@EXAMPLE.COM.UK");
        assert_eq!(found.len(), 2);

        let with_country: Vec<_> = found.iter().filter(|e| e.country().is_some()).collect();
        assert_eq!(with_country.len(), 1);
        assert_eq!(with_country[0].country(), Some("uk"));
    }

    #[test]
    fn test_file_names_are_discarded() {
        let extractor = EmailExtractor::new();
        let html = r#"<img src="/img/logo@2x.png"> <a href="mailto:sales@shop.org">Sales</a>"#;
        let found = extractor.find_all(html);
        assert_eq!(found.len(), 1);
        assert_eq!(found.iter().next().unwrap().to_string(), "sales@shop.org");
    }

    #[test]
    fn test_no_matches() {
        let extractor = EmailExtractor::new();
        assert!(extractor.find_all("nothing to see @ here").is_empty());
    }
}
