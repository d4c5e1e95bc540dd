// src/crawl/links.rs
// =============================================================================
// This module decides which hrefs on a page are worth crawling.
//
// An href is followed only if:
// 1. It stays on the host we are crawling
// 2. It is an http(s) link (no mailto:, tel:, javascript:)
// 3. Its path does not end in a binary file type (pdf, zip, jpg, ...)
// 4. The resolved URL is not a calendar page. Event plugins generate a page
//    per day/week/month forever, and would keep the crawl busy for days
//
// Fragments, query strings, "&..." tails and "@..." tails are stripped, so
// "/contact?ref=nav#form" and "/contact" count as the same page.
//
// Rust concepts:
// - Option<T>: admit() returns None for links we skip
// - Regex: Compiled once, reused for every link
// =============================================================================

use regex::Regex;
use url::Url;

use super::CrawlError;
use crate::config::CrawlConfig;

/// Link admission rules, compiled from the crawl config.
#[derive(Debug, Clone)]
pub struct LinkRules {
    skip_types: Vec<String>,
    calendar_patterns: Vec<Regex>,
}

impl LinkRules {
    pub fn from_config(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let calendar_patterns = config
            .calendar_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| CrawlError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_types: config.skip_types.iter().map(|t| t.to_lowercase()).collect(),
            calendar_patterns,
        })
    }

    // Turns an href into an absolute URL to crawl, or None to skip it
    //
    // Parameters:
    //   href: the raw attribute value
    //   base: canonical base of the site ("https://example.com/")
    //   host: lower-cased host (with port, if the site uses one)
    //
    // Relative paths resolve against the site root, not the current page.
    pub fn admit(&self, href: &str, base: &Url, host: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        // External reference
        if href.contains("//") {
            let after_scheme = href.rsplit("//").next().unwrap_or_default();
            let check_host = after_scheme.split('/').next().unwrap_or_default();
            if !check_host.eq_ignore_ascii_case(host) {
                return None;
            }
        }

        let path = match Url::parse(href) {
            Ok(absolute) => {
                if absolute.scheme() != "http" && absolute.scheme() != "https" {
                    return None;
                }
                absolute.path().to_string()
            }
            Err(_) => href
                .split(|c: char| c == '?' || c == '#')
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        let path = clean_path(&path);
        if self.is_skipped_type(path) {
            return None;
        }

        let resolved = base.join(path).ok()?.to_string();

        if self.is_calendar(&resolved) {
            return None;
        }

        Some(resolved)
    }

    pub fn is_skipped_type(&self, path: &str) -> bool {
        let ending = path.rsplit('.').next().unwrap_or_default().to_lowercase();
        self.skip_types.iter().any(|t| *t == ending)
    }

    pub fn is_calendar(&self, url: &str) -> bool {
        self.calendar_patterns.iter().any(|p| p.is_match(url))
    }
}

// Drops "#...", "&..." and "@..." tails
fn clean_path(path: &str) -> &str {
    let path = path.split('#').next().unwrap_or_default();
    let path = path.split('&').next().unwrap_or_default();
    path.split('@').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> LinkRules {
        LinkRules::from_config(&CrawlConfig::default()).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_relative_link_resolves_against_root() {
        let admitted = rules().admit("about/team.html", &base(), "example.com");
        assert_eq!(admitted.as_deref(), Some("https://example.com/about/team.html"));
    }

    #[test]
    fn test_same_host_absolute_link() {
        let admitted = rules().admit("http://EXAMPLE.com/contact", &base(), "example.com");
        assert_eq!(admitted.as_deref(), Some("https://example.com/contact"));
    }

    #[test]
    fn test_external_link_skipped() {
        assert_eq!(rules().admit("https://other.org/page", &base(), "example.com"), None);
        assert_eq!(rules().admit("//cdn.other.org/app", &base(), "example.com"), None);
    }

    #[test]
    fn test_query_fragment_and_tails_stripped() {
        let r = rules();
        assert_eq!(
            r.admit("/contact?ref=nav#form", &base(), "example.com").as_deref(),
            Some("https://example.com/contact")
        );
        assert_eq!(
            r.admit("/staff&sort=name", &base(), "example.com").as_deref(),
            Some("https://example.com/staff")
        );
        assert_eq!(
            r.admit("/people/jane@home", &base(), "example.com").as_deref(),
            Some("https://example.com/people/jane")
        );
    }

    #[test]
    fn test_fragment_only_points_at_root() {
        assert_eq!(
            rules().admit("#top", &base(), "example.com").as_deref(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn test_non_http_schemes_skipped() {
        let r = rules();
        assert_eq!(r.admit("mailto:info@example.com", &base(), "example.com"), None);
        assert_eq!(r.admit("tel:+15551234", &base(), "example.com"), None);
        assert_eq!(r.admit("javascript:void(0)", &base(), "example.com"), None);
        assert_eq!(r.admit("   ", &base(), "example.com"), None);
    }

    #[test]
    fn test_file_types_skipped() {
        let r = rules();
        assert_eq!(r.admit("/files/report.PDF", &base(), "example.com"), None);
        assert_eq!(r.admit("/download.zip?v=2", &base(), "example.com"), None);
        assert!(r.admit("/index.html", &base(), "example.com").is_some());
    }

    #[test]
    fn test_calendar_pages_skipped() {
        let r = rules();
        assert_eq!(r.admit("/events/2024-11-05/", &base(), "example.com"), None);
        assert_eq!(r.admit("/calendar/2024/11", &base(), "example.com"), None);
        assert_eq!(r.admit("/events/action~month/", &base(), "example.com"), None);
        assert_eq!(r.admit("/calendar/month/202411", &base(), "example.com"), None);
        assert_eq!(
            r.admit("/events/community-picnic/", &base(), "example.com").as_deref(),
            Some("https://example.com/events/community-picnic/")
        );
    }

    #[test]
    fn test_custom_calendar_patterns() {
        let config = CrawlConfig {
            calendar_patterns: vec![r"(?i)/agenda/\d{4}".to_string()],
            ..CrawlConfig::default()
        };
        let r = LinkRules::from_config(&config).unwrap();
        assert_eq!(r.admit("/agenda/2025/01", &base(), "example.com"), None);
        assert!(r.admit("/events/2024-11-05/", &base(), "example.com").is_some());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = CrawlConfig {
            calendar_patterns: vec!["(unclosed".to_string()],
            ..CrawlConfig::default()
        };
        assert!(matches!(
            LinkRules::from_config(&config),
            Err(CrawlError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_port_is_part_of_host() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let r = rules();
        assert_eq!(
            r.admit("http://127.0.0.1:8080/about", &base, "127.0.0.1:8080").as_deref(),
            Some("http://127.0.0.1:8080/about")
        );
        assert_eq!(r.admit("http://127.0.0.1:9090/about", &base, "127.0.0.1:8080"), None);
    }
}
