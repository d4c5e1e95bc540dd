// src/crawl/html.rs
// =============================================================================
// This module pulls the raw href values out of an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Nothing is resolved or filtered here. Deciding which links to follow is the
// job of links.rs.
// =============================================================================

use scraper::{Html, Selector};

// Returns the href of every <a> tag, in document order, duplicates included
//
// Example:
//   html = "<a href='/docs'>Docs</a><a>no link</a><a href='/docs'>again</a>"
//   result = ["/docs", "/docs"]
pub fn extract_anchor_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // Our selector is a constant and known to be valid
    let selector = Selector::parse("a[href]").expect("anchor selector is valid");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hrefs_in_order() {
        let html = r#"
            <a href="https://www.rust-lang.org">Rust</a>
            <a href="/docs">Docs</a>
            <a href="../about">About</a>
        "#;
        let hrefs = extract_anchor_hrefs(html);
        assert_eq!(hrefs, vec!["https://www.rust-lang.org", "/docs", "../about"]);
    }

    #[test]
    fn test_anchor_without_href_is_ignored() {
        let html = r#"<a name="top">Top</a><a href=" /contact ">Contact</a>"#;
        assert_eq!(extract_anchor_hrefs(html), vec!["/contact"]);
    }

    #[test]
    fn test_duplicates_kept() {
        let html = r#"<a href="/a">1</a><a href="/a">2</a>"#;
        assert_eq!(extract_anchor_hrefs(html).len(), 2);
    }
}
