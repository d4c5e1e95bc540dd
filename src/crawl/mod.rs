// src/crawl/mod.rs
// =============================================================================
// This module handles crawling one website for email addresses.
//
// Features:
// - Breadth-first crawling from the site root
// - Same-host restriction (never leaves the site)
// - Skips binary downloads and calendar pages that generate endless links
// - Error budget: a site that mostly fails is abandoned early, keeping
//   whatever was collected so far
//
// Submodules:
// - engine: Seed resolution and the traversal loop
// - links: Which hrefs to follow
// - html: Pulls hrefs out of a page
// - queue: The pending work set
// =============================================================================

mod engine;
mod html;
mod links;
mod queue;

pub use engine::{error_budget_exhausted, CrawlEngine, DomainCrawlResult};
pub use html::extract_anchor_hrefs;
pub use links::LinkRules;
pub use queue::Frontier;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("no seed link provided")]
    NoSeedLink,
    /// Neither http nor https could reach the seed; the crawl cannot start
    #[error("unable to fetch seed {url}: {reason}")]
    SeedFetchFailed { url: String, reason: String },
    #[error("unable to resolve host {host}: {reason}")]
    HostUnresolved { host: String, reason: String },
    // The next three are counted against the error budget, never returned
    #[error("failed to fetch {url}: {reason}")]
    PageFetchFailed { url: String, reason: String },
    #[error("bad status {status} for {url}")]
    BadStatus { url: String, status: u16 },
    #[error("failed to decode {url}: {reason}")]
    DecodeFailed { url: String, reason: String },
    #[error("invalid calendar pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
