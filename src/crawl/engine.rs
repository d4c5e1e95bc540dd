// src/crawl/engine.rs
// =============================================================================
// This module crawls one website and collects the email addresses on it.
//
// How it works:
// 1. Resolve the seed: try plain http first, fall back to https. The final
//    URL after redirects becomes the canonical base ("https://example.com/")
// 2. Look up the site's IP and ask the routing lookup who announces it
// 3. Start with the base in the pending set
// 4. Take a link, fetch it, pull out emails and same-host links
// 5. Repeat until nothing is pending or the error budget runs out
//
// Error budget:
// - Failed fetches, bad statuses and undecodable pages each count as errors
// - After more than `error_floor` errors, if errors exceed
//   floor(error_ratio * visited), the crawl stops and returns what it has
//
// Concurrency:
// - Up to `workers` pending links are taken per round and fetched at once
// - Results are processed one by one afterwards, so the visited set and
//   the frontier are never touched by two tasks at the same time
//
// Rust concepts:
// - async/await: Fetches are the only places we wait
// - &dyn Trait: The routing lookup is any type implementing RoutingLookup
// - join_all: Run several futures and collect all results
// =============================================================================

use futures::future::join_all;
use reqwest::{header, Client, Response, StatusCode};
use serde::Serialize;
use std::collections::HashSet;
use std::net::IpAddr;
use tracing::{debug, info, warn};
use url::{Host, Url};

use super::html::extract_anchor_hrefs;
use super::links::LinkRules;
use super::queue::Frontier;
use super::CrawlError;
use crate::config::CrawlConfig;
use crate::email::{EmailAddress, EmailExtractor};
use crate::routing::{RoutingInfo, RoutingLookup};

/// Everything one crawl found out about a site.
#[derive(Debug, Clone, Serialize)]
pub struct DomainCrawlResult {
    pub seed_link: String,
    /// scheme://host[:port]/ after redirects
    pub base_url: String,
    /// Lower-cased host (with port when the site uses a non-default one)
    pub host: String,
    pub ip: IpAddr,
    pub routing: RoutingInfo,
    pub emails: HashSet<EmailAddress>,
    pub visited: HashSet<String>,
    /// Links still waiting when the crawl ended (only when stopped early)
    pub pending: Vec<String>,
    pub error_count: u32,
    pub links_visited: usize,
    /// True when the error budget ended the crawl
    pub stopped_early: bool,
}

// Seed resolution output
struct Site {
    base: Url,
    host: String,
    ip: IpAddr,
}

// Mutable state of the traversal loop
struct CrawlState {
    frontier: Frontier,
    visited: HashSet<String>,
    emails: HashSet<EmailAddress>,
    error_count: u32,
}

// Returns true when the crawl has failed too often to keep going
//
// Examples (floor 3, ratio 0.9):
//   4 errors, 3 visited  -> threshold 2 -> stop
//   4 errors, 10 visited -> threshold 9 -> continue
//   3 errors, 1 visited  -> not past the floor yet -> continue
pub fn error_budget_exhausted(error_count: u32, visited: usize, floor: u32, ratio: f64) -> bool {
    if error_count <= floor {
        return false;
    }
    let threshold = (ratio * visited as f64).floor() as u64;
    u64::from(error_count) > threshold
}

pub struct CrawlEngine {
    client: Client,
    config: CrawlConfig,
    rules: LinkRules,
    extractor: EmailExtractor,
}

impl CrawlEngine {
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        let rules = LinkRules::from_config(&config)?;

        Ok(Self {
            client,
            config,
            rules,
            extractor: EmailExtractor::new(),
        })
    }

    // Crawls the site behind `seed_link`
    //
    // Returns an error only if the seed cannot be resolved. Everything that
    // goes wrong later just counts against the error budget.
    pub async fn crawl(
        &self,
        seed_link: &str,
        routing: &dyn RoutingLookup,
    ) -> Result<DomainCrawlResult, CrawlError> {
        if seed_link.trim().is_empty() {
            return Err(CrawlError::NoSeedLink);
        }

        let site = self.resolve_seed(seed_link.trim()).await?;

        let mut routing_info = routing.ip_to_asn_info(site.ip);
        if routing_info.asn_number.is_none() {
            routing_info.asn_number = routing.ip_to_asn(site.ip);
        }

        info!(
            "crawling {} (host {}, ip {}, asn {:?})",
            site.base, site.host, site.ip, routing_info.asn_number
        );

        let mut state = CrawlState {
            frontier: Frontier::new(self.config.ordered),
            visited: HashSet::new(),
            emails: HashSet::new(),
            error_count: 0,
        };
        state.frontier.push(site.base.to_string());

        let stopped_early = self.traverse(&site, &mut state).await;

        let links_visited = state.visited.len();
        info!(
            "finished {}: {} links visited, {} emails, {} errors{}",
            site.base,
            links_visited,
            state.emails.len(),
            state.error_count,
            if stopped_early { " (stopped early)" } else { "" }
        );

        Ok(DomainCrawlResult {
            seed_link: seed_link.to_string(),
            base_url: site.base.to_string(),
            host: site.host,
            ip: site.ip,
            routing: routing_info,
            emails: state.emails,
            visited: state.visited,
            pending: state.frontier.drain(),
            error_count: state.error_count,
            links_visited,
            stopped_early,
        })
    }

    // Runs the traversal loop; returns true if the error budget ended it
    async fn traverse(&self, site: &Site, state: &mut CrawlState) -> bool {
        let workers = self.config.workers.max(1);
        let mut stopped_early = false;

        while !state.frontier.is_empty() && !stopped_early {
            debug!(
                "visited: {} to do: {} errors: {}",
                state.visited.len(),
                state.frontier.len(),
                state.error_count
            );

            let mut batch = Vec::with_capacity(workers);
            while batch.len() < workers {
                let Some(link) = state.frontier.pop() else {
                    break;
                };
                state.visited.insert(link.clone());

                if error_budget_exhausted(
                    state.error_count,
                    state.visited.len(),
                    self.config.error_floor,
                    self.config.error_ratio,
                ) {
                    info!(
                        "stopping after {} errors in {} links",
                        state.error_count,
                        state.visited.len()
                    );
                    stopped_early = true;
                    break;
                }
                batch.push(link);
            }

            let pages = join_all(batch.iter().map(|link| self.fetch_page(link))).await;

            for (link, page) in batch.iter().zip(pages) {
                let outcome = match page {
                    Ok(Some(body)) => self.process_page(link, body, site, state),
                    Ok(None) => {
                        debug!("skipping non-text page {}", link);
                        Ok(())
                    }
                    Err(e) => Err(e),
                };

                if let Err(e) = outcome {
                    state.error_count += 1;
                    debug!("{} (error count {})", e, state.error_count);
                }
            }
        }

        stopped_early
    }

    // Finds the canonical base URL, host and IP for a seed link
    async fn resolve_seed(&self, seed_link: &str) -> Result<Site, CrawlError> {
        let bare = seed_link.rsplit("//").next().unwrap_or(seed_link);
        let plain = format!("http://{}", bare);

        debug!("processing url {}", plain);
        let first = self
            .client
            .get(&plain)
            .timeout(self.config.seed_timeout())
            .send()
            .await;
        let mut final_url = match first {
            Ok(response) => self.usable_seed_response(response).await,
            Err(e) => {
                debug!("plain http failed for {}: {}", plain, e);
                None
            }
        };

        if final_url.is_none() {
            let secure = format!("https://{}", bare);
            warn!("attempting secure url {}", secure);
            let response = self
                .client
                .get(&secure)
                .timeout(self.config.seed_timeout())
                .send()
                .await
                .map_err(|e| CrawlError::SeedFetchFailed {
                    url: secure.clone(),
                    reason: e.to_string(),
                })?;
            final_url = Some(response.url().clone());
        }

        let url = final_url.ok_or_else(|| CrawlError::SeedFetchFailed {
            url: plain.clone(),
            reason: "no response".to_string(),
        })?;

        let host_str = url.host_str().ok_or_else(|| CrawlError::HostUnresolved {
            host: url.to_string(),
            reason: "URL has no host".to_string(),
        })?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host_str, port),
            None => host_str.to_string(),
        };

        let ip = resolve_ip(&url).await?;
        let base = Url::parse(&format!("{}://{}/", url.scheme(), authority)).map_err(|e| {
            CrawlError::SeedFetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!("clean address should be {}", base);
        Ok(Site {
            base,
            host: authority.to_lowercase(),
            ip,
        })
    }

    // The final URL of a plain-http seed response, or None if we should
    // retry over https instead
    async fn usable_seed_response(&self, response: Response) -> Option<Url> {
        if response.status() != StatusCode::OK {
            debug!("seed answered {}", response.status());
            return None;
        }

        let url = response.url().clone();
        match response.text().await {
            Ok(body) if !body.contains(&self.config.failure_marker) => Some(url),
            Ok(_) => {
                debug!("seed page {} reports a failure", url);
                None
            }
            Err(e) => {
                debug!("failed to read seed page {}: {}", url, e);
                None
            }
        }
    }

    // Fetches one page
    //
    // Returns:
    //   Ok(Some(body)) for a 200 text page
    //   Ok(None) for a 200 page that is not text (images, PDFs, ...)
    //   Err(...) for transport failures and non-200 statuses
    async fn fetch_page(&self, link: &str) -> Result<Option<Vec<u8>>, CrawlError> {
        debug!("processing link {}", link);

        let (url, response) = match self.get_page(link).await {
            Ok(response) => (link.to_string(), response),
            Err(e) => {
                debug!("exception {} for {}, retrying over https", e, link);
                let secure = format!("https://{}", link.rsplit("//").next().unwrap_or(link));
                let response = self.get_page(&secure).await.map_err(|e| {
                    CrawlError::PageFetchFailed {
                        url: secure.clone(),
                        reason: e.to_string(),
                    }
                })?;
                (secure, response)
            }
        };

        if response.status() != StatusCode::OK {
            return Err(CrawlError::BadStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        // A missing content type is treated as binary
        let is_text = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text"));
        if !is_text {
            return Ok(None);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CrawlError::PageFetchFailed {
                url,
                reason: e.to_string(),
            })?;
        Ok(Some(body.to_vec()))
    }

    async fn get_page(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(url)
            .timeout(self.config.page_timeout())
            .send()
            .await
    }

    // Extracts emails and new links from a fetched page
    fn process_page(
        &self,
        link: &str,
        body: Vec<u8>,
        site: &Site,
        state: &mut CrawlState,
    ) -> Result<(), CrawlError> {
        let content = String::from_utf8(body).map_err(|e| CrawlError::DecodeFailed {
            url: link.to_string(),
            reason: e.to_string(),
        })?;

        let found = self.extractor.find_all(&content);
        let found_count = found.len();
        state.emails.extend(found);
        debug!(
            "found {} emails on {}, {} thus far",
            found_count,
            link,
            state.emails.len()
        );

        let hrefs = extract_anchor_hrefs(&content);
        debug!("found {} links", hrefs.len());

        for href in hrefs {
            let Some(new_link) = self.rules.admit(&href, &site.base, &site.host) else {
                continue;
            };
            if !state.visited.contains(&new_link) && state.frontier.push(new_link.clone()) {
                debug!("adding new link {}", new_link);
            }
        }

        Ok(())
    }
}

// Resolves the IP address of the URL's host
async fn resolve_ip(url: &Url) -> Result<IpAddr, CrawlError> {
    let unresolved = |reason: String| CrawlError::HostUnresolved {
        host: url.host_str().unwrap_or_default().to_string(),
        reason,
    };

    match url.host() {
        Some(Host::Ipv4(addr)) => Ok(IpAddr::V4(addr)),
        Some(Host::Ipv6(addr)) => Ok(IpAddr::V6(addr)),
        Some(Host::Domain(domain)) => {
            let port = url.port_or_known_default().unwrap_or(80);
            let mut addrs = tokio::net::lookup_host((domain, port))
                .await
                .map_err(|e| unresolved(e.to_string()))?;
            addrs
                .next()
                .map(|addr| addr.ip())
                .ok_or_else(|| unresolved("no addresses".to_string()))
        }
        None => Err(unresolved("URL has no host".to_string())),
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is the seed fetched twice sometimes?
//    - Many sites still answer on http and redirect to https
//    - Some only answer on https, or serve an error page over http
//    - Trying http first, then https, handles both
//
// 2. Why does fetch_page return Result<Option<Vec<u8>>>?
//    - Err: something went wrong (counts as an error)
//    - Ok(None): fine, but nothing to read (a PDF, an image)
//    - Ok(Some(body)): a page to search for emails and links
//
// 3. What is `let Some(x) = ... else { ... }`?
//    - let-else: bind on success, otherwise run the else block, which must
//      leave the scope (break, continue, return)
//
// 4. Why is `visited` checked before pushing a new link?
//    - The frontier refuses its own duplicates, but it forgets links once
//      they are popped. The visited set remembers them for the whole crawl
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_stops_when_errors_exceed_threshold() {
        // threshold = floor(0.9 * 3) = 2
        assert!(error_budget_exhausted(4, 3, 3, 0.9));
    }

    #[test]
    fn test_budget_ignores_first_errors() {
        assert!(!error_budget_exhausted(3, 1, 3, 0.9));
        assert!(!error_budget_exhausted(0, 0, 3, 0.9));
    }

    #[test]
    fn test_budget_allows_mostly_healthy_sites() {
        assert!(!error_budget_exhausted(4, 10, 3, 0.9));
        assert!(!error_budget_exhausted(18, 20, 3, 0.9));
        assert!(error_budget_exhausted(19, 21, 3, 0.9));
    }

    #[tokio::test]
    async fn test_empty_seed_is_rejected() {
        let engine = CrawlEngine::new(CrawlConfig::default()).unwrap();
        let result = engine.crawl("   ", &crate::routing::NoRouting).await;
        assert!(matches!(result, Err(CrawlError::NoSeedLink)));
    }
}
