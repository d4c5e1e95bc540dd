// src/lib.rs
// =============================================================================
// Library root. The binary in main.rs and the integration tests in tests/
// both use the modules declared here.
// =============================================================================

pub mod breach;   // src/breach/ - breach-notification client
pub mod config;   // src/config.rs - runtime settings
pub mod crawl;    // src/crawl/ - website crawling
pub mod email;    // src/email/ - email address parsing and extraction
pub mod routing;  // src/routing/ - IP to ASN lookups

pub use breach::{BreachCheckState, BreachChecker, BreachError};
pub use config::AppConfig;
pub use crawl::{CrawlEngine, CrawlError, DomainCrawlResult};
pub use email::{EmailAddress, EmailError, EmailExtractor};
pub use routing::{NoRouting, RoutingInfo, RoutingLookup, RoutingTable};
