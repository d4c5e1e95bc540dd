// src/routing/mod.rs
// =============================================================================
// This module describes how we look up who routes a website's IP address.
//
// The crawler does not know where routing data comes from. It only talks to
// the RoutingLookup trait, so callers can plug in:
// - NoRouting: returns nothing (the default)
// - RoutingTable: a JSON file of CIDR prefixes (see table.rs)
// - Anything else that implements the trait (a BGP dump, a web API, ...)
//
// Rust concepts:
// - Traits: Shared behaviour that different types can implement
// - Send + Sync: The lookup may be shared between async tasks
// =============================================================================

mod table;

pub use table::{RoutingEntry, RoutingTable};

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use thiserror::Error;

/// What we know about the network an IP address belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn_number: Option<u32>,
    /// Announced prefix in CIDR form, e.g. "192.0.2.0/24"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Organisation holding the ASN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// IP to ASN lookup used while resolving a crawl seed.
pub trait RoutingLookup: Send + Sync {
    /// Everything known about the route covering `ip`.
    fn ip_to_asn_info(&self, ip: IpAddr) -> RoutingInfo;

    /// Just the ASN.
    fn ip_to_asn(&self, ip: IpAddr) -> Option<u32> {
        self.ip_to_asn_info(ip).asn_number
    }
}

/// A lookup that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouting;

impl RoutingLookup for NoRouting {
    fn ip_to_asn_info(&self, _ip: IpAddr) -> RoutingInfo {
        RoutingInfo::default()
    }
}

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("failed to read routing table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse routing table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid prefix '{0}'")]
    InvalidPrefix(String),
}
