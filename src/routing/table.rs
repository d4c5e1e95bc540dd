// src/routing/table.rs
// =============================================================================
// A routing lookup backed by a list of CIDR prefixes.
//
// File format (JSON):
//   [
//     { "prefix": "192.0.2.0/24", "asn": 64500, "owner": "Example Net", "country": "us" },
//     { "prefix": "2001:db8::/32", "asn": 64501 }
//   ]
//
// Lookups pick the longest matching prefix, the same rule routers use.
// =============================================================================

use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;

use super::{RoutingError, RoutingInfo, RoutingLookup};

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingEntry {
    pub prefix: String,
    pub asn: u32,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

// An entry with its prefix already parsed
#[derive(Debug, Clone)]
struct Route {
    network: IpAddr,
    length: u8,
    entry: RoutingEntry,
}

#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    pub fn from_entries(entries: Vec<RoutingEntry>) -> Result<Self, RoutingError> {
        let routes = entries
            .into_iter()
            .map(|entry| {
                let (network, length) = parse_prefix(&entry.prefix)?;
                Ok(Route { network, length, entry })
            })
            .collect::<Result<Vec<_>, RoutingError>>()?;

        Ok(Self { routes })
    }

    pub fn from_json(json: &str) -> Result<Self, RoutingError> {
        let entries: Vec<RoutingEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    pub fn load(path: &Path) -> Result<Self, RoutingError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn best_match(&self, ip: IpAddr) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|route| contains(route.network, route.length, ip))
            .max_by_key(|route| route.length)
    }
}

impl RoutingLookup for RoutingTable {
    fn ip_to_asn_info(&self, ip: IpAddr) -> RoutingInfo {
        match self.best_match(ip) {
            Some(route) => RoutingInfo {
                asn_number: Some(route.entry.asn),
                prefix: Some(route.entry.prefix.clone()),
                owner: route.entry.owner.clone(),
                country: route.entry.country.clone(),
            },
            None => RoutingInfo::default(),
        }
    }
}

// Parses "a.b.c.d/len" or "v6::/len"; a bare address is a host route
fn parse_prefix(prefix: &str) -> Result<(IpAddr, u8), RoutingError> {
    let invalid = || RoutingError::InvalidPrefix(prefix.to_string());

    let (addr, length) = match prefix.split_once('/') {
        Some((addr, length)) => (addr, Some(length)),
        None => (prefix, None),
    };

    let network: IpAddr = addr.trim().parse().map_err(|_| invalid())?;
    let max = if network.is_ipv4() { 32 } else { 128 };

    let length = match length {
        Some(l) => l.trim().parse::<u8>().map_err(|_| invalid())?,
        None => max,
    };
    if length > max {
        return Err(invalid());
    }

    Ok((network, length))
}

fn contains(network: IpAddr, length: u8, ip: IpAddr) -> bool {
    match (network, ip) {
        (IpAddr::V4(net), IpAddr::V4(ip)) => {
            let mask = u32::MAX.checked_shl(32 - length as u32).unwrap_or(0);
            u32::from(net) & mask == u32::from(ip) & mask
        }
        (IpAddr::V6(net), IpAddr::V6(ip)) => {
            let mask = u128::MAX.checked_shl(128 - length as u32).unwrap_or(0);
            u128::from(net) & mask == u128::from(ip) & mask
        }
        _ => false,
    }
}
