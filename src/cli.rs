// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mail-harvest",
    version = "0.1.0",
    about = "Crawl a website for email addresses and check them for known breaches",
    long_about = "mail-harvest crawls every page of one website, collects the email addresses \
                  it finds and can look each of them up on a breach-notification service."
)]
pub struct Cli {
    /// Log every link and page (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file; missing values use the built-in defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and list the email addresses found on it
    ///
    /// Example: mail-harvest crawl example.com --breach
    Crawl {
        /// Seed link (scheme optional, e.g. example.com or https://example.com/about)
        seed_link: String,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,

        /// Check every address found against the breach service
        #[arg(long)]
        breach: bool,

        /// JSON file of CIDR prefixes with their ASNs
        #[arg(long)]
        routing_table: Option<PathBuf>,

        /// Number of pages fetched at the same time
        #[arg(long)]
        workers: Option<usize>,

        /// Visit links in discovery order (repeatable runs)
        #[arg(long)]
        ordered: bool,
    },

    /// Check addresses against the breach service
    ///
    /// Example: mail-harvest breach jane@example.com info@example.org
    Breach {
        /// Addresses to check
        #[arg(required = true)]
        addresses: Vec<String>,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}
