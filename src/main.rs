// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (to stderr, so JSON on stdout stays clean)
// 3. Dispatch to the appropriate subcommand handler
// 4. Print results and exit with a proper code
//    (0 = nothing breached, 1 = breached address found, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use mail_harvest::config::{load_config, AppConfig};
use mail_harvest::{
    BreachChecker, CrawlEngine, DomainCrawlResult, EmailAddress, NoRouting, RoutingLookup,
    RoutingTable,
};

// Outcome of checking one address, as printed to the user
#[derive(Debug, Serialize)]
struct BreachReport {
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    breached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct CrawlReport<'a> {
    #[serde(flatten)]
    result: &'a DomainCrawlResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    breaches: Vec<BreachReport>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins; otherwise info, or debug with --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "mail_harvest=debug" } else { "mail_harvest=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Crawl {
            seed_link,
            json,
            breach,
            routing_table,
            workers,
            ordered,
        } => {
            let mut config = config;
            if let Some(workers) = workers {
                config.crawl.workers = workers;
            }
            config.crawl.ordered |= ordered;

            let routing: Box<dyn RoutingLookup> = match routing_table {
                Some(path) => Box::new(
                    RoutingTable::load(&path)
                        .with_context(|| format!("Failed to load {}", path.display()))?,
                ),
                None => Box::new(NoRouting),
            };

            handle_crawl(&seed_link, config, routing.as_ref(), json, breach).await
        }
        Commands::Breach { addresses, json } => handle_breach(&addresses, config, json).await,
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    seed_link: &str,
    config: AppConfig,
    routing: &dyn RoutingLookup,
    json: bool,
    breach: bool,
) -> Result<i32> {
    let engine = CrawlEngine::new(config.crawl.clone())?;
    let result = engine
        .crawl(seed_link, routing)
        .await
        .with_context(|| format!("Unable to process {}", seed_link))?;

    let mut emails: Vec<EmailAddress> = result.emails.iter().cloned().collect();
    emails.sort_by_key(|e| e.to_string());

    let breaches = if breach && !emails.is_empty() {
        check_addresses(&config, emails.clone()).await?
    } else {
        Vec::new()
    };

    if json {
        let report = CrawlReport {
            result: &result,
            breaches,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(exit_code(&report.breaches));
    }

    println!("🔍 {} ({})", result.base_url, result.ip);
    if let Some(asn) = result.routing.asn_number {
        println!(
            "🌐 AS{} {}",
            asn,
            result.routing.owner.as_deref().unwrap_or("")
        );
    }
    println!(
        "📄 Visited {} link(s), {} error(s){}",
        result.links_visited,
        result.error_count,
        if result.stopped_early { ", stopped early" } else { "" }
    );
    println!();

    if breaches.is_empty() {
        for email in &emails {
            println!("{}", email);
        }
    } else {
        print_breach_table(&breaches);
    }

    println!();
    println!("📊 {} unique email address(es)", emails.len());

    Ok(exit_code(&breaches))
}

// Handles the 'breach' subcommand
async fn handle_breach(addresses: &[String], config: AppConfig, json: bool) -> Result<i32> {
    let mut reports = Vec::new();
    let mut parsed = Vec::new();

    for raw in addresses {
        match EmailAddress::parse(raw) {
            Ok(address) => parsed.push(address),
            Err(e) => reports.push(BreachReport {
                address: raw.clone(),
                breached: None,
                error: Some(e.to_string()),
            }),
        }
    }

    reports.extend(check_addresses(&config, parsed).await?);

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_breach_table(&reports);
    }

    Ok(exit_code(&reports))
}

// Checks addresses with at most `breach.concurrency` requests in flight
async fn check_addresses(
    config: &AppConfig,
    addresses: Vec<EmailAddress>,
) -> Result<Vec<BreachReport>> {
    let checker = BreachChecker::new(config.breach.clone())?;
    let checker = &checker;

    let reports: Vec<BreachReport> = stream::iter(addresses)
        .map(|address| async move {
            match checker.check(&address).await {
                Ok(breached) => BreachReport {
                    address: address.to_string(),
                    breached: Some(breached),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("{}", e);
                    BreachReport {
                        address: address.to_string(),
                        breached: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .buffer_unordered(config.breach.concurrency.max(1))
        .collect()
        .await;

    Ok(reports)
}

fn print_breach_table(reports: &[BreachReport]) {
    println!("{:<50} {:<15} {:<30}", "EMAIL", "STATUS", "MESSAGE");
    println!("{}", "=".repeat(95));

    for report in reports {
        let status = match report.breached {
            Some(true) => "❌ BREACHED",
            Some(false) => "✅ CLEAN",
            None => "⚠️  UNKNOWN",
        };
        println!(
            "{:<50} {:<15} {:<30}",
            report.address,
            status,
            report.error.as_deref().unwrap_or("")
        );
    }
}

fn exit_code(reports: &[BreachReport]) -> i32 {
    if reports.iter().any(|r| r.breached == Some(true)) {
        1
    } else {
        0
    }
}
