use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use token_catalog::config::{load_config_from_path, CONFIG_FILE_PATH};
use token_catalog::holdings::HoldingsLoadOutcome;
use token_catalog::mocks::{MockCatalogApi, MockHoldingsApi};
use token_catalog::{logger, CatalogService};

#[derive(Parser)]
#[command(name = "debug_catalog")]
#[command(about = "Debug tool for the token catalog cache", long_about = None)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, default_value = CONFIG_FILE_PATH)]
    config: PathBuf,

    /// Override the provider base URL from the config
    #[arg(long)]
    base_url: Option<String>,

    /// Serve a generated catalog of this many entries instead of calling the provider
    #[arg(long)]
    mock_entries: Option<usize>,

    /// Search the loaded catalog
    #[arg(short, long)]
    search: Option<String>,

    /// Load holdings for this wallet before loading the catalog
    #[arg(short, long)]
    wallet: Option<String>,

    /// Maximum number of entries to display
    #[arg(short, long, default_value = "10")]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init();

    let mut config = load_config_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(base_url) = &args.base_url {
        config.api.base_url = base_url.clone();
    }

    let service = match args.mock_entries {
        Some(count) => {
            let page_size = config.fetcher.page_size as usize;
            CatalogService::new(
                config,
                Arc::new(MockCatalogApi::with_entries(count, page_size)),
                Arc::new(MockHoldingsApi::new()),
            )
        }
        None => CatalogService::from_config(config).context("Failed to create catalog service")?,
    };

    println!("Token Catalog Debug Tool\n");
    println!("{}", "=".repeat(80));

    let _progress = service.subscribe(|snapshot: &token_catalog::CatalogSnapshot| {
        if snapshot.is_busy() {
            println!(
                "  ... {} entries loaded (page cursor {})",
                snapshot.len(),
                snapshot.next_page
            );
        }
    });

    if let Some(wallet) = &args.wallet {
        println!("\n[HOLDINGS] {}\n", wallet);
        match service.holdings().load_holdings(Some(wallet.as_str())).await {
            HoldingsLoadOutcome::Failed(err) => println!("Holdings failed: {}", err),
            outcome => {
                println!("Outcome: {:?}", outcome);
                let snapshot = service.holdings().snapshot();
                for holding in snapshot.entries.iter().take(args.limit) {
                    println!(
                        "{:>12} {:<10} {}",
                        holding
                            .ui_amount()
                            .map(|a| format!("{:.4}", a))
                            .unwrap_or_else(|| holding.balance.clone()),
                        holding.symbol,
                        holding.address
                    );
                }
            }
        }
    } else {
        println!("\n[CATALOG] Triggering load: {:?}", service.trigger_load(Duration::ZERO));
    }

    let started = chrono::Utc::now();
    let summary = service.wait_for_idle().await;
    let elapsed = chrono::Utc::now() - started;

    println!("\n{}", "=".repeat(80));
    println!("\n[RUN SUMMARY]");
    match summary {
        Some(summary) => {
            println!("Stop reason: {:?}", summary.stop_reason);
            println!("Pages fetched: {}", summary.pages_fetched);
            println!("Entries added: {}", summary.entries_added);
            println!("Duplicates dropped: {}", summary.duplicates);
        }
        None => println!("No run was started"),
    }
    println!("Elapsed: {}ms", elapsed.num_milliseconds());

    let snapshot = service.get_snapshot();
    println!("Entries: {}", snapshot.len());
    println!("Has more: {}", snapshot.has_more);
    if let Some(total) = snapshot.total_hint {
        println!("Provider total: {}", total);
    }
    if let Some(err) = &snapshot.error {
        println!("Last error: {}", err);
    }

    if let Some(query) = &args.search {
        let results = service.search(query);
        println!("\n[SEARCH \"{}\"] {} matches\n", query, results.len());
        for (i, entry) in results.iter().enumerate().take(args.limit) {
            println!(
                "{}. {} - {} ({}, {})",
                i + 1,
                entry.symbol,
                entry.name,
                entry.verification_tier.as_str(),
                entry.address
            );
        }
    }

    let stats = service.coordinator_stats();
    println!("\n[COORDINATOR]");
    println!("Triggers: {}", stats.trigger_count);
    println!("Runs started: {}", stats.runs_started);

    println!("\n{}", "=".repeat(80));
    println!("\nDone!");

    Ok(())
}
