mod error;
mod fetch;
mod input;
mod output;
mod parser;
mod settings;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use error::ItemError;
use input::InputItem;
use output::CsvSink;
use parser::ItemRecords;
use settings::Settings;

#[derive(Parser)]
#[command(name = "brick_scraper", about = "LEGO set info and price-guide scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every set in the input file and write the info and price CSVs
    Run {
        /// Delimited set list (number in column 2, variant in column 3, theme in column 4)
        #[arg(short, long)]
        sets: PathBuf,
        /// Max sets to scrape (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Info CSV path (overrides settings)
        #[arg(long)]
        info_out: Option<PathBuf>,
        /// Prices CSV path (overrides settings)
        #[arg(long)]
        prices_out: Option<PathBuf>,
    },
    /// List the sets that survive input filtering
    Items {
        #[arg(short, long)]
        sets: PathBuf,
    },
    /// Extract from saved catalog and price-guide pages, print as JSON
    Parse {
        /// Saved catalog page
        #[arg(long)]
        info: PathBuf,
        /// Saved price-guide page
        #[arg(long)]
        prices: PathBuf,
        /// Set key the pages belong to, e.g. 10220-1
        #[arg(long)]
        set: InputItem,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Run {
            sets,
            limit,
            info_out,
            prices_out,
        } => {
            let mut items = input::load_items(&sets, &settings.excluded_category)?;
            if let Some(n) = limit {
                items.truncate(n);
            }
            if items.is_empty() {
                warn!("No sets to scrape in {}", sets.display());
            }

            let info_path = info_out.unwrap_or_else(|| PathBuf::from(&settings.info_output));
            let prices_path =
                prices_out.unwrap_or_else(|| PathBuf::from(&settings.prices_output));

            let fetcher = fetch::Fetcher::new(&settings)?;
            let mut sink = CsvSink::create(&info_path, &prices_path)?;

            println!("Scraping {} sets...", items.len());
            let not_found = scrape_items(&fetcher, &mut sink, &items).await?;
            let (info_rows, price_rows) = sink.finish()?;

            println!(
                "Wrote {} info rows to {} and {} price rows to {}.",
                info_rows,
                info_path.display(),
                price_rows,
                prices_path.display()
            );
            print_not_found(&not_found);
            Ok(())
        }
        Commands::Items { sets } => {
            let items = input::load_items(&sets, &settings.excluded_category)?;
            for item in &items {
                println!("{}", item);
            }
            println!("\n{} sets", items.len());
            Ok(())
        }
        Commands::Parse { info, prices, set } => parse_saved(&info, &prices, &set),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Fetch, extract and write each set in turn. Returns the keys of sets that
/// could not be matched on both sites.
async fn scrape_items<W: Write>(
    fetcher: &fetch::Fetcher,
    sink: &mut CsvSink<W>,
    items: &[InputItem],
) -> Result<Vec<String>> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut not_found = Vec::new();

    for item in items {
        info!("Scraping LEGO set: {}", item);
        let outcome = match fetcher.fetch_pages(item).await {
            Ok(pages) => parser::process_item(item, &pages.catalog_html, &pages.price_html),
            Err(e) => Err(e),
        };
        record_outcome(item, outcome, sink, &mut not_found)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(not_found)
}

/// Write a matched set's rows, or note the set as not found. Only write
/// failures are errors.
fn record_outcome<W: Write>(
    item: &InputItem,
    outcome: Result<ItemRecords, ItemError>,
    sink: &mut CsvSink<W>,
    not_found: &mut Vec<String>,
) -> Result<()> {
    match outcome {
        Ok(records) => {
            sink.write_info(&records.info)?;
            sink.write_prices(&records.prices)?;
        }
        Err(e) => {
            warn!("Set {} not found: {}", item, e);
            not_found.push(item.to_string());
        }
    }
    Ok(())
}

fn parse_saved(info_path: &Path, prices_path: &Path, item: &InputItem) -> Result<()> {
    let catalog_html = std::fs::read_to_string(info_path)
        .with_context(|| format!("Failed to read {}", info_path.display()))?;
    let price_html = std::fs::read_to_string(prices_path)
        .with_context(|| format!("Failed to read {}", prices_path.display()))?;

    match parser::process_item(item, &catalog_html, &price_html) {
        Ok(records) => println!("{}", serde_json::to_string_pretty(&records)?),
        Err(e) => print_not_found(&[format!("{} ({})", item, e)]),
    }
    Ok(())
}

fn not_found_summary(not_found: &[String]) -> String {
    format!("{} sets not found: {}", not_found.len(), not_found.join(", "))
}

fn print_not_found(not_found: &[String]) {
    println!("{}", not_found_summary(not_found));
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
