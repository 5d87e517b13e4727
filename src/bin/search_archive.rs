use std::io;

use anyhow::{Context, Result};
use clap::Parser;

use rusty_sun::config::RetrievalConfig;
use rusty_sun::net::{write_csv, ClientRegistry, QueryAttr};

/// Find archive files for an instrument and time range and print them as CSV.
#[derive(Debug, Parser)]
#[command(name = "search_archive", version)]
struct Args {
    /// Start of the range, e.g. 2016-01-01 or "2016-01-01 06:00".
    start: String,
    /// End of the range (inclusive).
    end: String,
    /// Instrument name: `sot` or `eve`.
    instrument: String,
    /// Processing level, e.g. 0 or 0CS.
    #[arg(long)]
    level: Option<String>,
    /// Only print the file URLs.
    #[arg(long)]
    urls_only: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut query = vec![
        QueryAttr::time(&args.start, &args.end).context("invalid time range")?,
        QueryAttr::instrument(&args.instrument),
    ];
    if let Some(level) = &args.level {
        query.push(QueryAttr::level(level.as_str()));
    }

    let config = RetrievalConfig::from_env()?;
    let registry = ClientRegistry::with_default_clients(&config)?;
    let responses = registry.search(&query)?;
    log::info!(
        "{} file(s) from {} client(s)",
        responses.iter().map(|r| r.len()).sum::<usize>(),
        responses.len()
    );

    if args.urls_only {
        for url in responses.iter().flat_map(|r| r.urls()) {
            println!("{url}");
        }
    } else {
        write_csv(&responses, io::stdout().lock())?;
    }
    Ok(())
}
