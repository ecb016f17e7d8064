//! MAL fetch CLI application.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mal_fetch::{Fetcher, MalError};
use serde::Serialize;
use serde_json::{json, Value};
use shared::{Config, LogConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the configured number of concurrent requests
    #[arg(long)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch URLs and print the decoded result of each
    Get {
        urls: Vec<String>,

        /// How to decode each body
        #[arg(long = "as", value_enum, default_value_t = Mode::Raw)]
        mode: Mode,
    },
    /// Issue HEAD requests
    Head { urls: Vec<String> },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Raw,
    Json,
    Xml,
    Rss,
    Html,
}

/// Same envelope the HTTP API answers with
fn envelope<T: Serialize>(url: &str, outcome: mal_fetch::Result<T>) -> Value {
    match outcome.and_then(|res| {
        serde_json::to_value(res).map_err(|e| MalError::bad_payload(url, e.to_string()))
    }) {
        Ok(res) => json!({ "url": url, "res": res }),
        Err(err) => json!({ "url": url, "err": err }),
    }
}

async fn get(fetcher: &Fetcher, url: &str, mode: Mode) -> Value {
    match mode {
        Mode::Raw => envelope(url, fetcher.load_url(url).await),
        Mode::Json => envelope(url, fetcher.load_json::<Value>(url).await),
        Mode::Xml => envelope(url, fetcher.load_xml(url).await),
        Mode::Rss => envelope(url, fetcher.load_rss(url).await),
        Mode::Html => {
            let outcome = fetcher.load_html(url).await.map(|page| {
                json!({ "title": page.title(), "length": page.body.len() })
            });
            envelope(url, outcome)
        }
    }
}

async fn head(fetcher: &Fetcher, url: &str) -> Value {
    envelope(url, fetcher.head_url(url).await)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(concurrency) = args.concurrency {
        config.fetcher.max_concurrent = concurrency;
    }

    let mut log_config = LogConfig::from_config(&config.logging, "mal-fetch");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(
        config_file = %args.config.display(),
        max_concurrent = config.fetcher.max_concurrent,
        endpoint = ?config.fetcher.endpoint,
        "MAL fetch starting"
    );

    let fetcher = Fetcher::new(config.fetcher.clone()).context("Failed to create fetcher")?;

    let lines: Vec<Value> = match &args.command {
        Command::Get { urls, mode } => {
            futures::future::join_all(urls.iter().map(|url| get(&fetcher, url, *mode))).await
        }
        Command::Head { urls } => {
            futures::future::join_all(urls.iter().map(|url| head(&fetcher, url))).await
        }
    };

    for line in &lines {
        println!("{}", line);
    }

    let failed = lines.iter().filter(|l| l.get("err").is_some()).count();
    info!(total = lines.len(), failed = failed, "MAL fetch finished");

    Ok(())
}
