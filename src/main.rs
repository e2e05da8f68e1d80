mod error;
mod fetcher;
mod listing;
mod parser;
mod report;
mod scraper;
mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use fetcher::HttpFetcher;
use server::AppState;

#[derive(Parser)]
#[command(name = "idot_scraper", about = "IDOT bid letting scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a repository page and emit the contract report as CSV
    Scrape {
        /// Repository (listing) page URL
        url: String,
        /// Write the CSV to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Max concurrent detail-page fetches
        #[arg(long, default_value_t = scraper::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Run the HTTP API (POST /api/scrape)
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
        /// Max concurrent detail-page fetches per request
        #[arg(long, default_value_t = scraper::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            url,
            out,
            concurrency,
        } => {
            let t0 = Instant::now();
            let fetcher = HttpFetcher::new();

            let urls = scraper::resolve_repository(&fetcher, &url).await?;
            eprintln!("Scraping {} contract detail pages...", urls.len());

            let pb = ProgressBar::new(urls.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                    .progress_chars("=> "),
            );
            let contracts = scraper::scrape_details(&fetcher, &urls, concurrency, || {
                pb.inc(1);
            })
            .await;
            pb.finish_and_clear();

            let errors = contracts
                .iter()
                .filter(|c| c.low_bidder.starts_with("ERROR:"))
                .count();
            let csv = report::to_csv(&contracts)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, &csv)?;
                    println!("Wrote {} contracts to {}", contracts.len(), path.display());
                }
                None => print!("{csv}"),
            }
            eprintln!(
                "Done: {} contracts ({} ok, {} errors) in {:.1}s",
                contracts.len(),
                contracts.len() - errors,
                errors,
                t0.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Commands::Serve {
            bind,
            port,
            concurrency,
        } => {
            let state = AppState {
                fetcher: Arc::new(HttpFetcher::new()),
                concurrency,
            };
            server::serve(state, &bind, port).await
        }
    }
}
