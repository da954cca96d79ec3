use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

mod candidates;
mod download;
mod session;

use download::{Downloader, MonthRange, RandomPacing};
use session::PortalSession;

/// Landing page that issues the anti-forgery token and session cookie.
pub const LANDING_URL: &str = "https://www.fenabrave.org.br/portalv2/Conteudo/emplacamentos";

/// Base URL the monthly report PDFs are served from.
pub const FILES_BASE_URL: &str = "https://www.fenabrave.org.br/portal/files";

/// Download Fenabrave monthly vehicle-registration report PDFs
#[derive(Parser)]
#[command(name = "fenabrave-reports")]
#[command(about = "Download Fenabrave monthly vehicle-registration report PDFs")]
struct Cli {
    /// First year to download (2000 to current year)
    #[arg(long)]
    start_year: i32,
    /// Last year to download, inclusive
    #[arg(long)]
    end_year: i32,
    /// First month of the first year
    #[arg(long, default_value_t = 1)]
    start_month: u32,
    /// Last month of the last year
    #[arg(long, default_value_t = 12)]
    end_month: u32,
    /// Directory the PDFs are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let range = MonthRange::new(cli.start_year, cli.end_year, cli.start_month, cli.end_month)?;

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create output directory {}", cli.out_dir.display()))?;

    info!("fetching verification token from {LANDING_URL}");
    let session = PortalSession::connect(LANDING_URL)
        .context("could not establish a portal session, aborting")?;

    let downloader = Downloader::new(&session, RandomPacing, FILES_BASE_URL, &cli.out_dir);
    let summary = downloader.download_range(&range)?;

    println!(
        "Done: {} report(s) saved, {} month(s) without a report",
        summary.saved, summary.abandoned
    );
    Ok(())
}
