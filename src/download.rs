//! Download orchestrator: walks the requested month range and tries each
//! month's candidate URLs in order, writing the first hit to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use log::{info, warn};
use rand::Rng;

use crate::candidates::{candidate_urls, UNPACED_CANDIDATES};
use crate::session::FileFetcher;

/// Earliest year the portal publishes reports for.
pub const MIN_YEAR: i32 = 2000;

/// Inclusive (year, month) range requested on the command line. The
/// month bounds apply to the first and last year only; interior years
/// always cover all twelve months.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthRange {
    start_year: i32,
    end_year: i32,
    start_month: u32,
    end_month: u32,
}

impl MonthRange {
    pub fn new(start_year: i32, end_year: i32, start_month: u32, end_month: u32) -> Result<Self> {
        let current_year = Utc::now().year();
        for year in [start_year, end_year] {
            if !(MIN_YEAR..=current_year).contains(&year) {
                bail!("year {year} is outside the supported range {MIN_YEAR}-{current_year}");
            }
        }
        for month in [start_month, end_month] {
            if !(1..=12).contains(&month) {
                bail!("month {month} is outside 1-12");
            }
        }
        if start_year > end_year {
            bail!("start year {start_year} is after end year {end_year}");
        }
        if start_year == end_year && start_month > end_month {
            bail!("start month {start_month} is after end month {end_month}");
        }
        Ok(Self {
            start_year,
            end_year,
            start_month,
            end_month,
        })
    }

    /// Every (year, month) pair covered by the range, in order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, u32)> + '_ {
        (self.start_year..=self.end_year).flat_map(move |year| {
            let first = if year == self.start_year { self.start_month } else { 1 };
            let last = if year == self.end_year { self.end_month } else { 12 };
            (first..=last).map(move |month| (year, month))
        })
    }
}

/// Politeness delay between requests. Injected so tests can run without
/// wall-clock pauses.
pub trait Pacing {
    fn pause(&self);
}

/// Sleeps a random 1-3 seconds, matching the pace of someone clicking
/// through the portal by hand.
pub struct RandomPacing;

impl Pacing for RandomPacing {
    fn pause(&self) {
        let secs = rand::thread_rng().gen_range(1..=3);
        thread::sleep(Duration::from_secs(secs));
    }
}

/// Terminal state for one month. Abandonment is not an error; the run
/// moves on to the next month.
#[derive(Debug, PartialEq)]
pub enum MonthOutcome {
    Saved(PathBuf),
    Abandoned,
}

#[derive(Debug, Default, PartialEq)]
pub struct DownloadSummary {
    pub saved: usize,
    pub abandoned: usize,
}

pub struct Downloader<'a, F: FileFetcher, P: Pacing> {
    fetcher: &'a F,
    pacing: P,
    files_base: String,
    out_dir: PathBuf,
}

impl<'a, F: FileFetcher, P: Pacing> Downloader<'a, F, P> {
    pub fn new(fetcher: &'a F, pacing: P, files_base: &str, out_dir: &Path) -> Self {
        Self {
            fetcher,
            pacing,
            files_base: files_base.to_string(),
            out_dir: out_dir.to_path_buf(),
        }
    }

    /// Try every candidate URL for one month and persist the first hit.
    /// At most one file is written per month; a rerun overwrites it.
    pub fn download_month(&self, year: i32, month: u32) -> Result<MonthOutcome> {
        for (attempt, url) in candidate_urls(&self.files_base, year, month).iter().enumerate() {
            if attempt >= UNPACED_CANDIDATES {
                self.pacing.pause();
            }
            info!("trying {url}");
            if let Some(body) = self.fetcher.fetch(url) {
                let path = self.out_dir.join(format!("{year}_{month:02}.pdf"));
                fs::write(&path, &body)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!("saved {} ({} bytes)", path.display(), body.len());
                return Ok(MonthOutcome::Saved(path));
            }
        }
        warn!("no report found for {year}-{month:02}, moving on");
        Ok(MonthOutcome::Abandoned)
    }

    /// Download every month in the range, pausing between months. Only
    /// local I/O failures abort the run; exhausted months are counted
    /// and skipped.
    pub fn download_range(&self, range: &MonthRange) -> Result<DownloadSummary> {
        let mut summary = DownloadSummary::default();
        for (year, month) in range.iter() {
            match self.download_month(year, month)? {
                MonthOutcome::Saved(_) => summary.saved += 1,
                MonthOutcome::Abandoned => summary.abandoned += 1,
            }
            self.pacing.pause();
        }
        Ok(summary)
    }
}
