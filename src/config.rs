use chrono::{DateTime, TimeZone};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncBufRead;
use url::Url;

use crate::chrome::BrowserOptions;
use crate::interaction::Console;
use crate::linkedin::LinkedIn;
use crate::{utils, CollectorConfig, CollectorError, RetryPolicy};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.1 Safari/605.1.15";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "linkedin-job-collector",
    about = "Collect LinkedIn job postings into JSON"
)]
pub struct Cli {
    /// Job keyword, e.g. "Data Engineer". Asked for when missing
    #[arg(long)]
    pub keyword: Option<String>,

    /// Location, e.g. "Morocco". Asked for when missing
    #[arg(long)]
    pub location: Option<String>,

    /// Number of unique jobs to collect
    #[arg(long, default_value_t = 500)]
    pub max_jobs: usize,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Where the per-page partial files go
    #[arg(long, default_value = ".")]
    pub checkpoint_dir: PathBuf,

    /// JSON array of skill names
    #[arg(long, default_value = "linkedin_scraper/data/skills.json")]
    pub skills: PathBuf,

    /// Also visit each company's people page for recruiters
    #[arg(long)]
    pub recruiters: bool,

    /// Partial or final output of an earlier run to continue from
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Mirror results into NAME.db
    #[arg(long, value_name = "NAME")]
    pub sqlite: Option<String>,

    #[arg(long)]
    pub max_pages: Option<u32>,

    #[arg(long)]
    pub headless: bool,

    /// Chrome profile directory holding the LinkedIn session
    #[arg(long, env = "LINKEDIN_USER_DATA_DIR")]
    pub user_data_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub scroll_rounds: usize,

    /// Stalled scroll rounds tolerated before the page counts as fully loaded
    #[arg(long, default_value_t = 2)]
    pub stuck_threshold: usize,

    #[arg(long, default_value_t = 2_000)]
    pub scroll_pause_ms: u64,

    /// Wait after navigations and clicks
    #[arg(long, default_value_t = 5_000)]
    pub settle_ms: u64,

    #[arg(long, default_value_t = 3)]
    pub click_attempts: u32,

    #[arg(long, default_value_t = 2_000)]
    pub click_retry_ms: u64,
}

/// Search terms, after prompting for whatever the command line left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub keyword: String,
    pub location: String,
}

impl Search {
    pub fn url(&self) -> Result<Url, CollectorError> {
        Ok(LinkedIn::default().search_url(&self.keyword, &self.location)?)
    }

    /// `{output_dir}/linkedin_jobs_{keyword}_{location}_{YYYYmmdd_HHMMSS}.json`
    pub fn output_path<Tz: TimeZone>(&self, output_dir: &Path, now: &DateTime<Tz>) -> PathBuf
    where
        Tz::Offset: std::fmt::Display,
    {
        output_dir.join(format!(
            "linkedin_jobs_{}_{}_{}.json",
            utils::file_safe(&self.keyword),
            utils::file_safe(&self.location),
            now.format("%Y%m%d_%H%M%S")
        ))
    }
}

impl Cli {
    /// Keyword and location from the flags, asking on `console` for any
    /// that are missing.
    pub async fn search<R>(&self, console: &Console<R>) -> Result<Search, CollectorError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let keyword = match &self.keyword {
            Some(k) => k.trim().to_string(),
            None => console.ask("Enter job keyword (e.g. Data Engineer): ").await?,
        };
        let location = match &self.location {
            Some(l) => l.trim().to_string(),
            None => console.ask("Enter location (e.g. Morocco): ").await?,
        };
        if keyword.is_empty() {
            return Err(CollectorError::MissingInput("keyword".to_string()));
        }
        if location.is_empty() {
            return Err(CollectorError::MissingInput("location".to_string()));
        }
        Ok(Search { keyword, location })
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            scroll_rounds: self.scroll_rounds,
            stuck_threshold: self.stuck_threshold,
            scroll_pause: Duration::from_millis(self.scroll_pause_ms),
            settle_delay: Duration::from_millis(self.settle_ms),
            click: RetryPolicy {
                max_attempts: self.click_attempts,
                delay: Duration::from_millis(self.click_retry_ms),
            },
            recruiters: self.recruiters,
            max_pages: self.max_pages,
        }
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: self.headless,
            user_data_dir: self.user_data_dir.clone(),
            window_size: (1280, 720),
            user_agent: Some(USER_AGENT.to_string()),
        }
    }
}
