use scraper::Html;
use std::fmt;
use url::Url;

pub mod checkpoint;
pub mod chrome;
pub mod collector;
pub mod config;
pub mod extract;
pub mod interaction;
pub mod linkedin;
pub mod skills;

mod data;
mod error;
mod utils;

#[cfg(test)]
mod testing;

pub use collector::{CollectionSession, Collector, CollectorConfig};
pub use data::Table;
pub use error::CollectorError;
pub use interaction::{click_with_retry, Interaction, RetryPolicy};
pub use linkedin::{JobRecord, RecruiterRecord};
pub use skills::SkillVocabulary;

/// Stands in for a field the page did not show.
pub const NOT_AVAILABLE: &str = "N/A";

/// Addresses elements in the rendered page: a CSS selector, optionally
/// narrowed to elements containing some text, optionally picking the nth match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub selector: String,
    pub text: Option<String>,
    pub nth: Option<usize>,
}

impl Locator {
    pub fn css<S: Into<String>>(selector: S) -> Self {
        Locator {
            selector: selector.into(),
            text: None,
            nth: None,
        }
    }

    pub fn nth(mut self, n: usize) -> Self {
        self.nth = Some(n);
        self
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if let Some(text) = &self.text {
            write!(f, " >> text={}", text)?;
        }
        if let Some(n) = self.nth {
            write!(f, " >> nth={}", n)?;
        }
        Ok(())
    }
}

/// The page the collector drives. Implementations own one browser tab and
/// are only ever used from a single control flow.
#[async_trait::async_trait]
pub trait Renderer: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), CollectorError>;
    async fn current_url(&mut self) -> Result<String, CollectorError>;
    async fn count(&mut self, locator: &Locator) -> Result<usize, CollectorError>;
    async fn scroll_into_view(&mut self, locator: &Locator) -> Result<(), CollectorError>;
    async fn click(&mut self, locator: &Locator) -> Result<(), CollectorError>;
    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, CollectorError>;
    async fn content(&mut self) -> Result<String, CollectorError>;
}

/// Summary card fields as they appear on the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub title: String,
    pub company: String,
    pub location: String,
}

/// One entry of a company's people page, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonCard {
    pub name: String,
    pub title: String,
    pub href: Option<String>,
}

/// Markup and navigation contract of a job board.
pub trait JobBoard {
    fn origin(&self) -> &Url;

    fn requires_login(&self, url: &str) -> bool;

    fn card(&self) -> Locator;
    fn next_page(&self, page: u32) -> Locator;
    fn company_link(&self) -> Locator;
    fn people_tab(&self) -> Locator;

    fn summaries(&self, doc: &Html, limit: usize) -> Vec<JobSummary>;
    fn description(&self, doc: &Html) -> Option<String>;
    fn company_href(&self, doc: &Html) -> Option<String>;
    fn people(&self, doc: &Html) -> Vec<PersonCard>;
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Called after every page with everything collected so far.
    async fn checkpoint(&self, page: u32, jobs: &[JobRecord]) -> Result<(), CollectorError>;

    async fn finish(&self, jobs: &[JobRecord]) -> Result<(), CollectorError>;
}

/// Writes to every inner storage in order.
pub struct Fanout(pub Vec<Box<dyn Storage>>);

#[async_trait::async_trait]
impl Storage for Fanout {
    async fn checkpoint(&self, page: u32, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        for storage in &self.0 {
            storage.checkpoint(page, jobs).await?;
        }
        Ok(())
    }

    async fn finish(&self, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        for storage in &self.0 {
            storage.finish(jobs).await?;
        }
        Ok(())
    }
}

/// Whoever can unblock a session the collector cannot fix by itself.
#[async_trait::async_trait]
pub trait Operator: Send + Sync {
    async fn intervene(&self, reason: &str) -> Result<(), CollectorError>;
}
