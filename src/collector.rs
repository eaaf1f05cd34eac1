//! The collection loop: scroll, extract, deduplicate, enrich, checkpoint,
//! paginate, until enough unique jobs are gathered or the listing runs out.

use scraper::Html;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::interaction::{click_with_retry, Console, ConsoleOperator, Interaction, RetryPolicy};
use crate::linkedin::shortlist;
use crate::{
    CollectorError, JobBoard, JobRecord, JobSummary, Operator, RecruiterRecord, Renderer,
    SkillVocabulary, Storage, NOT_AVAILABLE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Upper bound on scroll rounds per page.
    pub scroll_rounds: usize,
    /// Scrolling stops once the card count has not changed for more than
    /// this many consecutive rounds.
    pub stuck_threshold: usize,
    pub scroll_pause: Duration,
    /// Wait after every navigation or click before reading the page.
    pub settle_delay: Duration,
    pub click: RetryPolicy,
    pub recruiters: bool,
    pub max_pages: Option<u32>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            scroll_rounds: 10,
            stuck_threshold: 2,
            scroll_pause: Duration::from_secs(2),
            settle_delay: Duration::from_secs(5),
            click: RetryPolicy::default(),
            recruiters: false,
            max_pages: None,
        }
    }
}

/// State of one run. Never holds two jobs with the same key.
#[derive(Debug)]
pub struct CollectionSession {
    pub search_url: String,
    pub target_count: usize,
    pub current_page: u32,
    seen_keys: HashSet<String>,
    collected: Vec<JobRecord>,
}

impl CollectionSession {
    pub fn new<S: Into<String>>(
        search_url: S,
        target_count: usize,
    ) -> Result<CollectionSession, CollectorError> {
        if target_count == 0 {
            return Err(CollectorError::InvalidTarget);
        }
        Ok(CollectionSession {
            search_url: search_url.into(),
            target_count,
            current_page: 1,
            seen_keys: HashSet::new(),
            collected: vec![],
        })
    }

    /// Seeds the session with jobs from an earlier run so they are skipped.
    pub fn resume(&mut self, jobs: Vec<JobRecord>) {
        let before = self.collected.len();
        for job in jobs {
            if self.seen_keys.insert(job.key()) {
                self.collected.push(job);
            }
        }
        info!("Resumed {} jobs", self.collected.len() - before);
    }

    pub fn collected(&self) -> &[JobRecord] {
        &self.collected
    }

    pub fn is_complete(&self) -> bool {
        self.collected.len() >= self.target_count
    }

    pub fn remaining(&self) -> usize {
        self.target_count.saturating_sub(self.collected.len())
    }

    /// Keeps summaries whose key is new, in encounter order, remembering
    /// where each card sits on the page.
    fn admit(&mut self, summaries: Vec<JobSummary>) -> Vec<Candidate> {
        summaries
            .into_iter()
            .enumerate()
            .filter_map(|(position, summary)| {
                let job = JobRecord::from(summary);
                if self.seen_keys.insert(job.key()) {
                    Some(Candidate { position, job })
                } else {
                    debug!("Already seen {}", job.key());
                    None
                }
            })
            .collect()
    }

    fn into_jobs(mut self) -> Vec<JobRecord> {
        self.collected.truncate(self.target_count);
        self.collected
    }
}

/// A newly seen job and the index of its card on the current page.
#[derive(Debug)]
struct Candidate {
    position: usize,
    job: JobRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollReport {
    /// Scrolls actually performed.
    pub rounds: usize,
    /// Cards visible when scrolling stopped.
    pub cards: usize,
}

pub struct Collector<R, B, S> {
    renderer: R,
    board: B,
    storage: S,
    skills: SkillVocabulary,
    config: CollectorConfig,
    operator: Box<dyn Operator>,
}

impl<R, B, S> Collector<R, B, S>
where
    R: Renderer,
    B: JobBoard,
    S: Storage,
{
    pub fn new(
        renderer: R,
        board: B,
        storage: S,
        skills: SkillVocabulary,
        config: CollectorConfig,
    ) -> Self {
        Collector {
            renderer,
            board,
            storage,
            skills,
            config,
            operator: Box::new(ConsoleOperator::new(Arc::new(Console::stdin()))),
        }
    }

    pub fn with_operator<O: Operator + 'static>(mut self, operator: O) -> Self {
        self.operator = Box::new(operator);
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Gathers up to `session.target_count` unique jobs.
    ///
    /// Returns fewer when the listing runs out of pages. Progress is
    /// checkpointed after every page and the final list is handed to storage
    /// before returning.
    pub async fn collect(
        &mut self,
        mut session: CollectionSession,
    ) -> Result<Vec<JobRecord>, CollectorError> {
        if !session.is_complete() {
            self.open(&session.search_url).await?;
        }

        while !session.is_complete() {
            let report = self.scroll_to_load().await?;
            info!(
                "Page {}: {} cards visible after {} scrolls",
                session.current_page, report.cards, report.rounds
            );

            let listing_url = self.renderer.current_url().await?;
            let markup = self.renderer.content().await?;
            let summaries = {
                let doc = Html::parse_document(&markup);
                self.board.summaries(&doc, session.target_count)
            };
            let found = summaries.len();
            let mut candidates = session.admit(summaries);
            candidates.truncate(session.remaining());
            info!(
                "Page {}: {} summaries, {} new",
                session.current_page,
                found,
                candidates.len()
            );

            self.enrich_details(&mut candidates).await;
            if self.config.recruiters && !candidates.is_empty() {
                self.enrich_recruiters(&listing_url, &mut candidates).await?;
            }

            session
                .collected
                .extend(candidates.into_iter().map(|c| c.job));
            self.storage
                .checkpoint(session.current_page, &session.collected)
                .await?;

            if session.is_complete() {
                break;
            }
            if let Some(max) = self.config.max_pages {
                if session.current_page >= max {
                    info!("Reached page limit {}", max);
                    break;
                }
            }
            if !self.next_page(session.current_page).await? {
                info!("No page after {}, stopping", session.current_page);
                break;
            }
            session.current_page += 1;
        }

        let jobs = session.into_jobs();
        info!("Total jobs collected: {}", jobs.len());
        self.storage.finish(&jobs).await?;
        Ok(jobs)
    }

    /// Opens the search, handing over to the operator when the session is not
    /// usable (navigation failure or a sign-in wall).
    async fn open(&mut self, url: &str) -> Result<(), CollectorError> {
        info!("Navigating to {}", url);
        let blocked = match self.renderer.navigate(url).await {
            Ok(()) => {
                self.settle().await;
                let current = self.renderer.current_url().await?;
                self.board
                    .requires_login(&current)
                    .then(|| format!("Not signed in, the browser is on {}", current))
            }
            Err(e) => Some(format!("Could not open {}: {}", url, e)),
        };

        if let Some(reason) = blocked {
            self.operator.intervene(&reason).await?;
            self.renderer.navigate(url).await?;
            self.settle().await;
            let current = self.renderer.current_url().await?;
            if self.board.requires_login(&current) {
                return Err(CollectorError::Session(format!(
                    "still not signed in after intervention ({})",
                    current
                )));
            }
        }
        Ok(())
    }

    /// Scrolls the last visible card into view until the listing stops
    /// growing or the round limit is hit.
    pub async fn scroll_to_load(&mut self) -> Result<ScrollReport, CollectorError> {
        let cards = self.board.card();
        let mut previous = 0;
        let mut stuck = 0;
        let mut rounds = 0;

        for round in 1..=self.config.scroll_rounds {
            let current = self.renderer.count(&cards).await?;
            debug!("Job cards before scroll {}: {}", round, current);

            if current == previous {
                stuck += 1;
                if stuck > self.config.stuck_threshold {
                    debug!("No new cards after {} rounds, stopping", stuck);
                    break;
                }
            } else {
                stuck = 0;
            }
            previous = current;

            if current == 0 {
                tokio::time::sleep(self.config.scroll_pause).await;
                continue;
            }

            match self
                .renderer
                .scroll_into_view(&cards.clone().nth(current - 1))
                .await
            {
                Ok(()) => {
                    rounds += 1;
                    tokio::time::sleep(self.config.scroll_pause).await;
                }
                Err(e) if e.is_transient() => {
                    warn!("Scroll error: {}", e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ScrollReport {
            rounds,
            cards: previous,
        })
    }

    async fn enrich_details(&mut self, candidates: &mut [Candidate]) {
        let total = candidates.len();
        for (i, candidate) in candidates.iter_mut().enumerate() {
            match self.enrich_detail(candidate).await {
                Ok(Interaction::Done { .. }) => {
                    info!(
                        "[{}/{}] {} | {} skills",
                        i + 1,
                        total,
                        candidate.job.title,
                        candidate.job.skills.as_ref().map(|s| s.len()).unwrap_or(0)
                    );
                    debug!("\n{}", candidate.job);
                }
                Ok(Interaction::Skipped { reason, .. }) => {
                    warn!("Could not click job {}: {}", i + 1, reason)
                }
                Err(e) => warn!("Could not enrich job {}: {}", i + 1, e),
            }
        }
    }

    async fn enrich_detail(
        &mut self,
        candidate: &mut Candidate,
    ) -> Result<Interaction, CollectorError> {
        let card = self.board.card().nth(candidate.position);
        let outcome = click_with_retry(&mut self.renderer, &card, self.config.click).await?;
        if !outcome.is_done() {
            return Ok(outcome);
        }
        self.settle().await;

        let markup = self.renderer.content().await?;
        let (description, company_link) = {
            let doc = Html::parse_document(&markup);
            (self.board.description(&doc), self.board.company_href(&doc))
        };

        let job = &mut candidate.job;
        job.skills = Some(
            description
                .as_deref()
                .map(|d| self.skills.matches(d))
                .unwrap_or_default(),
        );
        job.description = Some(description.unwrap_or_else(|| NOT_AVAILABLE.to_string()));
        job.company_link = company_link;
        Ok(outcome)
    }

    async fn enrich_recruiters(
        &mut self,
        listing_url: &str,
        candidates: &mut [Candidate],
    ) -> Result<(), CollectorError> {
        let total = candidates.len();
        for (i, candidate) in candidates.iter_mut().enumerate() {
            debug!("Processing recruiters for job {} of {}", i + 1, total);
            match self.find_recruiters(listing_url, candidate.position).await {
                Ok(Some(recruiters)) => {
                    info!("Found {} recruiter(s) for job {}", recruiters.len(), i + 1);
                    if !recruiters.is_empty() {
                        candidate.job.recruiters = Some(recruiters);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Error extracting recruiters for job {}: {}", i + 1, e),
            }
        }

        // Pagination lives on the listing.
        self.renderer.navigate(listing_url).await?;
        self.settle().await;
        Ok(())
    }

    /// `None` when one of the clicks towards the people page was skipped.
    async fn find_recruiters(
        &mut self,
        listing_url: &str,
        position: usize,
    ) -> Result<Option<Vec<RecruiterRecord>>, CollectorError> {
        self.renderer.navigate(listing_url).await?;
        self.settle().await;

        let card = self.board.card().nth(position);
        if self.renderer.count(&self.board.card()).await? <= position {
            self.scroll_to_load().await?;
        }

        let steps = [card, self.board.company_link(), self.board.people_tab()];
        for step in &steps {
            let outcome = click_with_retry(&mut self.renderer, step, self.config.click).await?;
            if let Interaction::Skipped { reason, .. } = outcome {
                warn!("Could not click {} for job card {}: {}", step, position + 1, reason);
                return Ok(None);
            }
            self.settle().await;
        }

        let markup = self.renderer.content().await?;
        let people = {
            let doc = Html::parse_document(&markup);
            self.board.people(&doc)
        };
        Ok(Some(shortlist(people, self.board.origin())))
    }

    async fn next_page(&mut self, page: u32) -> Result<bool, CollectorError> {
        let next = self.board.next_page(page + 1);
        let visible = match self.renderer.is_visible(&next).await {
            Ok(visible) => visible,
            Err(e) if e.is_transient() => {
                warn!("Pagination error: {}", e);
                false
            }
            Err(e) => return Err(e),
        };
        if !visible {
            return Ok(false);
        }

        info!("Going to page {}", page + 1);
        match click_with_retry(&mut self.renderer, &next, self.config.click).await? {
            Interaction::Done { .. } => {
                self.settle().await;
                Ok(true)
            }
            Interaction::Skipped { reason, .. } => {
                warn!("Could not open page {}: {}", page + 1, reason);
                Ok(false)
            }
        }
    }

    async fn settle(&self) {
        tokio::time::sleep(self.config.settle_delay).await;
    }
}
