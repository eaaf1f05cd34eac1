//! In-memory stand-ins for the browser, the storage and the operator.

use std::collections::{HashMap, VecDeque};
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::linkedin::LinkedIn;
use crate::{CollectorError, JobBoard, JobRecord, Locator, Operator, PersonCard, Renderer, Storage};

pub(crate) const SEARCH_URL: &str = "https://www.linkedin.com/jobs/search/?keywords=rust";
const PAGE_SIZE: usize = 25;

#[derive(Debug, Clone)]
pub(crate) struct FakeJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl FakeJob {
    pub fn new(title: &str, company: &str) -> Self {
        FakeJob {
            title: title.to_string(),
            company: company.to_string(),
            location: Some("Remote".to_string()),
            description: Some(format!("{} role working with Python and SQL", title)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    Listing,
    Company(String),
    People(String),
}

/// Renders LinkedIn-shaped markup for a scripted set of listing pages.
pub(crate) struct FakeRenderer {
    board: LinkedIn,
    pages: Vec<Vec<FakeJob>>,
    people: HashMap<String, Vec<PersonCard>>,
    page: usize,
    view: View,
    selected: Option<usize>,
    initial_cards: Option<usize>,
    batch: usize,
    loaded: usize,
    scripted_counts: Option<VecDeque<usize>>,
    last_count: usize,
    failures: HashMap<(usize, usize), u32>,
    authenticated: Arc<AtomicBool>,
    crashed: bool,
    pub clicks: Vec<String>,
    pub navigations: Vec<String>,
    pub scrolls: usize,
    pub count_reads: usize,
}

impl FakeRenderer {
    pub fn new() -> Self {
        FakeRenderer {
            board: LinkedIn::default(),
            pages: vec![],
            people: HashMap::new(),
            page: 0,
            view: View::Listing,
            selected: None,
            initial_cards: None,
            batch: 1,
            loaded: 0,
            scripted_counts: None,
            last_count: 0,
            failures: HashMap::new(),
            authenticated: Arc::new(AtomicBool::new(true)),
            crashed: false,
            clicks: vec![],
            navigations: vec![],
            scrolls: 0,
            count_reads: 0,
        }
    }

    /// Adds a page whose jobs are named after `titles`, one company each.
    pub fn page(self, titles: &[&str]) -> Self {
        let jobs = titles
            .iter()
            .map(|t| FakeJob::new(t, &format!("{} Corp", t)))
            .collect();
        self.page_jobs(jobs)
    }

    pub fn page_jobs(mut self, jobs: Vec<FakeJob>) -> Self {
        self.pages.push(jobs);
        self.reset_listing();
        self
    }

    /// Only `initial` cards are rendered at first; every scroll adds `batch`.
    pub fn lazy(mut self, initial: usize, batch: usize) -> Self {
        self.initial_cards = Some(initial);
        self.batch = batch;
        self.reset_listing();
        self
    }

    /// Card counts reported by successive reads, the last one repeating.
    pub fn counts(mut self, counts: &[usize]) -> Self {
        self.scripted_counts = Some(counts.iter().copied().collect());
        self
    }

    pub fn people(mut self, company: &str, people: Vec<PersonCard>) -> Self {
        self.people.insert(company.to_string(), people);
        self
    }

    pub fn signed_out(mut self, flag: Arc<AtomicBool>) -> Self {
        flag.store(false, Ordering::SeqCst);
        self.authenticated = flag;
        self
    }

    /// The card at `position` on `page` (both 0-based) fails `times` clicks.
    pub fn fail_card(&mut self, page: usize, position: usize, times: u32) {
        self.failures.insert((page, position), times);
    }

    pub fn crash(&mut self) {
        self.crashed = true;
    }

    pub fn click_attempts(&self) -> usize {
        self.clicks.len()
    }

    pub fn card_clicks(&self) -> usize {
        let card = self.board.card().selector;
        self.clicks.iter().filter(|c| c.starts_with(&card)).count()
    }

    fn current_jobs(&self) -> &[FakeJob] {
        self.pages.get(self.page).map(Vec::as_slice).unwrap_or(&[])
    }

    fn reset_listing(&mut self) {
        let len = self.current_jobs().len();
        self.loaded = self.initial_cards.unwrap_or(len).min(len);
        self.selected = None;
        self.view = View::Listing;
    }

    fn check_alive(&self) -> Result<(), CollectorError> {
        if self.crashed {
            return Err(CollectorError::Session("browser closed".to_string()));
        }
        Ok(())
    }

    fn page_button(&self, locator: &Locator) -> Option<usize> {
        locator
            .selector
            .strip_prefix("button[aria-label='Page ")
            .and_then(|s| s.strip_suffix("']"))
            .and_then(|n| n.parse().ok())
    }

    fn listing_url(&self) -> String {
        if self.page == 0 {
            SEARCH_URL.to_string()
        } else {
            format!("{}&start={}", SEARCH_URL, self.page * PAGE_SIZE)
        }
    }

    fn render_listing(&self) -> String {
        let mut html = String::from("<html><body><ul>");
        for (i, job) in self.current_jobs().iter().take(self.loaded).enumerate() {
            let _ = write!(
                html,
                r#"<li><div class="job-card-container job-card-container--clickable">
                   <a class="job-card-container__link" href="/jobs/view/{}{}/"><span aria-hidden="true">{}</span></a>
                   <div class="artdeco-entity-lockup__subtitle">{}</div>"#,
                self.page, i, job.title, job.company
            );
            if let Some(location) = &job.location {
                let _ = write!(
                    html,
                    r#"<ul class="job-card-container__metadata-wrapper"><li>{}</li></ul>"#,
                    location
                );
            }
            html.push_str("</div></li>");
        }
        html.push_str("</ul>");
        if let Some(job) = self.selected.and_then(|i| self.current_jobs().get(i)) {
            let _ = write!(
                html,
                r#"<div class="job-details-jobs-unified-top-card__company-name"><a href="/company/{}/life/">{}</a></div>"#,
                slug(&job.company),
                job.company
            );
            if let Some(description) = &job.description {
                let _ = write!(
                    html,
                    r#"<div class="jobs-description__content"><p>{}</p></div>"#,
                    description
                );
            }
        }
        html.push_str("<div>");
        for n in 1..=self.pages.len() {
            let _ = write!(html, r#"<button aria-label="Page {n}">{n}</button>"#);
        }
        html.push_str("</div></body></html>");
        html
    }

    fn render_company(&self) -> String {
        r#"<html><body><nav>
             <a class="org-page-navigation__item-anchor">Home</a>
             <a class="org-page-navigation__item-anchor">People</a>
           </nav></body></html>"#
            .to_string()
    }

    fn render_people(&self, company: &str) -> String {
        let mut html = String::from("<html><body><ul>");
        for person in self.people.get(company).map(Vec::as_slice).unwrap_or(&[]) {
            html.push_str(r#"<li class="org-people-profile-card__profile-card-spacing">"#);
            if let Some(href) = &person.href {
                let _ = write!(html, r#"<a href="{}">profile</a>"#, href);
            }
            let _ = write!(
                html,
                r#"<div class="artdeco-entity-lockup__title">{}</div>
                   <div class="artdeco-entity-lockup__subtitle">{}</div></li>"#,
                person.name, person.title
            );
        }
        html.push_str("</ul></body></html>");
        html
    }
}

fn slug(company: &str) -> String {
    company.to_lowercase().replace(' ', "-")
}

fn missing(locator: &Locator) -> CollectorError {
    CollectorError::Interaction(format!("no element matches {}", locator))
}

#[async_trait::async_trait]
impl Renderer for FakeRenderer {
    async fn navigate(&mut self, url: &str) -> Result<(), CollectorError> {
        self.check_alive()?;
        self.navigations.push(url.to_string());
        self.page = url
            .split("start=")
            .nth(1)
            .and_then(|s| s.parse::<usize>().ok())
            .map(|start| start / PAGE_SIZE)
            .unwrap_or(0);
        self.reset_listing();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, CollectorError> {
        self.check_alive()?;
        if !self.authenticated.load(Ordering::SeqCst) {
            return Ok("https://www.linkedin.com/login?session_redirect=jobs".to_string());
        }
        Ok(match &self.view {
            View::Listing => self.listing_url(),
            View::Company(c) => format!("https://www.linkedin.com/company/{}/", slug(c)),
            View::People(c) => format!("https://www.linkedin.com/company/{}/people/", slug(c)),
        })
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, CollectorError> {
        self.check_alive()?;
        if locator.selector != self.board.card().selector {
            return Ok(0);
        }
        self.count_reads += 1;
        if let Some(script) = self.scripted_counts.as_mut() {
            if let Some(next) = script.pop_front() {
                self.last_count = next;
            }
            return Ok(self.last_count);
        }
        Ok(if self.view == View::Listing { self.loaded } else { 0 })
    }

    async fn scroll_into_view(&mut self, locator: &Locator) -> Result<(), CollectorError> {
        self.check_alive()?;
        let n = locator.nth.unwrap_or(0);
        if self.scripted_counts.is_some() {
            self.scrolls += 1;
            return Ok(());
        }
        if self.view != View::Listing || n >= self.loaded {
            return Err(missing(locator));
        }
        self.scrolls += 1;
        self.loaded = (self.loaded + self.batch).min(self.current_jobs().len());
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), CollectorError> {
        self.clicks.push(locator.to_string());
        self.check_alive()?;

        if locator.selector == self.board.card().selector {
            let n = locator.nth.unwrap_or(0);
            if let Some(remaining) = self.failures.get_mut(&(self.page, n)) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(CollectorError::Interaction(
                        "element is not attached to the page document".to_string(),
                    ));
                }
            }
            if self.view != View::Listing || n >= self.loaded {
                return Err(missing(locator));
            }
            self.selected = Some(n);
            return Ok(());
        }

        if *locator == self.board.company_link() {
            let company = match (&self.view, self.selected) {
                (View::Listing, Some(i)) => self.current_jobs().get(i).map(|j| j.company.clone()),
                _ => None,
            };
            let company = company.ok_or_else(|| missing(locator))?;
            self.view = View::Company(company);
            return Ok(());
        }

        if *locator == self.board.people_tab() {
            if let View::Company(company) = &self.view {
                self.view = View::People(company.clone());
                return Ok(());
            }
            return Err(missing(locator));
        }

        if let Some(n) = self.page_button(locator) {
            if self.view == View::Listing && n >= 1 && n <= self.pages.len() {
                self.page = n - 1;
                self.reset_listing();
                return Ok(());
            }
        }
        Err(missing(locator))
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, CollectorError> {
        self.check_alive()?;
        if let Some(n) = self.page_button(locator) {
            return Ok(self.view == View::Listing && n >= 1 && n <= self.pages.len());
        }
        Ok(self.count(locator).await? > 0)
    }

    async fn content(&mut self) -> Result<String, CollectorError> {
        self.check_alive()?;
        Ok(match &self.view {
            View::Listing => self.render_listing(),
            View::Company(_) => self.render_company(),
            View::People(company) => self.render_people(company),
        })
    }
}

/// Keeps every checkpoint and the final result in memory.
#[derive(Default)]
pub(crate) struct MemoryStorage {
    pub checkpoints: Mutex<Vec<(u32, Vec<JobRecord>)>>,
    pub finished: Mutex<Option<Vec<JobRecord>>>,
}

impl MemoryStorage {
    pub fn checkpoint_pages(&self) -> Vec<(u32, usize)> {
        self.checkpoints
            .lock()
            .unwrap()
            .iter()
            .map(|(page, jobs)| (*page, jobs.len()))
            .collect()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn checkpoint(&self, page: u32, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        self.checkpoints.lock().unwrap().push((page, jobs.to_vec()));
        Ok(())
    }

    async fn finish(&self, jobs: &[JobRecord]) -> Result<(), CollectorError> {
        *self.finished.lock().unwrap() = Some(jobs.to_vec());
        Ok(())
    }
}

/// Signs the fake browser in when asked to intervene.
pub(crate) struct SignInOperator {
    pub authenticated: Arc<AtomicBool>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Operator for SignInOperator {
    async fn intervene(&self, _reason: &str) -> Result<(), CollectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }
}
