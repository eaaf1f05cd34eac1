//! [`Renderer`] backed by a local Chrome through the DevTools protocol.
//!
//! `headless_chrome` is synchronous, so every call is moved onto tokio's
//! blocking pool with its own handle to the tab.

use headless_chrome::{Browser, Element, LaunchOptionsBuilder, Tab};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{CollectorError, Locator, Renderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Profile directory, so a signed-in session survives between runs.
    pub user_data_dir: Option<PathBuf>,
    pub window_size: (u32, u32),
    pub user_agent: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        BrowserOptions {
            headless: false,
            user_data_dir: None,
            window_size: (1920, 1080),
            user_agent: None,
        }
    }
}

pub struct ChromeRenderer {
    // Dropping the browser kills the Chrome process.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeRenderer {
    pub fn launch(options: &BrowserOptions) -> Result<Self, CollectorError> {
        let launch = LaunchOptionsBuilder::default()
            .headless(options.headless)
            .window_size(Some(options.window_size))
            .user_data_dir(options.user_data_dir.clone())
            .build()
            .map_err(|e| CollectorError::Session(e.to_string()))?;

        let browser = Browser::new(launch).map_err(session)?;
        let tab = browser.new_tab().map_err(session)?;
        if let Some(ua) = options.user_agent.as_deref() {
            tab.set_user_agent(ua, None, None).map_err(session)?;
        }
        info!("Chrome launched (headless: {})", options.headless);

        Ok(ChromeRenderer {
            _browser: browser,
            tab,
        })
    }

    async fn run<T, F>(&self, f: F) -> Result<T, CollectorError>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> Result<T, CollectorError> + Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || f(&tab))
            .await
            .map_err(|e| CollectorError::Session(e.to_string()))?
    }
}

fn session(e: impl ToString) -> CollectorError {
    CollectorError::Session(e.to_string())
}

/// A dead connection ends the run; anything else is worth another try.
fn classify(e: impl ToString) -> CollectorError {
    let message = e.to_string();
    if message.contains("connection is closed") || message.contains("Browser closed") {
        CollectorError::Session(message)
    } else {
        CollectorError::Interaction(message)
    }
}

/// Elements matching the selector, narrowed by text when the locator has one.
fn matching<'a>(tab: &'a Tab, locator: &Locator) -> Vec<Element<'a>> {
    let elements = match tab.find_elements(&locator.selector) {
        Ok(elements) => elements,
        Err(e) => {
            debug!("Nothing matches {}: {}", locator.selector, e);
            return vec![];
        }
    };
    match &locator.text {
        Some(text) => elements
            .into_iter()
            .filter(|el| {
                el.get_inner_text()
                    .map(|t| t.contains(text.as_str()))
                    .unwrap_or(false)
            })
            .collect(),
        None => elements,
    }
}

fn resolve<'a>(tab: &'a Tab, locator: &Locator) -> Result<Element<'a>, CollectorError> {
    matching(tab, locator)
        .into_iter()
        .nth(locator.nth.unwrap_or(0))
        .ok_or_else(|| CollectorError::Interaction(format!("no element matches {}", locator)))
}

#[async_trait::async_trait]
impl Renderer for ChromeRenderer {
    async fn navigate(&mut self, url: &str) -> Result<(), CollectorError> {
        let url = url.to_string();
        self.run(move |tab| {
            tab.navigate_to(&url)
                .and_then(|t| t.wait_until_navigated())
                .map(|_| ())
                .map_err(classify)
        })
        .await
    }

    async fn current_url(&mut self) -> Result<String, CollectorError> {
        self.run(|tab| Ok(tab.get_url())).await
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, CollectorError> {
        let locator = locator.clone();
        self.run(move |tab| Ok(matching(tab, &locator).len())).await
    }

    async fn scroll_into_view(&mut self, locator: &Locator) -> Result<(), CollectorError> {
        let locator = locator.clone();
        self.run(move |tab| {
            resolve(tab, &locator)?
                .scroll_into_view()
                .map(|_| ())
                .map_err(classify)
        })
        .await
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), CollectorError> {
        let locator = locator.clone();
        self.run(move |tab| {
            let element = resolve(tab, &locator)?;
            element.scroll_into_view().map_err(classify)?;
            element.click().map(|_| ()).map_err(classify)
        })
        .await
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, CollectorError> {
        let locator = locator.clone();
        self.run(move |tab| {
            Ok(matching(tab, &locator)
                .get(locator.nth.unwrap_or(0))
                .and_then(|el| el.get_box_model().ok())
                .map(|b| b.width > 0.0 && b.height > 0.0)
                .unwrap_or(false))
        })
        .await
    }

    async fn content(&mut self) -> Result<String, CollectorError> {
        self.run(|tab| tab.get_content().map_err(classify)).await
    }
}
