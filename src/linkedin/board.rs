use lazy_static::lazy_static;
use scraper::{Html, Selector};
use url::Url;

use super::absolute_url;
use crate::extract::{element_text, extract, first_attr_in, first_text};
use crate::{JobBoard, JobSummary, Locator, PersonCard, NOT_AVAILABLE};

pub const ORIGIN: &str = "https://www.linkedin.com";

const CARD: &str = "div.job-card-container--clickable";
const COMPANY_LINK: &str = "div.job-details-jobs-unified-top-card__company-name a";
const PEOPLE_TAB: &str = "a.org-page-navigation__item-anchor";

const E: &str = "Invalid selector";
lazy_static! {
    static ref SUMMARY_CARD: Selector = Selector::parse(".job-card-container").expect(E);
    static ref SUMMARY_TITLE: Selector =
        Selector::parse(r#"a.job-card-container__link span[aria-hidden="true"]"#).expect(E);
    static ref SUMMARY_COMPANY: Selector =
        Selector::parse("div.artdeco-entity-lockup__subtitle").expect(E);
    static ref SUMMARY_LOCATION: Selector =
        Selector::parse("ul.job-card-container__metadata-wrapper li").expect(E);
    static ref DESCRIPTION: Selector = Selector::parse(".jobs-description__content").expect(E);
    static ref COMPANY_HREF: Selector = Selector::parse(COMPANY_LINK).expect(E);
    static ref PERSON_CARD: Selector =
        Selector::parse("li.org-people-profile-card__profile-card-spacing").expect(E);
    static ref PERSON_NAME: Selector =
        Selector::parse("div.artdeco-entity-lockup__title").expect(E);
    static ref PERSON_TITLE: Selector =
        Selector::parse("div.artdeco-entity-lockup__subtitle").expect(E);
    static ref A: Selector = Selector::parse("a").expect(E);
}

/// LinkedIn job search, as rendered for a signed-in member.
#[derive(Debug, Clone)]
pub struct LinkedIn {
    origin: Url,
}

impl LinkedIn {
    pub fn new(origin: Url) -> Self {
        LinkedIn { origin }
    }

    pub fn search_url(&self, keyword: &str, location: &str) -> Result<Url, url::ParseError> {
        let base = self.origin.join("/jobs/search/")?;
        Url::parse_with_params(
            base.as_str(),
            &[("keywords", keyword.trim()), ("location", location.trim())],
        )
    }
}

impl Default for LinkedIn {
    fn default() -> Self {
        LinkedIn {
            origin: Url::parse(ORIGIN).expect("Invalid origin"),
        }
    }
}

impl JobBoard for LinkedIn {
    fn origin(&self) -> &Url {
        &self.origin
    }

    fn requires_login(&self, url: &str) -> bool {
        ["/login", "/authwall", "/checkpoint/", "/uas/login", "/signup"]
            .iter()
            .any(|marker| url.contains(marker))
    }

    fn card(&self) -> Locator {
        Locator::css(CARD)
    }

    fn next_page(&self, page: u32) -> Locator {
        Locator::css(format!("button[aria-label='Page {}']", page))
    }

    fn company_link(&self) -> Locator {
        Locator::css(COMPANY_LINK)
    }

    fn people_tab(&self) -> Locator {
        Locator::css(PEOPLE_TAB).with_text("People")
    }

    fn summaries(&self, doc: &Html, limit: usize) -> Vec<JobSummary> {
        doc.select(&SUMMARY_CARD)
            .take(limit)
            .map(|card| {
                let field = |selector: &Selector| {
                    first_text(card, selector).unwrap_or_else(|| NOT_AVAILABLE.to_string())
                };
                JobSummary {
                    title: field(&SUMMARY_TITLE),
                    company: field(&SUMMARY_COMPANY),
                    location: field(&SUMMARY_LOCATION),
                }
            })
            .collect()
    }

    fn description(&self, doc: &Html) -> Option<String> {
        extract(doc, &DESCRIPTION)
            .into_iter()
            .find(|text| !text.is_empty())
    }

    fn company_href(&self, doc: &Html) -> Option<String> {
        first_attr_in(doc, &COMPANY_HREF, "href").and_then(|href| absolute_url(&self.origin, &href))
    }

    fn people(&self, doc: &Html) -> Vec<PersonCard> {
        doc.select(&PERSON_CARD)
            .filter_map(|card| {
                let name = card.select(&PERSON_NAME).next().map(element_text)?;
                let title = card.select(&PERSON_TITLE).next().map(element_text)?;
                let href = card
                    .select(&A)
                    .find_map(|a| a.value().attr("href"))
                    .filter(|href| !href.trim().is_empty())
                    .map(ToString::to_string);
                Some(PersonCard { name, title, href })
            })
            .collect()
    }
}
