mod board;
mod data;

pub use board::LinkedIn;
pub use data::LinkedInData;

use itertools::Itertools;
use lazy_regex::regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

use crate::{JobSummary, PersonCard};

/// Placeholder LinkedIn shows instead of a name outside your network.
pub const ANONYMOUS_MEMBER: &str = "LinkedIn Member";
pub const HIDDEN_MEMBER: &str = "LinkedIn Member (hidden)";

pub const MAX_RECRUITERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "job_title")]
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recruiters: Option<Vec<RecruiterRecord>>,
}

impl JobRecord {
    /// Two records with the same key are the same job.
    pub fn key(&self) -> String {
        format!("{} @ {}", self.title, self.company)
    }
}

impl From<JobSummary> for JobRecord {
    fn from(summary: JobSummary) -> Self {
        JobRecord {
            title: summary.title,
            company: summary.company,
            location: summary.location,
            company_link: None,
            description: None,
            skills: None,
            recruiters: None,
        }
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title        : {}", self.title)?;
        writeln!(f, "Company      : {}", self.company)?;
        writeln!(f, "Location     : {}", self.location)?;
        if let Some(link) = self.company_link.as_ref() {
            writeln!(f, "Company link : {}", link)?;
        }
        match self.skills.as_ref() {
            Some(skills) if !skills.is_empty() => {
                writeln!(f, "Skills       : {}", skills.iter().join(", "))?;
            }
            Some(_) => writeln!(f, "Skills       : -")?,
            None => writeln!(f, "Skills       : not enriched")?,
        }
        if let Some(recruiters) = self.recruiters.as_ref() {
            writeln!(f, "Recruiters   : ")?;
            for r in recruiters {
                writeln!(f, "> {} ({})", r.name, r.title)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruiterRecord {
    pub name: String,
    pub title: String,
    pub profile_url: Option<String>,
}

impl RecruiterRecord {
    /// Keeps the person only when their title looks like recruiting or HR.
    pub fn from_card(card: PersonCard, origin: &Url) -> Option<Self> {
        if !is_recruiting_title(&card.title) {
            return None;
        }
        let name = if card.name.eq_ignore_ascii_case(ANONYMOUS_MEMBER) {
            HIDDEN_MEMBER.to_string()
        } else {
            card.name
        };
        let profile_url = card.href.and_then(|href| absolute_url(origin, &href));
        Some(RecruiterRecord {
            name,
            title: card.title,
            profile_url,
        })
    }
}

pub fn is_recruiting_title(title: &str) -> bool {
    regex!(r"(?i)recruit|talent|hr|people|human resource").is_match(title)
}

/// First [`MAX_RECRUITERS`] relevant people, in page order.
pub fn shortlist<I>(cards: I, origin: &Url) -> Vec<RecruiterRecord>
where
    I: IntoIterator<Item = PersonCard>,
{
    cards
        .into_iter()
        .filter_map(|card| RecruiterRecord::from_card(card, origin))
        .take(MAX_RECRUITERS)
        .collect()
}

/// Resolves site-relative links against `origin`; absolute links pass through.
pub fn absolute_url(origin: &Url, href: &str) -> Option<String> {
    origin.join(href.trim()).ok().map(String::from)
}
