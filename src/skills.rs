use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Skill names matched against job descriptions. Loaded once per run.
#[derive(Debug, Default)]
pub struct SkillVocabulary {
    entries: Vec<(String, Regex)>,
}

impl SkillVocabulary {
    pub fn new<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = skills
            .into_iter()
            .filter_map(|skill| {
                let skill = skill.as_ref().trim();
                if skill.is_empty() {
                    return None;
                }
                // `\b` misbehaves around entries such as "C++" or ".NET", so
                // the boundary is spelled out as "not a word character".
                let pattern = format!(r"(?:^|\W){}(?:\W|$)", regex::escape(skill));
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(re) => Some((skill.to_lowercase(), re)),
                    Err(e) => {
                        warn!("Skipping skill {:?}: {}", skill, e);
                        None
                    }
                }
            })
            .collect();
        SkillVocabulary { entries }
    }

    /// Reads a JSON array of strings. A missing or malformed file gives an
    /// empty vocabulary.
    pub async fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skills file {} not readable: {}", path.display(), e);
                return SkillVocabulary::default();
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(skills) => {
                let vocabulary = SkillVocabulary::new(skills);
                info!("Loaded {} skills from {}", vocabulary.len(), path.display());
                vocabulary
            }
            Err(e) => {
                warn!("Skills file {} is not a JSON string array: {}", path.display(), e);
                SkillVocabulary::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matches(&self, text: &str) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(skill, _)| skill.clone())
            .collect()
    }
}
