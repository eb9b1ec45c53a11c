//! Keyword-based text moderation.
//!
//! Keywords are matched on whole words, case-insensitively; a multi-word
//! keyword matches a contiguous run of words. Media moderation is switched
//! off: images, audio and video are always allowed.

use serde::{Deserialize, Serialize};

const DEFAULT_KEYWORDS: &[&str] = &[
    "kill yourself",
    "kys",
    "suicide pact",
    "child abuse",
    "underage",
    "rape",
    "revenge porn",
    "human trafficking",
    "terrorist attack",
    "bomb threat",
    "cocaine",
    "heroin",
    "fentanyl",
    "meth",
    "doxx",
    "doxxing",
    "social security number",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationVerdict {
    Allowed,
    Flagged { terms: Vec<String> },
}

impl ModerationVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    // Each keyword pre-split into lowercase words.
    phrases: Vec<(String, Vec<String>)>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();
        filter.extend(keywords);
        filter
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }

    /// Add keywords, skipping blanks and ones already present.
    pub fn extend<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            let words = tokenize(keyword.as_ref());
            if words.is_empty() {
                continue;
            }
            let label = words.join(" ");
            if self.phrases.iter().any(|(existing, _)| *existing == label) {
                continue;
            }
            self.phrases.push((label, words));
        }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn check_text(&self, text: &str) -> ModerationVerdict {
        let words = tokenize(text);
        let terms: Vec<String> = self
            .phrases
            .iter()
            .filter(|(_, phrase)| words.windows(phrase.len()).any(|w| w == phrase.as_slice()))
            .map(|(label, _)| label.clone())
            .collect();

        if terms.is_empty() {
            ModerationVerdict::Allowed
        } else {
            ModerationVerdict::Flagged { terms }
        }
    }

    pub fn check_media(&self, _kind: MediaKind) -> ModerationVerdict {
        ModerationVerdict::Allowed
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
