// src/services/classifier.rs

//! Episode title classification.
//!
//! Maps a raw episode title onto the canonical name of the show it belongs
//! to. Rules are tried top-down and the first match wins: the configured
//! franchise rules first, so known aliases ("Y Chromes" / "Y-Chromes") are
//! unified before the generic episode pattern gets a chance to split them.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::ShowRule;
use crate::utils::entities::unescape;

/// Everything before the first episode separator is the show name.
///
/// Separators: `", Ep. N -"`, `" Ep. N:"`, `" Ep. N -"`, `":"` and
/// `" - Chapter N:"`, each followed by a space.
static EPISODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.*?)(?:,? Ep.? \d+(?: -|:)|:| - Chapter \d+:) .*")
        .expect("episode pattern is valid")
});

static DEFAULT: LazyLock<TitleClassifier> = LazyLock::new(|| {
    TitleClassifier::from_rules(&crate::models::Config::default().shows)
        .expect("default show rules are valid")
});

#[derive(Debug, Clone)]
enum Matcher {
    Prefix(String),
    Pattern(Regex),
    /// First capture group is the show name.
    Capture(Regex),
}

#[derive(Debug, Clone)]
struct Rule {
    matcher: Matcher,
    show: Option<String>,
}

impl Rule {
    fn apply(&self, title: &str) -> Option<String> {
        match &self.matcher {
            Matcher::Prefix(prefix) => title.starts_with(prefix.as_str()).then(|| self.canonical()),
            Matcher::Pattern(re) => re.is_match(title).then(|| self.canonical()),
            Matcher::Capture(re) => re
                .captures(title)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        }
    }

    fn canonical(&self) -> String {
        self.show.clone().unwrap_or_default()
    }
}

/// Ordered title → show rules.
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    rules: Vec<Rule>,
}

impl TitleClassifier {
    /// Build a classifier from franchise rules; the generic episode pattern
    /// is always appended last.
    pub fn from_rules(rules: &[ShowRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len() + 1);
        for rule in rules {
            if rule.show.trim().is_empty() {
                return Err(AppError::validation("show rule has an empty show name"));
            }
            let matcher = match (&rule.prefix, &rule.pattern) {
                (Some(prefix), None) => Matcher::Prefix(prefix.clone()),
                (None, Some(pattern)) => {
                    Matcher::Pattern(Regex::new(pattern).map_err(|e| AppError::pattern(pattern, e))?)
                }
                _ => {
                    return Err(AppError::validation(format!(
                        "show rule for '{}' needs exactly one of prefix or pattern",
                        rule.show
                    )));
                }
            };
            compiled.push(Rule {
                matcher,
                show: Some(rule.show.clone()),
            });
        }

        compiled.push(Rule {
            matcher: Matcher::Capture(EPISODE_PATTERN.clone()),
            show: None,
        });

        Ok(Self { rules: compiled })
    }

    /// Classifier with the built-in franchise rules.
    pub fn builtin() -> &'static Self {
        &DEFAULT
    }

    /// Canonical show name for an already decoded title.
    ///
    /// `None` means the episode belongs to no show; an empty capture counts
    /// as no match.
    pub fn classify(&self, title: &str) -> Option<String> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(title))
            .filter(|show| !show.is_empty())
    }

    /// Decode the entity-escaped `<title>` body of an episode and classify
    /// it.
    pub fn classify_raw(&self, raw_title: &str) -> Option<String> {
        self.classify(&unescape(raw_title))
    }
}
