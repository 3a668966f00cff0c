//! Phrase quality policy: whitelist rejection, blacklist weighting, and the
//! "already covered by a fix rule" predicate.

use std::collections::{HashMap, HashSet};

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::config::{QualityPolicy, MIN_NGRAM_LEN};
use crate::lexicon::{COMMON_WORDS, DEFAULT_NAMES};

#[derive(Debug, Clone)]
pub struct QualityFilter {
    whitelist: HashSet<String>,
    blacklist: HashMap<String, f64>,
    covered: Vec<Regex>,
}

impl QualityFilter {
    /// Build the effective whitelist (default names, common words, user
    /// entries) and compile the active fix-rule sources. Sources that fail to
    /// compile are skipped.
    pub fn new(policy: &QualityPolicy, covered_patterns: &[String]) -> Self {
        let mut whitelist: HashSet<String> = DEFAULT_NAMES
            .iter()
            .chain(COMMON_WORDS.iter())
            .map(|w| w.to_string())
            .collect();
        whitelist.extend(policy.whitelist.iter().map(|w| w.to_lowercase()));

        let blacklist = policy
            .blacklist
            .iter()
            .map(|(term, weight)| (term.to_lowercase(), *weight))
            .collect();

        let covered = compile_covered(covered_patterns);
        debug!(
            whitelist = whitelist.len(),
            covered = covered.len(),
            "quality filter ready"
        );

        Self {
            whitelist,
            blacklist,
            covered,
        }
    }

    pub fn is_whitelisted(&self, token: &str) -> bool {
        self.whitelist.contains(token)
    }

    /// Too short to be an n-gram, or made entirely of whitelisted words.
    pub fn is_low_quality<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        if tokens.len() < MIN_NGRAM_LEN {
            return true;
        }
        tokens
            .iter()
            .all(|t| self.is_whitelisted(&t.as_ref().to_lowercase()))
    }

    pub fn uncommon_count<S: AsRef<str>>(&self, tokens: &[S]) -> usize {
        tokens
            .iter()
            .filter(|t| !self.is_whitelisted(t.as_ref()))
            .count()
    }

    /// Highest weight among blacklist terms contained in `phrase`, or 0.
    pub fn blacklist_weight(&self, phrase: &str) -> f64 {
        if self.blacklist.is_empty() {
            return 0.0;
        }
        let lower = phrase.to_lowercase();
        self.blacklist
            .iter()
            .filter(|(term, _)| lower.contains(term.as_str()))
            .map(|(_, weight)| *weight)
            .fold(0.0, f64::max)
    }

    pub fn is_already_covered(&self, phrase: &str) -> bool {
        if self.covered.is_empty() {
            return false;
        }
        let lower = phrase.to_lowercase();
        self.covered.iter().any(|re| re.is_match(&lower))
    }

    pub fn covered_len(&self) -> usize {
        self.covered.len()
    }
}

fn compile_covered(sources: &[String]) -> Vec<Regex> {
    sources
        .iter()
        .filter_map(|source| {
            match RegexBuilder::new(source).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %source, error = %e, "skipping invalid fix pattern");
                    None
                }
            }
        })
        .collect()
}
