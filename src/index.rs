//! The n-gram frequency table.
//!
//! Records are keyed by the lemmatized n-gram so inflected variants of one
//! phrase accumulate together; the latest surface form and sentence are kept
//! for display.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::candidates::SlopCandidateSet;
use crate::config::{QualityPolicy, MIN_NGRAM_LEN};
use crate::normalize::{self, SentenceKind};
use crate::quality::QualityFilter;

const LENGTH_BONUS_PER_WORD: f64 = 0.2;
const UNCOMMON_WORD_BONUS: f64 = 0.5;
const NARRATION_MULTIPLIER: f64 = 1.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramRecord {
    /// Most recent surface form, lowercased.
    pub original: String,
    pub count: u64,
    pub score: f64,
    pub last_seen: usize,
    /// Sentence the phrase was last seen in.
    pub context: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackOutcome {
    /// N-grams that passed the quality filter and were counted.
    pub counted: usize,
    /// Keys whose score crossed the slop threshold during this call.
    pub crossed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgramIndex {
    pub(crate) records: HashMap<String, NgramRecord>,
    pub(crate) candidates: SlopCandidateSet,
    /// Assistant messages analyzed so far; the ordinal stamped on records.
    pub(crate) messages_processed: usize,
}

/// Sliding windows of length `n`, joined with single spaces.
fn windows(tokens: &[String], n: usize) -> impl Iterator<Item = String> + '_ {
    tokens.windows(n).map(|w| w.join(" "))
}

impl NgramIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every qualifying n-gram of `text` against the current message
    /// ordinal.
    pub fn track_occurrence(
        &mut self,
        text: &str,
        filter: &QualityFilter,
        policy: &QualityPolicy,
    ) -> TrackOutcome {
        let mut outcome = TrackOutcome::default();
        let clean = normalize::strip_markup(text);
        if clean.is_empty() {
            return outcome;
        }

        let threshold = policy.slop_threshold;
        let ordinal = self.messages_processed;

        for sentence in normalize::segment_sentences(&clean) {
            let kind = normalize::classify(&sentence);
            let original_tokens = normalize::tokenize(&sentence);
            let lemma_tokens = normalize::lemmatize_all(&original_tokens);

            for n in MIN_NGRAM_LEN..=policy.ngram_max {
                if original_tokens.len() < n {
                    break;
                }
                let pairs = original_tokens
                    .windows(n)
                    .zip(windows(&lemma_tokens, n));

                for (original_words, lemma_key) in pairs {
                    let original = original_words.join(" ");
                    if filter.is_already_covered(&original) || filter.is_low_quality(original_words) {
                        continue;
                    }

                    let mut increment = 1.0
                        + (n - MIN_NGRAM_LEN) as f64 * LENGTH_BONUS_PER_WORD
                        + filter.uncommon_count(original_words) as f64 * UNCOMMON_WORD_BONUS
                        + filter.blacklist_weight(&original);
                    if kind == SentenceKind::Narration {
                        increment *= NARRATION_MULTIPLIER;
                    }

                    let record = self
                        .records
                        .entry(lemma_key.clone())
                        .or_insert_with(|| NgramRecord {
                            original: original.clone(),
                            count: 0,
                            score: 0.0,
                            last_seen: ordinal,
                            context: sentence.clone(),
                        });
                    let previous = record.score;
                    record.count += 1;
                    record.score += increment;
                    record.last_seen = ordinal;
                    record.original = original;
                    record.context.clone_from(&sentence);
                    outcome.counted += 1;

                    if previous < threshold && record.score >= threshold {
                        trace!(key = %lemma_key, score = record.score, "threshold crossed");
                        self.candidates.add_candidate(&lemma_key);
                        outcome.crossed += 1;
                    }
                }
            }
        }
        outcome
    }

    /// Close out the current message; returns the new ordinal.
    pub fn advance_message(&mut self) -> usize {
        self.messages_processed += 1;
        self.messages_processed
    }

    pub fn messages_processed(&self) -> usize {
        self.messages_processed
    }

    pub fn get(&self, key: &str) -> Option<&NgramRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &NgramRecord)> {
        self.records.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn candidates(&self) -> &SlopCandidateSet {
        &self.candidates
    }

    /// Records scoring above 1, best first (ties by key), at most `limit`.
    pub fn ranked(&self, limit: usize) -> Vec<(&str, &NgramRecord)> {
        let mut ranked: Vec<(&str, &NgramRecord)> =
            self.records().filter(|(_, r)| r.score > 1.0).collect();
        ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Soft-reset phrases handed off to rule generation: their score drops to
    /// zero and they leave the candidate set, but counts are kept.
    pub fn reset_consumed<S: AsRef<str>>(&mut self, phrases: &[S]) -> usize {
        let mut reset = 0;
        for phrase in phrases {
            let phrase = phrase.as_ref();
            let key = self
                .records
                .iter()
                .find(|(_, r)| r.original == phrase)
                .map(|(k, _)| k.clone());
            if let Some(key) = key {
                self.candidates.remove(&key);
                if let Some(record) = self.records.get_mut(&key) {
                    record.score = 0.0;
                }
                reset += 1;
            }
        }
        reset
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.candidates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (QualityFilter, QualityPolicy) {
        let policy = QualityPolicy::default();
        (QualityFilter::new(&policy, &[]), policy)
    }

    #[test]
    fn narration_trigram_score() {
        let (filter, policy) = setup();
        let mut index = NgramIndex::new();
        index.track_occurrence("Crimson zephyr howled.", &filter, &policy);
        let record = index.get("crimson zephyr howled").unwrap();
        // 1.0 + 3 uncommon * 0.5 = 2.5, narration x1.25
        assert!((record.score - 3.125).abs() < 1e-9, "got {}", record.score);
        assert_eq!(record.count, 1);
        assert_eq!(record.context, "Crimson zephyr howled.");
    }

    #[test]
    fn dialogue_is_not_boosted() {
        let (filter, policy) = setup();
        let mut index = NgramIndex::new();
        index.track_occurrence("'Crimson zephyr howled.'", &filter, &policy);
        // the closing quote trails the terminator and is dropped with it
        let record = index.get("'crimson zephyr howled").unwrap();
        assert!((record.score - 2.5).abs() < 1e-9, "got {}", record.score);
    }

    #[test]
    fn inflections_share_a_record() {
        let (filter, policy) = setup();
        let mut index = NgramIndex::new();
        index.track_occurrence("She whispered against his ear.", &filter, &policy);
        index.advance_message();
        index.track_occurrence("She whispers against his ear.", &filter, &policy);
        let record = index.get("she whisper against").unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(record.original, "she whispers against");
        assert_eq!(record.last_seen, 1);
    }

    #[test]
    fn blacklist_weight_is_added() {
        let policy = QualityPolicy {
            blacklist: [("ozone".to_string(), 4.0)].into_iter().collect(),
            ..QualityPolicy::default()
        };
        let filter = QualityFilter::new(&policy, &[]);
        let mut index = NgramIndex::new();
        index.track_occurrence("It smelled of ozone.", &filter, &policy);
        // "it smelled of ozone" tokens: it, smelled, of, ozone -> two uncommon
        let record = index.get("it smelled of").unwrap();
        assert!((record.score - (1.0 + 0.5) * 1.25).abs() < 1e-9);
        let record = index.get("smelled of ozone").unwrap();
        assert!((record.score - (1.0 + 1.0 + 4.0) * 1.25).abs() < 1e-9);
    }

    #[test]
    fn covered_phrases_are_skipped() {
        let policy = QualityPolicy::default();
        let filter = QualityFilter::new(&policy, &["zephyr howled".to_string()]);
        let mut index = NgramIndex::new();
        index.track_occurrence("Crimson zephyr howled loudly.", &filter, &policy);
        assert!(index.get("crimson zephyr howled").is_none());
        assert!(index.get("crimson zephyr howled loudly").is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn soft_reset_by_surface_form() {
        let (filter, policy) = setup();
        let mut index = NgramIndex::new();
        index.track_occurrence("Crimson zephyr howled.", &filter, &policy);
        assert!(index.candidates().contains("crimson zephyr howled"));
        assert_eq!(index.reset_consumed(&["crimson zephyr howled"]), 1);
        let record = index.get("crimson zephyr howled").unwrap();
        assert_eq!(record.score, 0.0);
        assert_eq!(record.count, 1);
        assert!(!index.candidates().contains("crimson zephyr howled"));
    }
}
