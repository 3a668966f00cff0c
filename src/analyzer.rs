//! One scan session: the policy, the compiled quality filter and a private
//! index. The live host and the batch worker both drive this same type.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::QualityPolicy;
use crate::index::{NgramIndex, TrackOutcome};
use crate::merge::{self, AnalysisSnapshot};
use crate::prune;
use crate::quality::QualityFilter;
use crate::runner::BatchResult;

/// Upper bound on index records fed to pattern merging.
pub const CANDIDATE_LIMIT_FOR_ANALYSIS: usize = 2000;

/// Upper bound on candidates handed to rule generation at once.
pub const RULE_CANDIDATE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: Author,
    #[serde(default)]
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            author: Author::Assistant,
            text: text.into(),
        }
    }

    /// Only non-empty assistant text is analyzed.
    pub fn is_analyzable(&self) -> bool {
        self.author == Author::Assistant && !self.text.trim().is_empty()
    }
}

/// One raw index record, as shown on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub phrase: String,
    pub score: f64,
    pub count: u64,
    pub last_seen: usize,
    pub context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    #[serde(flatten)]
    pub snapshot: AnalysisSnapshot,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCandidate {
    pub candidate: String,
    pub enhanced_context: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateBatch {
    pub candidates: Vec<RuleCandidate>,
    /// The rule generator should pre-screen these before use.
    pub needs_triage: bool,
}

#[derive(Debug, Clone)]
pub struct Analyzer {
    policy: QualityPolicy,
    covered_patterns: Vec<String>,
    filter: QualityFilter,
    index: NgramIndex,
    snapshot: AnalysisSnapshot,
}

impl Analyzer {
    pub fn new(policy: QualityPolicy, covered_patterns: Vec<String>) -> Self {
        let policy = policy.normalized();
        let filter = QualityFilter::new(&policy, &covered_patterns);
        Self {
            policy,
            covered_patterns,
            filter,
            index: NgramIndex::new(),
            snapshot: AnalysisSnapshot::default(),
        }
    }

    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    pub fn covered_patterns(&self) -> &[String] {
        &self.covered_patterns
    }

    pub fn index(&self) -> &NgramIndex {
        &self.index
    }

    pub fn snapshot(&self) -> &AnalysisSnapshot {
        &self.snapshot
    }

    pub fn into_index(self) -> NgramIndex {
        self.index
    }

    /// Replace the active fix-rule sources, e.g. after new rules compile.
    pub fn set_covered_patterns(&mut self, covered_patterns: Vec<String>) {
        self.filter = QualityFilter::new(&self.policy, &covered_patterns);
        self.covered_patterns = covered_patterns;
    }

    /// Feed one chat message. User and empty messages are skipped and do not
    /// advance the message ordinal; `None` is returned for them.
    ///
    /// After every `pruning_cycle`-th analyzed message the stale-record sweep
    /// runs.
    pub fn observe(&mut self, message: &ChatMessage) -> Option<TrackOutcome> {
        if !message.is_analyzable() {
            return None;
        }
        let outcome = self
            .index
            .track_occurrence(&message.text, &self.filter, &self.policy);
        let processed = self.index.advance_message();
        if prune::decay_due(processed, &self.policy) {
            prune::decay_stale(&mut self.index, &self.policy);
        }
        Some(outcome)
    }

    /// Aggressive memory bound for long replays; see [`prune::compact`].
    pub fn compact(&mut self) -> prune::PruneReport {
        prune::compact(&mut self.index)
    }

    /// Rebuild the merged/remaining view from the current index.
    pub fn refresh_snapshot(&mut self) -> &AnalysisSnapshot {
        let ranked: Vec<(String, f64)> = self
            .index
            .ranked(CANDIDATE_LIMIT_FOR_ANALYSIS)
            .into_iter()
            .map(|(_, record)| (record.original.clone(), record.score))
            .collect();
        let over_limit = self.index.records().filter(|(_, r)| r.score > 1.0).count();
        if over_limit > CANDIDATE_LIMIT_FOR_ANALYSIS {
            debug!(
                total = over_limit,
                limit = CANDIDATE_LIMIT_FOR_ANALYSIS,
                "limited candidates before pattern merging"
            );
        }
        self.snapshot = merge::merge_patterns(&ranked, self.policy.pattern_min_common);
        &self.snapshot
    }

    /// Raw index entries with a positive score, best first.
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .index
            .records()
            .filter(|(_, r)| r.score > 0.0)
            .map(|(_, r)| LeaderboardEntry {
                phrase: r.original.clone(),
                score: r.score,
                count: r.count,
                last_seen: r.last_seen,
                context: r.context.clone(),
            })
            .collect();
        entries.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.phrase.cmp(&b.phrase)));
        entries
    }

    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard {
            snapshot: self.snapshot.clone(),
            entries: self.entries(),
        }
    }

    /// Merged patterns and remaining phrases, best first, ready for the
    /// external rule generator. Patterns are their own context; phrases carry
    /// the last sentence they were seen in.
    pub fn rule_candidates(&mut self) -> CandidateBatch {
        self.refresh_snapshot();

        let mut candidates: Vec<RuleCandidate> = self
            .snapshot
            .merged
            .iter()
            .map(|(pattern, score)| RuleCandidate {
                candidate: pattern.clone(),
                enhanced_context: pattern.clone(),
                score: *score,
            })
            .collect();

        for (phrase, score) in &self.snapshot.remaining {
            let context = self
                .index
                .records()
                .find(|(_, r)| &r.original == phrase)
                .map(|(_, r)| r.context.clone())
                .unwrap_or_else(|| phrase.clone());
            candidates.push(RuleCandidate {
                candidate: phrase.clone(),
                enhanced_context: context,
                score: *score,
            });
        }

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.candidate.cmp(&b.candidate))
        });
        candidates.truncate(RULE_CANDIDATE_LIMIT);

        CandidateBatch {
            candidates,
            needs_triage: !self.policy.skip_triage_check,
        }
    }

    /// Mark phrases as handled by rule generation and refresh the view.
    pub fn consume<S: AsRef<str>>(&mut self, phrases: &[S]) -> usize {
        let reset = self.index.reset_consumed(phrases);
        if reset > 0 {
            debug!(reset, "soft-reset consumed candidates");
        }
        self.refresh_snapshot();
        reset
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.snapshot = AnalysisSnapshot::default();
    }

    /// Adopt a finished batch replay in one step.
    pub fn commit(&mut self, result: BatchResult) {
        info!(
            records = result.final_index.len(),
            messages = result.messages_analyzed,
            "committing batch analysis"
        );
        self.index = result.final_index;
        self.snapshot = result.leaderboard;
    }
}
