//! Streaming slop detection for AI-generated prose.
//!
//! Assistant messages are normalized, cut into sentences and sliding n-grams,
//! filtered, and counted in an [`NgramIndex`] keyed by lemmatized phrase.
//! Phrases whose score crosses the slop threshold are promoted into a
//! substring-minimal [`SlopCandidateSet`]; stale records decay or are evicted;
//! on demand the index is ranked and generalized into `prefix a/b/c` patterns.
//!
//! [`Analyzer`] is the session type. Feed it live with [`Analyzer::observe`],
//! or rebuild from a whole history in the background with
//! [`runner::spawn_batch`] and adopt the result with [`Analyzer::commit`].

pub mod analyzer;
pub mod candidates;
pub mod config;
pub mod error;
pub mod index;
pub mod lexicon;
pub mod merge;
pub mod normalize;
pub mod prune;
pub mod quality;
pub mod runner;

pub use analyzer::{
    Analyzer, Author, CandidateBatch, ChatMessage, Leaderboard, LeaderboardEntry, RuleCandidate,
};
pub use candidates::SlopCandidateSet;
pub use config::QualityPolicy;
pub use error::ScanError;
pub use index::{NgramIndex, NgramRecord};
pub use merge::{AnalysisSnapshot, MergedPattern};
pub use runner::{BatchEvent, BatchJob, BatchRequest, BatchResult};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Replay `messages` synchronously and return the resulting leaderboard.
pub fn scan_history(
    messages: &[ChatMessage],
    policy: QualityPolicy,
    covered_patterns: Vec<String>,
) -> Leaderboard {
    let mut analyzer = Analyzer::new(policy, covered_patterns);
    for message in messages {
        analyzer.observe(message);
    }
    analyzer.refresh_snapshot();
    analyzer.leaderboard()
}
