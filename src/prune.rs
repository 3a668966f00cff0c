//! Memory bounds for the index: passive staleness decay during live
//! operation and coarse compaction for long batch replays.

use tracing::{debug, info};

use crate::config::QualityPolicy;
use crate::index::NgramIndex;

const DECAY_FACTOR: f64 = 0.9;
const COMPACT_MAX_SCORE: f64 = 2.0;
const COMPACT_MAX_COUNT: u64 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: usize,
    pub decayed: usize,
}

/// Whether the passive sweep is due after `messages_processed` messages.
pub fn decay_due(messages_processed: usize, policy: &QualityPolicy) -> bool {
    policy.pruning_cycle > 0
        && messages_processed > 0
        && messages_processed % policy.pruning_cycle == 0
}

/// Handle records unseen for more than one pruning cycle: weak ones are
/// deleted, strong ones lose 10% of their score and stay.
pub fn decay_stale(index: &mut NgramIndex, policy: &QualityPolicy) -> PruneReport {
    let now = index.messages_processed;
    let mut report = PruneReport::default();
    let mut removed_keys = Vec::new();

    index.records.retain(|key, record| {
        if now.saturating_sub(record.last_seen) <= policy.pruning_cycle {
            return true;
        }
        if record.score < policy.slop_threshold {
            removed_keys.push(key.clone());
            false
        } else {
            record.score *= DECAY_FACTOR;
            report.decayed += 1;
            true
        }
    });

    for key in &removed_keys {
        index.candidates.remove(key);
    }
    report.removed = removed_keys.len();

    if report.removed > 0 {
        info!(removed = report.removed, decayed = report.decayed, "pruned stale n-grams");
    } else if report.decayed > 0 {
        debug!(decayed = report.decayed, "decayed stale n-grams");
    }
    report
}

/// Drop every record seen once with a score under 2.
pub fn compact(index: &mut NgramIndex) -> PruneReport {
    let mut removed_keys = Vec::new();
    index.records.retain(|key, record| {
        let weak = record.score < COMPACT_MAX_SCORE && record.count < COMPACT_MAX_COUNT;
        if weak {
            removed_keys.push(key.clone());
        }
        !weak
    });
    for key in &removed_keys {
        index.candidates.remove(key);
    }
    if !removed_keys.is_empty() {
        debug!(removed = removed_keys.len(), "compacted low-score n-grams");
    }
    PruneReport {
        removed: removed_keys.len(),
        decayed: 0,
    }
}
