//! Leaderboard generalization: drop phrases contained in longer ones, then
//! fold phrases sharing a leading word sequence into `prefix a/b/c` patterns.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct MergedPattern {
    pub prefix: Vec<String>,
    /// Distinct trailing word runs, in input rank order.
    pub alternatives: Vec<String>,
    pub score: f64,
}

impl MergedPattern {
    pub fn text(&self) -> String {
        let prefix = self.prefix.join(" ");
        if self.alternatives.is_empty() {
            prefix
        } else {
            format!("{prefix} {}", self.alternatives.join("/"))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub patterns: Vec<MergedPattern>,
    /// Unabsorbed phrases, in input rank order.
    pub remaining: Vec<(String, f64)>,
}

/// Recomputed leaderboard view. Never authoritative; rebuild it from the
/// index whenever it is needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub merged: BTreeMap<String, f64>,
    pub remaining: BTreeMap<String, f64>,
}

impl AnalysisSnapshot {
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty() && self.remaining.is_empty()
    }
}

impl From<MergeOutcome> for AnalysisSnapshot {
    fn from(outcome: MergeOutcome) -> Self {
        let mut snapshot = AnalysisSnapshot::default();
        for pattern in outcome.patterns {
            *snapshot.merged.entry(pattern.text()).or_insert(0.0) += pattern.score;
        }
        for (phrase, score) in outcome.remaining {
            *snapshot.remaining.entry(phrase).or_insert(0.0) += score;
        }
        snapshot
    }
}

/// Sum scores of repeated phrases, keeping first-seen order.
fn aggregate(ranked: &[(String, f64)]) -> Vec<(String, f64)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<(String, f64)> = Vec::new();
    for (phrase, score) in ranked {
        match positions.get(phrase.as_str()) {
            Some(&i) => out[i].1 += score,
            None => {
                positions.insert(phrase, out.len());
                out.push((phrase.clone(), *score));
            }
        }
    }
    out
}

/// Drop every phrase that is a literal substring of a longer phrase. The
/// dropped score is discarded, not transferred. Survivors keep input order.
pub fn cull_substrings(phrases: &[(String, f64)]) -> Vec<(String, f64)> {
    let mut by_length: Vec<usize> = (0..phrases.len()).collect();
    by_length.sort_by_key(|&i| std::cmp::Reverse(phrases[i].0.chars().count()));

    let mut removed: HashSet<usize> = HashSet::new();
    for (pos, &longer) in by_length.iter().enumerate() {
        if removed.contains(&longer) {
            continue;
        }
        for &shorter in &by_length[pos + 1..] {
            if !removed.contains(&shorter) && phrases[longer].0.contains(phrases[shorter].0.as_str()) {
                removed.insert(shorter);
            }
        }
    }

    phrases
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, entry)| entry.clone())
        .collect()
}

fn common_prefix_len(a: &[&str], b: &[&str]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Cull, cluster by shared leading words and synthesize patterns.
///
/// `ranked` is the best-first leaderboard input. Clustering scans phrases in
/// lexicographic order; each unconsumed anchor collects later phrases sharing
/// at least `min_common` leading words with it. The group prefix is then
/// narrowed to what all members share, and the group only becomes a pattern
/// if that still spans `min_common` words.
pub fn find_patterns(ranked: &[(String, f64)], min_common: usize) -> MergeOutcome {
    let culled = cull_substrings(&aggregate(ranked));

    let mut order: Vec<usize> = (0..culled.len()).collect();
    order.sort_by(|&a, &b| culled[a].0.cmp(&culled[b].0));
    let words: Vec<Vec<&str>> = culled.iter().map(|(p, _)| p.split(' ').collect()).collect();

    let mut consumed: HashSet<usize> = HashSet::new();
    let mut patterns: Vec<MergedPattern> = Vec::new();

    for (pos, &anchor) in order.iter().enumerate() {
        if consumed.contains(&anchor) {
            continue;
        }
        let mut group = vec![anchor];
        for &other in &order[pos + 1..] {
            if consumed.contains(&other) {
                continue;
            }
            if common_prefix_len(&words[anchor], &words[other]) >= min_common {
                group.push(other);
            }
        }
        if group.len() < 2 {
            continue;
        }

        let prefix_len = group[1..]
            .iter()
            .fold(words[anchor].len(), |len, &member| {
                len.min(common_prefix_len(&words[anchor][..len], &words[member]))
            });
        let prefix: Vec<String> = words[anchor][..prefix_len]
            .iter()
            .map(|w| w.to_string())
            .collect();
        if prefix.iter().filter(|w| !w.is_empty()).count() < min_common {
            continue;
        }

        // culled indices are input rank positions
        group.sort_unstable();
        let mut alternatives: Vec<String> = Vec::new();
        let mut score = 0.0;
        for &member in &group {
            consumed.insert(member);
            score += culled[member].1;
            let tail = words[member][prefix_len..].join(" ");
            let tail = tail.trim();
            if !tail.is_empty() && !alternatives.iter().any(|a| a == tail) {
                alternatives.push(tail.to_string());
            }
        }

        patterns.push(MergedPattern {
            prefix,
            alternatives,
            score,
        });
    }

    let texts: Vec<String> = patterns.iter().map(MergedPattern::text).collect();
    let remaining = culled
        .iter()
        .enumerate()
        .filter(|(i, _)| !consumed.contains(i))
        .filter(|(_, (phrase, _))| {
            let spaced = format!("{phrase} ");
            !texts.iter().any(|t| t == phrase || t.starts_with(&spaced))
        })
        .map(|(_, entry)| entry.clone())
        .collect();

    MergeOutcome {
        patterns,
        remaining,
    }
}

pub fn merge_patterns(ranked: &[(String, f64)], min_common: usize) -> AnalysisSnapshot {
    find_patterns(ranked, min_common).into()
}
