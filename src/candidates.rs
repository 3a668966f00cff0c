use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Promoted phrases, kept substring-minimal: no member is a token-level
/// substring of another member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlopCandidateSet {
    members: BTreeSet<String>,
}

/// Whether `needle` occurs in `haystack` as a run of whole tokens.
pub fn contains_tokens(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

impl SlopCandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` unless a longer member already covers it. Members covered
    /// by `key` are dropped. Returns whether `key` was inserted.
    pub fn add_candidate(&mut self, key: &str) -> bool {
        if self.members.iter().any(|m| contains_tokens(m, key)) {
            return false;
        }
        self.members.retain(|m| !contains_tokens(key, m));
        self.members.insert(key.to_string())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.members.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
