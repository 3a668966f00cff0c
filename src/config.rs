use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{Result, ScanError};

/// Shortest n-gram the engine ever indexes. Not configurable.
pub const MIN_NGRAM_LEN: usize = 3;

pub const DEFAULT_NGRAM_MAX: usize = 10;
pub const DEFAULT_SLOP_THRESHOLD: f64 = 3.0;
pub const DEFAULT_PRUNING_CYCLE: usize = 20;
pub const DEFAULT_PATTERN_MIN_COMMON: usize = 3;

pub const BLACKLIST_WEIGHT_MIN: f64 = 1.0;
pub const BLACKLIST_WEIGHT_MAX: f64 = 10.0;

/// Scan settings, deserialized from the host's camelCase settings object.
///
/// Every field has a default, and `null`, zero or non-finite numbers are
/// treated as missing; call [`QualityPolicy::normalized`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityPolicy {
    #[serde(deserialize_with = "null_as_default")]
    pub ngram_max: usize,
    #[serde(deserialize_with = "null_as_default")]
    pub slop_threshold: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pruning_cycle: usize,
    #[serde(deserialize_with = "null_as_default")]
    pub pattern_min_common: usize,
    #[serde(deserialize_with = "null_as_default")]
    pub whitelist: Vec<String>,
    /// Term to extra score per occurrence. Weights are clamped to 1..=10.
    #[serde(deserialize_with = "lenient_weights")]
    pub blacklist: HashMap<String, f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub skip_triage_check: bool,
}

/// `null` reads as the empty or zero value, which `normalized` then replaces.
fn null_as_default<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Weights are read as plain numbers so out-of-range values reach the clamp.
/// A `null` weight counts as the minimum.
fn lenient_weights<'de, D>(de: D) -> std::result::Result<HashMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<f64>>> = Option::deserialize(de)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(term, weight)| (term, weight.unwrap_or(BLACKLIST_WEIGHT_MIN)))
        .collect())
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            ngram_max: DEFAULT_NGRAM_MAX,
            slop_threshold: DEFAULT_SLOP_THRESHOLD,
            pruning_cycle: DEFAULT_PRUNING_CYCLE,
            pattern_min_common: DEFAULT_PATTERN_MIN_COMMON,
            whitelist: Vec::new(),
            blacklist: HashMap::new(),
            skip_triage_check: false,
        }
    }
}

impl QualityPolicy {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let policy: Self = serde_json::from_str(raw)?;
        Ok(policy.normalized())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Replace unusable values with defaults, clamp `ngram_max` to the
    /// structural floor and blacklist weights to 1..=10, and lowercase the
    /// word lists.
    pub fn normalized(mut self) -> Self {
        if self.ngram_max == 0 {
            self.ngram_max = DEFAULT_NGRAM_MAX;
        }
        if self.ngram_max < MIN_NGRAM_LEN {
            warn!(ngram_max = self.ngram_max, "ngramMax below minimum, clamping to {MIN_NGRAM_LEN}");
            self.ngram_max = MIN_NGRAM_LEN;
        }
        if !self.slop_threshold.is_finite() || self.slop_threshold <= 0.0 {
            self.slop_threshold = DEFAULT_SLOP_THRESHOLD;
        }
        if self.pruning_cycle == 0 {
            self.pruning_cycle = DEFAULT_PRUNING_CYCLE;
        }
        if self.pattern_min_common == 0 {
            self.pattern_min_common = DEFAULT_PATTERN_MIN_COMMON;
        }

        self.whitelist = self
            .whitelist
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        self.blacklist = self
            .blacklist
            .into_iter()
            .filter_map(|(term, weight)| {
                let term = term.trim().to_lowercase();
                if term.is_empty() {
                    return None;
                }
                let weight = if weight.is_finite() {
                    weight.clamp(BLACKLIST_WEIGHT_MIN, BLACKLIST_WEIGHT_MAX)
                } else {
                    BLACKLIST_WEIGHT_MIN
                };
                Some((term, weight))
            })
            .collect();

        self
    }
}
