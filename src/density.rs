/// Record density normalization
///
/// Turns raw per-cell record counts into a relative frequency (`rn`) and a
/// log-scaled relative frequency (`ln`) so cells can be shaded on a common
/// 0..1 scale regardless of how many records the query matched.

use std::collections::HashMap;
use std::hash::Hash;

use h3o::CellIndex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{PROP_COUNT, PROP_LOG_RELATIVE, PROP_RELATIVE};
use crate::features::CellProperties;

/// Normalized record count for one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordCountEntry {
    /// Raw record count
    pub n: u64,
    /// count / total
    pub rn: f64,
    /// ln(count) / ln(total)
    pub ln: f64,
}

impl RecordCountEntry {
    /// GeoJSON property payload for this entry
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert(PROP_COUNT.to_owned(), Value::from(self.n));
        props.insert(PROP_RELATIVE.to_owned(), Value::from(self.rn));
        props.insert(PROP_LOG_RELATIVE.to_owned(), Value::from(self.ln));
        props
    }
}

/// Normalize raw counts against their total.
///
/// A zero total gives every entry `rn = ln = 0`. `ln` is also 0 for a zero
/// count and when `ln(total)` is 0 (a single record overall).
pub fn normalize<K>(raw_counts: &HashMap<K, u64>) -> HashMap<K, RecordCountEntry>
where
    K: Eq + Hash + Clone,
{
    let total: u64 = raw_counts.values().sum();
    let log_total = (total as f64).ln();

    raw_counts
        .iter()
        .map(|(key, &n)| {
            let entry = if total == 0 {
                RecordCountEntry { n, rn: 0.0, ln: 0.0 }
            } else {
                let ln = if n > 0 && log_total != 0.0 {
                    (n as f64).ln() / log_total
                } else {
                    0.0
                };
                RecordCountEntry {
                    n,
                    rn: n as f64 / total as f64,
                    ln,
                }
            };
            (key.clone(), entry)
        })
        .collect()
}

/// Property payloads for a map of normalized cell counts
pub fn density_properties(counts: &HashMap<CellIndex, RecordCountEntry>) -> CellProperties {
    counts
        .iter()
        .map(|(cell, entry)| (*cell, entry.to_properties()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(pairs: &[(&'static str, u64)]) -> HashMap<&'static str, u64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty() {
        assert!(normalize(&counts(&[])).is_empty());
    }

    #[test]
    fn test_zero_total() {
        let out = normalize(&counts(&[("a", 0)]));
        assert_eq!(out["a"], RecordCountEntry { n: 0, rn: 0.0, ln: 0.0 });
    }

    #[test]
    fn test_equal_counts() {
        let out = normalize(&counts(&[("a", 5), ("b", 5)]));
        assert_relative_eq!(out["a"].rn, 0.5);
        assert_relative_eq!(out["b"].rn, 0.5);
        assert_relative_eq!(out["a"].ln, out["b"].ln);
        assert_relative_eq!(out["a"].ln, 5f64.ln() / 10f64.ln());
    }

    #[test]
    fn test_single_record_total() {
        let out = normalize(&counts(&[("a", 1), ("b", 0)]));
        assert_eq!(out["a"], RecordCountEntry { n: 1, rn: 1.0, ln: 0.0 });
        assert_eq!(out["b"], RecordCountEntry { n: 0, rn: 0.0, ln: 0.0 });
    }

    #[test]
    fn test_relative_sums_to_one() {
        let out = normalize(&counts(&[("a", 3), ("b", 17), ("c", 0), ("d", 980)]));
        let sum: f64 = out.values().map(|e| e.rn).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        assert_relative_eq!(out["d"].rn, 0.98);
        assert_eq!(out["c"].ln, 0.0);
        assert!(out.values().all(|e| (0.0..=1.0).contains(&e.ln)));
    }

    #[test]
    fn test_property_payload() {
        let entry = RecordCountEntry { n: 4, rn: 0.25, ln: 0.5 };
        let props = entry.to_properties();
        assert_eq!(props[PROP_COUNT], 4);
        assert_eq!(props[PROP_RELATIVE], 0.25);
        assert_eq!(props[PROP_LOG_RELATIVE], 0.5);
    }
}
