//! Named integer counters returned by stages and persisted with checkpoints.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::errors::ExtractError;
use crate::types::CounterName;

/// Map of counter name → value. Stages return one of these from execution;
/// the orchestrator reads convergence predicates from it, and checkpoints
/// persist it as an enumerated list of (name, i64) pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    values: BTreeMap<CounterName, i64>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to counter `name`, creating it at zero when absent.
    pub fn add(&mut self, name: &str, delta: i64) {
        *self.values.entry(name.to_string()).or_insert(0) += delta;
    }

    /// Current value of `name`, zero when never tallied.
    pub fn get(&self, name: &str) -> i64 {
        self.values.get(name).copied().unwrap_or(0)
    }

    /// Fold another counter map into this one.
    pub fn merge(&mut self, other: Counters) {
        for (name, value) in other.values {
            *self.values.entry(name).or_insert(0) += value;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Persist as one `name<TAB>value` line per counter.
    pub fn save(&self, path: &Path) -> Result<(), ExtractError> {
        let mut body = String::new();
        for (name, value) in &self.values {
            body.push_str(name);
            body.push('\t');
            body.push_str(&value.to_string());
            body.push('\n');
        }
        fs::write(path, body)?;
        Ok(())
    }

    /// Reload a counter map persisted by [`Counters::save`].
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let body = fs::read_to_string(path)?;
        let mut values = BTreeMap::new();
        for line in body.lines() {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line.split_once('\t').ok_or_else(|| {
                ExtractError::Checkpoint(format!("malformed counter line '{line}' in {}", path.display()))
            })?;
            let value: i64 = value.parse().map_err(|_| {
                ExtractError::Checkpoint(format!("malformed counter value '{value}' in {}", path.display()))
            })?;
            values.insert(name.to_string(), value);
        }
        Ok(Self { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_get_and_merge() {
        let mut counters = Counters::new();
        counters.add("unforwarded", 2);
        counters.add("unforwarded", 3);
        assert_eq!(counters.get("unforwarded"), 5);
        assert_eq!(counters.get("missing"), 0);

        let mut other = Counters::new();
        other.add("unforwarded", 1);
        other.add("with_depth", 7);
        counters.merge(other);
        assert_eq!(counters.get("unforwarded"), 6);
        assert_eq!(counters.get("with_depth"), 7);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters");

        let mut counters = Counters::new();
        counters.add("ambiguous", 12);
        counters.add("unambiguous", 40);
        counters.save(&path).unwrap();

        let reloaded = Counters::load(&path).unwrap();
        assert_eq!(reloaded, counters);
    }

    #[test]
    fn load_rejects_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters");
        fs::write(&path, "no_tab_here\n").unwrap();
        assert!(matches!(Counters::load(&path), Err(ExtractError::Checkpoint(_))));
    }
}
