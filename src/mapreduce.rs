//! Local data-parallel map/combine/reduce runner.
//!
//! Stages express their work as a mapper plus one reduction function used in
//! two positions: as a combiner over each map task's output (volume reduction
//! only) and as the authoritative reducer over the grouped shuffle output.
//! The `partial` flag on [`ReduceScope`] is the only difference between the
//! two — a partial reduction never tallies counters and must skip any final
//! sorting, so it stays safe to apply zero, one, or many times.
//!
//! All records sharing a key reach the authoritative reduction as one group;
//! order within a group is not guaranteed, so reductions must be
//! order-insensitive (min, concatenation, explicit final sort).

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::constants::mapreduce::MAP_TASK_SIZE;
use crate::counters::Counters;
use crate::errors::ExtractError;

/// Collector passed to mappers.
pub struct Emitter<K, V> {
    pairs: Vec<(K, V)>,
}

impl<K, V> Emitter<K, V> {
    /// A detached emitter, for exercising mappers outside a job.
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn emit(&mut self, key: K, value: V) {
        self.pairs.push((key, value));
    }

    /// Everything emitted so far, in emission order.
    pub fn into_pairs(self) -> Vec<(K, V)> {
        self.pairs
    }
}

impl<K, V> Default for Emitter<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduction context. Counter tallies are dropped for partial (combiner)
/// applications, since a combiner may run speculatively or not at all.
pub struct ReduceScope<'a> {
    partial: bool,
    counters: &'a mut Counters,
}

impl<'a> ReduceScope<'a> {
    /// Scope of an authoritative reduce, for exercising reductions outside a
    /// job.
    pub fn authoritative(counters: &'a mut Counters) -> Self {
        Self {
            partial: false,
            counters,
        }
    }

    /// Scope of a combiner pass, for exercising reductions outside a job.
    pub fn partial(counters: &'a mut Counters) -> Self {
        Self {
            partial: true,
            counters,
        }
    }

    /// True when running as a combiner; final sorts and counters must wait
    /// for the authoritative reduce.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Tally a counter. No-op during partial reduction.
    pub fn tally(&mut self, name: &str, delta: i64) {
        if !self.partial {
            self.counters.add(name, delta);
        }
    }
}

/// Result of one job: rows in ascending key order plus merged counters.
pub struct JobOutput<K, V> {
    pub rows: Vec<(K, V)>,
    pub counters: Counters,
}

/// Run one map/combine/reduce job over in-memory input records.
///
/// The reducer receives every value grouped under a key and returns the
/// values to re-emit under that same key (usually exactly one).
pub fn run_job<IK, IV, K, V, M, R>(
    input: Vec<(IK, IV)>,
    mapper: M,
    reducer: R,
) -> Result<JobOutput<K, V>, ExtractError>
where
    IK: Send,
    IV: Send,
    K: Ord + Clone + Send,
    V: Send,
    M: Fn(IK, IV, &mut Emitter<K, V>) -> Result<(), ExtractError> + Sync,
    R: Fn(&K, Vec<V>, &mut ReduceScope<'_>) -> Result<Vec<V>, ExtractError> + Sync,
{
    // Map phase, one combiner pass per task.
    let combined: Vec<Vec<(K, V)>> = input
        .into_par_iter()
        .chunks(MAP_TASK_SIZE)
        .map(|task| {
            let mut emitter = Emitter { pairs: Vec::new() };
            for (key, value) in task {
                mapper(key, value, &mut emitter)?;
            }
            combine(emitter.pairs, &reducer)
        })
        .collect::<Result<Vec<_>, ExtractError>>()?;

    // Shuffle: group all pairs by key.
    let mut groups: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for pairs in combined {
        for (key, value) in pairs {
            groups.entry(key).or_default().push(value);
        }
    }

    // Authoritative reduce, one group per key.
    let grouped: Vec<(K, Vec<V>)> = groups.into_iter().collect();
    let reduced: Vec<(Vec<(K, V)>, Counters)> = grouped
        .into_par_iter()
        .map(|(key, values)| {
            let mut counters = Counters::new();
            let mut scope = ReduceScope {
                partial: false,
                counters: &mut counters,
            };
            let outputs = reducer(&key, values, &mut scope)?;
            let rows: Vec<(K, V)> = outputs.into_iter().map(|value| (key.clone(), value)).collect();
            Ok((rows, counters))
        })
        .collect::<Result<Vec<_>, ExtractError>>()?;

    let mut rows = Vec::new();
    let mut counters = Counters::new();
    for (mut group_rows, group_counters) in reduced {
        rows.append(&mut group_rows);
        counters.merge(group_counters);
    }
    Ok(JobOutput { rows, counters })
}

/// Partial reduction of one map task's output.
fn combine<K, V, R>(pairs: Vec<(K, V)>, reducer: &R) -> Result<Vec<(K, V)>, ExtractError>
where
    K: Ord + Clone,
    R: Fn(&K, Vec<V>, &mut ReduceScope<'_>) -> Result<Vec<V>, ExtractError>,
{
    let mut groups: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for (key, value) in pairs {
        groups.entry(key).or_default().push(value);
    }

    let mut scratch = Counters::new();
    let mut combined = Vec::new();
    for (key, values) in groups {
        let mut scope = ReduceScope {
            partial: true,
            counters: &mut scratch,
        };
        for value in reducer(&key, values, &mut scope)? {
            combined.push((key.clone(), value));
        }
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_reducer(
        _key: &String,
        values: Vec<i64>,
        scope: &mut ReduceScope<'_>,
    ) -> Result<Vec<i64>, ExtractError> {
        scope.tally("groups", 1);
        Ok(vec![values.into_iter().sum()])
    }

    #[test]
    fn job_groups_sums_and_sorts_by_key() {
        let input: Vec<((), String)> = vec![
            ((), "b a b".to_string()),
            ((), "a".to_string()),
            ((), "c b".to_string()),
        ];
        let output = run_job(
            input,
            |_, line: String, emitter: &mut Emitter<String, i64>| {
                for word in line.split_whitespace() {
                    emitter.emit(word.to_string(), 1);
                }
                Ok(())
            },
            sum_reducer,
        )
        .unwrap();

        assert_eq!(
            output.rows,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 3),
                ("c".to_string(), 1)
            ]
        );
        // One tally per key group, never inflated by combiner passes.
        assert_eq!(output.counters.get("groups"), 3);
    }

    #[test]
    fn combiner_application_does_not_change_results() {
        // Feed enough records that the input spans several map tasks, so the
        // combiner runs multiple times over partial groups.
        let mut input: Vec<((), String)> = Vec::new();
        for _ in 0..(MAP_TASK_SIZE * 2 + 17) {
            input.push(((), "x y".to_string()));
        }
        let total = input.len() as i64;

        let output = run_job(
            input,
            |_, line: String, emitter: &mut Emitter<String, i64>| {
                for word in line.split_whitespace() {
                    emitter.emit(word.to_string(), 1);
                }
                Ok(())
            },
            sum_reducer,
        )
        .unwrap();

        assert_eq!(output.rows, vec![("x".to_string(), total), ("y".to_string(), total)]);
        assert_eq!(output.counters.get("groups"), 2);
    }

    #[test]
    fn mapper_errors_propagate() {
        let input: Vec<((), String)> = vec![((), "boom".to_string())];
        let result = run_job(
            input,
            |_, _line: String, _emitter: &mut Emitter<String, i64>| {
                Err(ExtractError::Configuration("boom".to_string()))
            },
            sum_reducer,
        );
        assert!(matches!(result, Err(ExtractError::Configuration(_))));
    }
}
