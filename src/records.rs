//! Keyed part-file IO shared by all stages.
//!
//! A stage's result is a `part-*` file of JSON lines, each line a `[key,
//! value]` pair, sorted ascending by key. Stages written by this crate commit
//! exactly one partition; externally produced inputs may carry several.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::constants::files::{PART_FILE, PART_PREFIX};
use crate::errors::ExtractError;

/// Write `rows` (already sorted by key) as the stage's single partition.
pub fn write_part<K, V>(dir: &Path, rows: &[(K, V)]) -> Result<PathBuf, ExtractError>
where
    K: Serialize,
    V: Serialize,
{
    fs::create_dir_all(dir)?;
    let path = dir.join(PART_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(path)
}

/// Streaming reader over one part file.
pub struct PartReader<K, V> {
    lines: Lines<BufReader<File>>,
    _marker: PhantomData<(K, V)>,
}

impl<K, V> PartReader<K, V>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            _marker: PhantomData,
        })
    }
}

impl<K, V> Iterator for PartReader<K, V>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    type Item = Result<(K, V), ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Err(err) => return Some(Err(err.into())),
                Ok(line) if line.is_empty() => continue,
                Ok(line) => {
                    return Some(serde_json::from_str::<(K, V)>(&line).map_err(ExtractError::from));
                }
            }
        }
    }
}

/// All part files in a stage directory, in name order.
fn part_paths(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(PART_PREFIX) {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read every partition of a stage directory into memory, preserving
/// per-partition key order across file-name order.
pub fn read_all_parts<K, V>(step: &str, dir: &Path) -> Result<Vec<(K, V)>, ExtractError>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
{
    let paths = part_paths(dir).map_err(|err| match err {
        ExtractError::Io(io) => ExtractError::MissingDependency {
            step: step.to_string(),
            detail: format!("cannot list {}: {io}", dir.display()),
        },
        other => other,
    })?;
    if paths.is_empty() {
        return Err(ExtractError::MissingDependency {
            step: step.to_string(),
            detail: format!("no part files in {}", dir.display()),
        });
    }
    let mut rows = Vec::new();
    for path in paths {
        for row in PartReader::open(&path)? {
            rows.push(row?);
        }
    }
    Ok(rows)
}

/// Path of a stage's sole result partition. The final merge depends on each
/// upstream stage having committed exactly one sorted partition; anything
/// else is fatal.
pub fn main_part_path(step: &str, dir: &Path) -> Result<PathBuf, ExtractError> {
    let mut paths = part_paths(dir).map_err(|err| match err {
        ExtractError::Io(io) => ExtractError::MissingDependency {
            step: step.to_string(),
            detail: format!("cannot list {}: {io}", dir.display()),
        },
        other => other,
    })?;
    match paths.len() {
        0 => Err(ExtractError::MissingDependency {
            step: step.to_string(),
            detail: format!("no part files in {}", dir.display()),
        }),
        1 => Ok(paths.remove(0)),
        parts => Err(ExtractError::AmbiguousOutput {
            step: step.to_string(),
            parts,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![(1i64, "alpha".to_string()), (2, "beta".to_string())];
        let path = write_part(dir.path(), &rows).unwrap();

        let reader: PartReader<i64, String> = PartReader::open(&path).unwrap();
        let reloaded: Vec<(i64, String)> = reader.map(|row| row.unwrap()).collect();
        assert_eq!(reloaded, rows);
    }

    #[test]
    fn main_part_path_requires_exactly_one_partition() {
        let dir = tempfile::tempdir().unwrap();

        let missing = main_part_path("pageDepth_0", dir.path());
        assert!(matches!(missing, Err(ExtractError::MissingDependency { .. })));

        fs::write(dir.path().join("part-00000"), "").unwrap();
        assert!(main_part_path("pageDepth_0", dir.path()).is_ok());

        fs::write(dir.path().join("part-00001"), "").unwrap();
        let ambiguous = main_part_path("pageDepth_0", dir.path());
        assert!(matches!(ambiguous, Err(ExtractError::AmbiguousOutput { parts: 2, .. })));
    }

    #[test]
    fn read_all_parts_concatenates_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("part-00001"), "[2,\"b\"]\n").unwrap();
        fs::write(dir.path().join("part-00000"), "[1,\"a\"]\n").unwrap();

        let rows: Vec<(i64, String)> = read_all_parts("pageSummary", dir.path()).unwrap();
        assert_eq!(rows, vec![(1, "a".to_string()), (2, "b".to_string())]);
    }
}
