//! Resumable stage contract: checkpoints, completion markers, counters.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::constants::files::{COUNTERS_FILE, FINISHED_MARKER};
use crate::counters::Counters;
use crate::errors::ExtractError;

/// Persistent completion state for one stage directory.
///
/// A stage owns a directory under the working dir. While running it may write
/// anything there; on success it commits its counters and then a `finished`
/// marker. A directory without the marker is partial output and is wiped
/// before the next attempt, so a crash mid-stage never corrupts a completed
/// stage.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    dir: PathBuf,
}

impl Checkpoint {
    pub fn new(working_dir: &Path, dir_name: &str) -> Self {
        Self {
            dir: working_dir.join(dir_name),
        }
    }

    /// The stage's output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn finished_path(&self) -> PathBuf {
        self.dir.join(FINISHED_MARKER)
    }

    fn counters_path(&self) -> PathBuf {
        self.dir.join(COUNTERS_FILE)
    }

    /// Whether this stage committed successfully in a previous run.
    pub fn is_finished(&self) -> bool {
        self.finished_path().exists()
    }

    /// Commit: persist counters, then drop the completion marker. The marker
    /// is written last so a crash between the two leaves the stage unfinished.
    pub fn finish(&self, counters: &Counters) -> Result<(), ExtractError> {
        counters.save(&self.counters_path())?;
        fs::write(self.finished_path(), format!("finished {}\n", Utc::now().to_rfc3339()))?;
        Ok(())
    }

    /// Discard any partial output and recreate an empty stage directory.
    pub fn reset(&self) -> Result<(), ExtractError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Reload the counters a finished stage committed.
    pub fn load_counters(&self) -> Result<Counters, ExtractError> {
        Counters::load(&self.counters_path())
    }
}

/// A resumable unit of pipeline work.
///
/// Implementors provide `execute`; the provided `run` wraps it with the
/// checkpoint protocol: short-circuit when already finished (reloading the
/// committed counters), otherwise reset, execute, commit.
pub trait Step {
    /// Stable human-readable stage name for logs and errors.
    fn name(&self) -> &str;

    fn checkpoint(&self) -> &Checkpoint;

    /// Do the stage's work, returning its counters. Only called when the
    /// checkpoint is unfinished and the stage directory is freshly reset.
    fn execute(&mut self) -> Result<Counters, ExtractError>;

    fn run(&mut self) -> Result<Counters, ExtractError> {
        if self.checkpoint().is_finished() {
            info!(step = self.name(), "already completed, skipping");
            return self.checkpoint().load_counters();
        }
        self.checkpoint().reset()?;
        info!(step = self.name(), "starting");
        let counters = self.execute()?;
        self.checkpoint().finish(&counters)?;
        info!(step = self.name(), "finished");
        Ok(counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingStep {
        checkpoint: Checkpoint,
        executions: usize,
    }

    impl Step for CountingStep {
        fn name(&self) -> &str {
            "counting"
        }

        fn checkpoint(&self) -> &Checkpoint {
            &self.checkpoint
        }

        fn execute(&mut self) -> Result<Counters, ExtractError> {
            self.executions += 1;
            let mut counters = Counters::new();
            counters.add("records", 3);
            Ok(counters)
        }
    }

    #[test]
    fn run_commits_then_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let mut step = CountingStep {
            checkpoint: Checkpoint::new(dir.path(), "counting"),
            executions: 0,
        };

        let first = step.run().unwrap();
        assert_eq!(first.get("records"), 3);
        assert_eq!(step.executions, 1);
        assert!(step.checkpoint.is_finished());

        // Second run reloads persisted counters without executing again.
        let second = step.run().unwrap();
        assert_eq!(second.get("records"), 3);
        assert_eq!(step.executions, 1);
    }

    #[test]
    fn partial_output_is_wiped_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path(), "counting");
        checkpoint.reset().unwrap();
        fs::write(checkpoint.dir().join("part-00000"), "partial").unwrap();

        let mut step = CountingStep {
            checkpoint,
            executions: 0,
        };
        step.run().unwrap();
        assert_eq!(step.executions, 1);
        assert!(!step.checkpoint.dir().join("part-00000").exists());
    }

    #[test]
    fn reset_clears_finished_marker() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path(), "stage");
        checkpoint.reset().unwrap();
        checkpoint.finish(&Counters::new()).unwrap();
        assert!(checkpoint.is_finished());

        checkpoint.reset().unwrap();
        assert!(!checkpoint.is_finished());
    }
}
