//! Invert ranked label senses into a page → primary-labels mapping.
//!
//! A label's primary sense is its rank-0 entry, already settled by the label
//! senses step. A page may be primary for zero, one, or many labels.

use std::path::{Path, PathBuf};

use crate::constants::stages::{LABEL_SENSES_DIR, PRIMARY_LABELS_DIR};
use crate::counters::Counters;
use crate::errors::ExtractError;
use crate::mapreduce::{Emitter, ReduceScope, run_job};
use crate::model::{LabelSenseList, PrimaryLabels};
use crate::records;
use crate::step::{Checkpoint, Step};
use crate::types::{LabelText, PageId};

pub struct PrimaryLabelStep {
    checkpoint: Checkpoint,
    working_dir: PathBuf,
}

impl PrimaryLabelStep {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            checkpoint: Checkpoint::new(working_dir, PRIMARY_LABELS_DIR),
            working_dir: working_dir.to_path_buf(),
        }
    }
}

impl Step for PrimaryLabelStep {
    fn name(&self) -> &str {
        "primary labels"
    }

    fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    fn execute(&mut self) -> Result<Counters, ExtractError> {
        let input: Vec<(LabelText, LabelSenseList)> =
            records::read_all_parts(LABEL_SENSES_DIR, &self.working_dir.join(LABEL_SENSES_DIR))?;

        let output = run_job(
            input,
            |label: LabelText, list: LabelSenseList, emitter: &mut Emitter<PageId, PrimaryLabels>| {
                if let Some(first) = list.senses.first() {
                    emitter.emit(first.id, PrimaryLabels { labels: vec![label] });
                }
                Ok(())
            },
            collect_labels,
        )?;

        records::write_part(self.checkpoint.dir(), &output.rows)?;
        Ok(output.counters)
    }
}

/// Concatenate the labels a page is primary for. Safe as combiner and
/// reducer alike.
fn collect_labels(
    _id: &PageId,
    partials: Vec<PrimaryLabels>,
    _scope: &mut ReduceScope<'_>,
) -> Result<Vec<PrimaryLabels>, ExtractError> {
    let mut labels = Vec::new();
    for partial in partials {
        labels.extend(partial.labels);
    }
    Ok(vec![PrimaryLabels { labels }])
}
