//! Repartition pages from their (namespace, title) key to a page-id key.
//!
//! The external summary extraction keys pages by `PageKey` and leaves
//! namespace and title out of the value (repeating them would be wasteful).
//! Every downstream stage wants pages by id, so this step injects both fields
//! into the value and re-sorts. Pure repartition plus projection, no business
//! logic.

use std::path::{Path, PathBuf};

use crate::constants::stages::{PAGE_SUMMARY_DIR, SORTED_PAGES_DIR};
use crate::counters::Counters;
use crate::errors::ExtractError;
use crate::mapreduce::{Emitter, ReduceScope, run_job};
use crate::model::{PageDetail, PageKey};
use crate::records;
use crate::step::{Checkpoint, Step};
use crate::types::PageId;

pub struct PageSortingStep {
    checkpoint: Checkpoint,
    working_dir: PathBuf,
}

impl PageSortingStep {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            checkpoint: Checkpoint::new(working_dir, SORTED_PAGES_DIR),
            working_dir: working_dir.to_path_buf(),
        }
    }
}

impl Step for PageSortingStep {
    fn name(&self) -> &str {
        "page sorting"
    }

    fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    fn execute(&mut self) -> Result<Counters, ExtractError> {
        let input: Vec<(PageKey, PageDetail)> =
            records::read_all_parts(PAGE_SUMMARY_DIR, &self.working_dir.join(PAGE_SUMMARY_DIR))?;

        let output = run_job(
            input,
            |key: PageKey, mut page: PageDetail, emitter: &mut Emitter<PageId, PageDetail>| {
                page.namespace = key.namespace;
                page.title = key.title;
                emitter.emit(page.id, page);
                Ok(())
            },
            // Ids are unique, but forward every value rather than asserting it.
            |_id, pages, _scope: &mut ReduceScope<'_>| Ok(pages),
        )?;

        records::write_part(self.checkpoint.dir(), &output.rows)?;
        Ok(output.counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Namespace;
    use crate::records::PartReader;

    fn keyed_page(id: PageId, namespace: Namespace, title: &str) -> (PageKey, PageDetail) {
        let key = PageKey {
            namespace,
            title: title.to_string(),
        };
        (key, PageDetail::new(id))
    }

    #[test]
    fn resorts_by_id_and_injects_key_fields() {
        let dir = tempfile::tempdir().unwrap();
        let input = vec![
            keyed_page(30, Namespace::Category, "Science"),
            keyed_page(10, Namespace::Main, "Physics"),
            keyed_page(20, Namespace::Main, "Chemistry"),
        ];
        records::write_part(&dir.path().join(PAGE_SUMMARY_DIR), &input).unwrap();

        let mut step = PageSortingStep::new(dir.path());
        step.run().unwrap();

        let part = records::main_part_path(SORTED_PAGES_DIR, step.checkpoint().dir()).unwrap();
        let rows: Vec<(PageId, PageDetail)> = PartReader::open(&part)
            .unwrap()
            .map(|row| row.unwrap())
            .collect();

        let ids: Vec<PageId> = rows.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![10, 20, 30]);

        let (_, physics) = &rows[0];
        assert_eq!(physics.title, "Physics");
        assert_eq!(physics.namespace, Namespace::Main);
        let (_, science) = &rows[2];
        assert_eq!(science.namespace, Namespace::Category);
    }

    #[test]
    fn missing_input_is_a_dependency_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut step = PageSortingStep::new(dir.path());
        assert!(matches!(step.run(), Err(ExtractError::MissingDependency { .. })));
    }
}
