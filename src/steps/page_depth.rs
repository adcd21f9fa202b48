//! Iterative breadth-first depth assignment over the category graph.
//!
//! Each iteration is one superstep: map the previous round's records, fanning
//! a page's depth out to its children the first time the page holds one, then
//! merge all messages per target id (minimum depth wins, child lists
//! concatenate). The orchestrator keeps running supersteps while any page
//! holds a depth it has not yet forwarded.
//!
//! A page reached again with a smaller depth after it already forwarded keeps
//! the smaller depth but does not re-notify its children: first forward wins.

use std::path::{Path, PathBuf};

use crate::constants::counters::{UNFORWARDED, WITH_DEPTH, WITHOUT_DEPTH};
use crate::constants::stages::{PAGE_DEPTH_DIR_PREFIX, SORTED_PAGES_DIR};
use crate::counters::Counters;
use crate::errors::ExtractError;
use crate::mapreduce::{Emitter, JobOutput, ReduceScope, run_job};
use crate::model::{Namespace, PageDepthSummary, PageDetail};
use crate::records;
use crate::step::{Checkpoint, Step};
use crate::types::{PageId, Title};
use crate::utils::normalize_title;

/// One depth superstep. Iteration 0 seeds from the sorted pages; every later
/// iteration reads the previous iteration's output directory.
pub struct PageDepthStep {
    checkpoint: Checkpoint,
    working_dir: PathBuf,
    iteration: u32,
    root_category_title: Title,
}

impl PageDepthStep {
    pub fn new(working_dir: &Path, iteration: u32, root_category: &str) -> Self {
        Self {
            checkpoint: Checkpoint::new(working_dir, &Self::dir_name(iteration)),
            working_dir: working_dir.to_path_buf(),
            iteration,
            root_category_title: normalize_title(root_category),
        }
    }

    /// Output directory name for a given iteration; prior iterations stay
    /// immutable so a failed round can be re-run in isolation.
    pub fn dir_name(iteration: u32) -> String {
        format!("{PAGE_DEPTH_DIR_PREFIX}{iteration}")
    }

    /// Convergence predicate for the orchestrator's superstep loop.
    pub fn further_iterations_required(counters: &Counters) -> bool {
        counters.get(UNFORWARDED) > 0
    }

    fn seed_superstep(&self) -> Result<JobOutput<PageId, PageDepthSummary>, ExtractError> {
        let input: Vec<(PageId, PageDetail)> =
            records::read_all_parts(SORTED_PAGES_DIR, &self.working_dir.join(SORTED_PAGES_DIR))?;
        let root_title = self.root_category_title.clone();

        run_job(
            input,
            move |_, page: PageDetail, emitter: &mut Emitter<PageId, PageDepthSummary>| {
                // Depth only concerns articles and categories; redirects and
                // every other namespace stay out of the graph walk.
                if !matches!(page.namespace, Namespace::Main | Namespace::Category) {
                    return Ok(());
                }
                if page.redirects_to.is_some() {
                    return Ok(());
                }

                let mut summary = PageDepthSummary::default();
                summary.child_ids.extend(page.child_categories.iter().map(|child| child.id));
                summary.child_ids.extend(page.child_articles.iter().map(|child| child.id));

                if page.title == root_title {
                    summary.depth = Some(0);
                    share_depth(&mut summary, emitter);
                }
                emitter.emit(page.id, summary);
                Ok(())
            },
            merge_depths,
        )
    }

    fn subsequent_superstep(&self) -> Result<JobOutput<PageId, PageDepthSummary>, ExtractError> {
        let previous = Self::dir_name(self.iteration - 1);
        let input: Vec<(PageId, PageDepthSummary)> =
            records::read_all_parts(&previous, &self.working_dir.join(&previous))?;

        run_job(
            input,
            |id: PageId, mut summary: PageDepthSummary, emitter: &mut Emitter<PageId, PageDepthSummary>| {
                // Already forwarded or not yet reached: pass along untouched.
                if !summary.depth_forwarded && summary.depth.is_some() {
                    share_depth(&mut summary, emitter);
                }
                emitter.emit(id, summary);
                Ok(())
            },
            merge_depths,
        )
    }
}

impl Step for PageDepthStep {
    fn name(&self) -> &str {
        "page depth"
    }

    fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    fn execute(&mut self) -> Result<Counters, ExtractError> {
        let output = if self.iteration == 0 {
            self.seed_superstep()?
        } else {
            self.subsequent_superstep()?
        };

        records::write_part(self.checkpoint.dir(), &output.rows)?;
        tracing::debug!(
            iteration = self.iteration,
            with_depth = output.counters.get(WITH_DEPTH),
            without_depth = output.counters.get(WITHOUT_DEPTH),
            unforwarded = output.counters.get(UNFORWARDED),
            "superstep complete"
        );
        Ok(output.counters)
    }
}

/// Fan a freshly assigned depth out to every child, then mark the page
/// forwarded. No-op for unreached or already-forwarded pages.
fn share_depth(summary: &mut PageDepthSummary, emitter: &mut Emitter<PageId, PageDepthSummary>) {
    let Some(depth) = summary.depth else {
        return;
    };
    if summary.depth_forwarded {
        return;
    }
    for child_id in &summary.child_ids {
        emitter.emit(
            *child_id,
            PageDepthSummary {
                depth: Some(depth + 1),
                depth_forwarded: false,
                child_ids: Vec::new(),
            },
        );
    }
    summary.depth_forwarded = true;
}

/// Merge every message targeting one page: minimum depth wins and carries its
/// accompanying forwarded flag; child lists concatenate. Associative and
/// order-insensitive, so it serves as both combiner and reducer; only the
/// authoritative reduce settles the forwarded flag and tallies counters.
fn merge_depths(
    _id: &PageId,
    partials: Vec<PageDepthSummary>,
    scope: &mut ReduceScope<'_>,
) -> Result<Vec<PageDepthSummary>, ExtractError> {
    let mut min_depth: Option<i32> = None;
    let mut depth_forwarded = false;
    let mut child_ids: Vec<PageId> = Vec::new();

    for partial in partials {
        if let Some(depth) = partial.depth
            && min_depth.is_none_or(|min| min > depth)
        {
            min_depth = Some(depth);
            depth_forwarded = partial.depth_forwarded;
        }
        child_ids.extend(partial.child_ids);
    }

    if min_depth.is_none() {
        scope.tally(WITHOUT_DEPTH, 1);
        return Ok(vec![PageDepthSummary {
            depth: None,
            depth_forwarded,
            child_ids,
        }]);
    }

    if !scope.is_partial() {
        // Depth forwarding is only required for pages with children.
        if child_ids.is_empty() {
            depth_forwarded = true;
        }
        // Once forwarded, the child list is no longer needed.
        if depth_forwarded {
            child_ids = Vec::new();
        }
        scope.tally(WITH_DEPTH, 1);
        if !depth_forwarded {
            scope.tally(UNFORWARDED, 1);
        }
    }

    Ok(vec![PageDepthSummary {
        depth: min_depth,
        depth_forwarded,
        child_ids,
    }])
}
