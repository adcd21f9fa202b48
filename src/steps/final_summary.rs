//! Assemble the final relations from the sorted stage outputs.
//!
//! Two independent merge-joins run over single-partition, key-sorted inputs:
//! pages join depth and primary-label streams by id; label senses join the
//! externally produced occurrence tally by text. Everything is written as
//! delimited rows: the key, a comma, then the relation's columns. List
//! columns join elements with `|`, nested fields with `:`, inner lists with
//! `;`; text fields are percent-escaped for those delimiters.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::constants::counters::{LABELS_WRITTEN, PAGES_DROPPED, PAGES_WRITTEN};
use crate::constants::output;
use crate::constants::stages::{LABEL_OCCURRENCES_DIR, LABEL_SENSES_DIR, PRIMARY_LABELS_DIR, SORTED_PAGES_DIR};
use crate::counters::Counters;
use crate::errors::ExtractError;
use crate::merge::SortedCursor;
use crate::model::{
    LabelOccurrences, LabelSenseList, LinkSummary, Namespace, PageDepthSummary, PageDetail,
    PageSummary, PageType, PrimaryLabels,
};
use crate::records::{self, PartReader};
use crate::step::{Checkpoint, Step};
use crate::steps::page_depth::PageDepthStep;
use crate::types::{LabelText, PageId};
use crate::utils::escape_field;

/// Depth written for pages the propagation never reached.
const NO_DEPTH: i32 = -1;

pub struct FinalSummaryStep {
    checkpoint: Checkpoint,
    working_dir: PathBuf,
    depth_iteration: u32,
}

impl FinalSummaryStep {
    /// `depth_iteration` names the converged depth superstep to join against.
    pub fn new(working_dir: &Path, depth_iteration: u32) -> Self {
        Self {
            checkpoint: Checkpoint::new(working_dir, crate::constants::stages::FINAL_DIR),
            working_dir: working_dir.to_path_buf(),
            depth_iteration,
        }
    }

    fn writer(&self, name: &str) -> Result<BufWriter<File>, ExtractError> {
        Ok(BufWriter::new(File::create(self.checkpoint.dir().join(name))?))
    }

    fn input_part(&self, step: &str) -> Result<PathBuf, ExtractError> {
        records::main_part_path(step, &self.working_dir.join(step))
    }

    fn finalize_pages(&self, counters: &mut Counters) -> Result<(), ExtractError> {
        let pages: PartReader<PageId, PageDetail> =
            PartReader::open(&self.input_part(SORTED_PAGES_DIR)?)?;

        let depth_dir = PageDepthStep::dir_name(self.depth_iteration);
        let depth_part = records::main_part_path(&depth_dir, &self.working_dir.join(&depth_dir))?;
        let mut depths: SortedCursor<PageId, PageDepthSummary, _> =
            SortedCursor::new(PartReader::open(&depth_part)?)?;
        let mut primaries: SortedCursor<PageId, PrimaryLabels, _> =
            SortedCursor::new(PartReader::<PageId, PrimaryLabels>::open(
                &self.input_part(PRIMARY_LABELS_DIR)?,
            )?)?;

        let mut page_writer = self.writer(output::PAGE_FILE)?;
        let mut article_parents = self.writer(output::ARTICLE_PARENTS_FILE)?;
        let mut category_parents = self.writer(output::CATEGORY_PARENTS_FILE)?;
        let mut child_articles = self.writer(output::CHILD_ARTICLES_FILE)?;
        let mut child_categories = self.writer(output::CHILD_CATEGORIES_FILE)?;
        let mut page_labels = self.writer(output::PAGE_LABEL_FILE)?;
        let mut links_in = self.writer(output::PAGE_LINK_IN_FILE)?;
        let mut links_out = self.writer(output::PAGE_LINK_OUT_FILE)?;
        let mut redirect_sources = self.writer(output::REDIRECT_SOURCES_BY_TARGET_FILE)?;
        let mut redirect_targets = self.writer(output::REDIRECT_TARGETS_BY_SOURCE_FILE)?;
        let mut sentence_splits = self.writer(output::SENTENCE_SPLITS_FILE)?;

        for row in pages {
            let (id, detail) = row?;

            let depth = depths.advance_to(&id)?.and_then(|summary| summary.depth);
            let primary: HashSet<LabelText> = primaries
                .advance_to(&id)?
                .map(|labels| labels.labels.iter().cloned().collect())
                .unwrap_or_default();

            let page_type = PageType::classify(&detail);
            if page_type == PageType::Invalid {
                warn!(id, title = %detail.title, "page has no usable type, dropping");
                counters.add(PAGES_DROPPED, 1);
                continue;
            }

            writeln!(
                page_writer,
                "{id},{},{},{}",
                page_type.as_str(),
                escape_field(&detail.title),
                depth.unwrap_or(NO_DEPTH)
            )?;
            counters.add(PAGES_WRITTEN, 1);

            match detail.namespace {
                Namespace::Main if detail.redirects_to.is_none() => {
                    // Articles and disambiguation pages.
                    writeln!(article_parents, "{id},{}", id_list(&detail.parent_categories))?;
                    writeln!(links_in, "{id},{}", link_list(&detail.links_in))?;
                    writeln!(links_out, "{id},{}", link_list(&detail.links_out))?;
                    writeln!(redirect_sources, "{id},{}", id_list(&detail.redirects))?;
                    writeln!(sentence_splits, "{id},{}", int_list(&detail.sentence_splits))?;
                    writeln!(page_labels, "{id},{}", page_label_list(&detail, &primary))?;
                }
                Namespace::Main => {
                    // Redirect; classification guarantees a target.
                    if let Some(target) = detail.redirects_to {
                        writeln!(redirect_targets, "{id},{target}")?;
                    }
                }
                Namespace::Category => {
                    writeln!(category_parents, "{id},{}", id_list(&detail.parent_categories))?;
                    writeln!(child_articles, "{id},{}", id_list(&detail.child_articles))?;
                    writeln!(child_categories, "{id},{}", id_list(&detail.child_categories))?;
                }
                // Templates get a page row only.
                _ => {}
            }
        }

        for writer in [
            &mut page_writer,
            &mut article_parents,
            &mut category_parents,
            &mut child_articles,
            &mut child_categories,
            &mut page_labels,
            &mut links_in,
            &mut links_out,
            &mut redirect_sources,
            &mut redirect_targets,
            &mut sentence_splits,
        ] {
            writer.flush()?;
        }
        Ok(())
    }

    fn finalize_labels(&self, counters: &mut Counters) -> Result<(), ExtractError> {
        let senses: PartReader<LabelText, LabelSenseList> =
            PartReader::open(&self.input_part(LABEL_SENSES_DIR)?)?;
        let mut occurrences: SortedCursor<LabelText, LabelOccurrences, _> =
            SortedCursor::new(PartReader::<LabelText, LabelOccurrences>::open(
                &self.input_part(LABEL_OCCURRENCES_DIR)?,
            )?)?;

        let mut label_writer = self.writer(output::LABEL_FILE)?;

        for row in senses {
            let (text, list) = row?;
            let tallies = occurrences.advance_to(&text)?.copied().unwrap_or_default();

            writeln!(
                label_writer,
                "{},{},{},{},{},{}",
                escape_field(&text),
                tallies.link_doc_count,
                tallies.link_occ_count,
                tallies.text_doc_count,
                tallies.text_occ_count,
                sense_list(&list)
            )?;
            counters.add(LABELS_WRITTEN, 1);
        }

        label_writer.flush()?;
        Ok(())
    }
}

impl Step for FinalSummaryStep {
    fn name(&self) -> &str {
        "final summary"
    }

    fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    fn execute(&mut self) -> Result<Counters, ExtractError> {
        let mut counters = Counters::new();
        self.finalize_pages(&mut counters)?;
        self.finalize_labels(&mut counters)?;
        Ok(counters)
    }
}

fn flag(value: bool) -> char {
    if value { '1' } else { '0' }
}

fn id_list(pages: &[PageSummary]) -> String {
    join(pages.iter().map(|page| page.id.to_string()), '|')
}

fn int_list(values: &[i32]) -> String {
    join(values.iter().map(|value| value.to_string()), '|')
}

/// `target:idx;idx` per link; the colon is omitted for links with no
/// recorded sentences.
fn link_list(links: &[LinkSummary]) -> String {
    join(
        links.iter().map(|link| {
            if link.sentence_indexes.is_empty() {
                link.id.to_string()
            } else {
                format!(
                    "{}:{}",
                    link.id,
                    join(link.sentence_indexes.iter().map(|idx| idx.to_string()), ';')
                )
            }
        }),
        '|',
    )
}

/// Every label attached to a page, annotated and ranked by occurrence count
/// first. This ordering is deliberately different from the per-label sense
/// ranking, which puts document count first.
fn page_label_list(detail: &PageDetail, primary: &HashSet<LabelText>) -> String {
    let redirect_titles: HashSet<&LabelText> =
        detail.redirects.iter().map(|redirect| &redirect.title).collect();

    let mut entries: Vec<(&LabelText, i64, i64, bool, bool, bool)> = detail
        .labels
        .iter()
        .map(|(text, counts)| {
            (
                text,
                counts.doc_count,
                counts.occ_count,
                detail.title == *text,
                redirect_titles.contains(text),
                primary.contains(text),
            )
        })
        .collect();

    entries.sort_by(|a, b| b.2.cmp(&a.2).then(b.1.cmp(&a.1)).then(a.0.cmp(b.0)));

    join(
        entries.iter().map(|(text, doc, occ, from_title, from_redirect, is_primary)| {
            format!(
                "{}:{doc}:{occ}:{}:{}:{}",
                escape_field(text),
                flag(*from_title),
                flag(*from_redirect),
                flag(*is_primary)
            )
        }),
        '|',
    )
}

fn sense_list(list: &LabelSenseList) -> String {
    join(
        list.senses.iter().map(|sense| {
            format!(
                "{}:{}:{}:{}:{}",
                sense.id,
                sense.doc_count,
                sense.occ_count,
                flag(sense.from_title),
                flag(sense.from_redirect)
            )
        }),
        '|',
    )
}

fn join(mut parts: impl Iterator<Item = String>, separator: char) -> String {
    let mut joined = match parts.next() {
        Some(first) => first,
        None => return String::new(),
    };
    for part in parts {
        joined.push(separator);
        joined.push_str(&part);
    }
    joined
}
