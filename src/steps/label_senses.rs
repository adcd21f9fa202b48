//! Aggregate per-page label statistics into ranked candidate senses.
//!
//! Every article contributes one sense per label attached to it, plus a
//! title-derived sense and one sense per redirect title pointing at it.
//! Senses sharing a label text within one page merge (a title that is also a
//! link label keeps its counts and gains the title flag); senses for the same
//! page arriving from different pages of a label group are deliberately left
//! as separate entries, matching the established output.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::constants::counters::{AMBIGUOUS, UNAMBIGUOUS};
use crate::constants::stages::{LABEL_SENSES_DIR, SORTED_PAGES_DIR};
use crate::counters::Counters;
use crate::errors::ExtractError;
use crate::mapreduce::{Emitter, ReduceScope, run_job};
use crate::model::{LabelSense, LabelSenseList, Namespace, PageDetail};
use crate::records;
use crate::step::{Checkpoint, Step};
use crate::types::{LabelText, PageId};

pub struct LabelSensesStep {
    checkpoint: Checkpoint,
    working_dir: PathBuf,
}

impl LabelSensesStep {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            checkpoint: Checkpoint::new(working_dir, LABEL_SENSES_DIR),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Labels seen in total, derived from the ambiguity counters.
    pub fn total_labels(counters: &Counters) -> i64 {
        counters.get(AMBIGUOUS) + counters.get(UNAMBIGUOUS)
    }
}

impl Step for LabelSensesStep {
    fn name(&self) -> &str {
        "label senses"
    }

    fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    fn execute(&mut self) -> Result<Counters, ExtractError> {
        let input: Vec<(PageId, PageDetail)> =
            records::read_all_parts(SORTED_PAGES_DIR, &self.working_dir.join(SORTED_PAGES_DIR))?;

        let output = run_job(
            input,
            |_, page: PageDetail, emitter: &mut Emitter<LabelText, LabelSenseList>| {
                map_page_senses(&page, emitter);
                Ok(())
            },
            merge_senses,
        )?;

        records::write_part(self.checkpoint.dir(), &output.rows)?;
        tracing::debug!(
            ambiguous = output.counters.get(AMBIGUOUS),
            unambiguous = output.counters.get(UNAMBIGUOUS),
            "label senses aggregated"
        );
        Ok(output.counters)
    }
}

/// Emit every candidate sense an article contributes, one singleton list per
/// label text. Non-articles and redirects contribute nothing.
fn map_page_senses(page: &PageDetail, emitter: &mut Emitter<LabelText, LabelSenseList>) {
    if page.namespace != Namespace::Main {
        return;
    }
    if page.redirects_to.is_some() {
        return;
    }

    let mut senses: IndexMap<LabelText, LabelSense> = IndexMap::new();

    for (text, counts) in &page.labels {
        senses.insert(
            text.clone(),
            LabelSense {
                id: page.id,
                doc_count: counts.doc_count,
                occ_count: counts.occ_count,
                from_title: false,
                from_redirect: false,
            },
        );
    }

    senses
        .entry(page.title.clone())
        .or_insert_with(|| LabelSense::unlinked(page.id))
        .from_title = true;

    for redirect in &page.redirects {
        senses
            .entry(redirect.title.clone())
            .or_insert_with(|| LabelSense::unlinked(page.id))
            .from_redirect = true;
    }

    for (text, sense) in senses {
        emitter.emit(text, LabelSenseList { senses: vec![sense] });
    }
}

/// Concatenate all sense lists for one label. The authoritative reduce ranks
/// the result and tallies label ambiguity; combiner passes only concatenate.
fn merge_senses(
    _label: &LabelText,
    lists: Vec<LabelSenseList>,
    scope: &mut ReduceScope<'_>,
) -> Result<Vec<LabelSenseList>, ExtractError> {
    let mut all = Vec::new();
    for list in lists {
        all.extend(list.senses);
    }

    if !scope.is_partial() {
        if all.len() > 1 {
            scope.tally(AMBIGUOUS, 1);
        } else {
            scope.tally(UNAMBIGUOUS, 1);
        }
        all.sort_by(LabelSense::rank_cmp);
    }

    Ok(vec![LabelSenseList { senses: all }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabelCounts, PageSummary};

    fn article(id: PageId, title: &str) -> PageDetail {
        let mut page = PageDetail::new(id);
        page.title = title.to_string();
        page
    }

    fn mapped(page: &PageDetail) -> IndexMap<LabelText, LabelSense> {
        let mut emitter = Emitter::new();
        map_page_senses(page, &mut emitter);
        emitter
            .into_pairs()
            .into_iter()
            .map(|(text, list)| {
                assert_eq!(list.senses.len(), 1);
                (text, list.senses[0])
            })
            .collect()
    }

    #[test]
    fn title_and_redirect_labels_are_emitted() {
        // Article "Paris" with no link labels and one redirect "City of Paris".
        let mut page = article(1, "Paris");
        page.redirects.push(PageSummary {
            id: 9,
            title: "City of Paris".to_string(),
        });

        let senses = mapped(&page);
        assert_eq!(senses.len(), 2);

        let title_sense = &senses["Paris"];
        assert_eq!(title_sense.id, 1);
        assert!(title_sense.from_title);
        assert!(!title_sense.from_redirect);
        assert_eq!(title_sense.doc_count, 0);
        assert_eq!(title_sense.occ_count, 0);

        let redirect_sense = &senses["City of Paris"];
        assert_eq!(redirect_sense.id, 1);
        assert!(redirect_sense.from_redirect);
        assert!(!redirect_sense.from_title);
    }

    #[test]
    fn coincident_title_label_keeps_its_counts() {
        let mut page = article(1, "Paris");
        page.labels.insert(
            "Paris".to_string(),
            LabelCounts {
                doc_count: 4,
                occ_count: 11,
            },
        );

        let senses = mapped(&page);
        let sense = &senses["Paris"];
        assert!(sense.from_title);
        assert_eq!(sense.doc_count, 4);
        assert_eq!(sense.occ_count, 11);
    }

    #[test]
    fn redirects_and_non_articles_emit_nothing() {
        let mut redirect = article(2, "Paris, France");
        redirect.redirects_to = Some(1);
        assert!(mapped(&redirect).is_empty());

        let mut category = article(3, "Capitals");
        category.namespace = Namespace::Category;
        assert!(mapped(&category).is_empty());
    }

    #[test]
    fn reduce_ranks_and_tallies_ambiguity() {
        let lists = vec![
            LabelSenseList {
                senses: vec![LabelSense {
                    id: 10,
                    doc_count: 5,
                    occ_count: 5,
                    from_title: false,
                    from_redirect: false,
                }],
            },
            LabelSenseList {
                senses: vec![LabelSense {
                    id: 20,
                    doc_count: 5,
                    occ_count: 8,
                    from_title: false,
                    from_redirect: false,
                }],
            },
        ];

        let mut counters = Counters::new();
        let mut scope = ReduceScope::authoritative(&mut counters);
        let merged = merge_senses(&"Mercury".to_string(), lists, &mut scope).unwrap();

        let ids: Vec<PageId> = merged[0].senses.iter().map(|sense| sense.id).collect();
        assert_eq!(ids, vec![20, 10]);
        assert_eq!(counters.get(AMBIGUOUS), 1);
        assert_eq!(counters.get(UNAMBIGUOUS), 0);
    }

    #[test]
    fn combiner_concatenates_without_sorting_or_counting() {
        let lists = vec![
            LabelSenseList {
                senses: vec![LabelSense {
                    id: 10,
                    doc_count: 1,
                    occ_count: 1,
                    from_title: false,
                    from_redirect: false,
                }],
            },
            LabelSenseList {
                senses: vec![LabelSense {
                    id: 20,
                    doc_count: 9,
                    occ_count: 9,
                    from_title: false,
                    from_redirect: false,
                }],
            },
        ];

        let mut counters = Counters::new();
        let mut scope = ReduceScope::partial(&mut counters);
        let merged = merge_senses(&"Mercury".to_string(), lists, &mut scope).unwrap();

        // Emission order preserved; no ranking yet.
        let ids: Vec<PageId> = merged[0].senses.iter().map(|sense| sense.id).collect();
        assert_eq!(ids, vec![10, 20]);
        assert!(counters.is_empty());
    }
}
