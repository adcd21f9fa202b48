//! Record types flowing between pipeline stages.

use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{LabelText, PageId, SentenceIndex, Title};

/// Dump namespace a page belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// Articles, disambiguation pages, and article redirects.
    Main,
    Category,
    Template,
    File,
    /// Any other namespace the dump declares (talk, user, help, ...).
    Other(i32),
}

/// Key under which the external summary extraction emits pages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageKey {
    pub namespace: Namespace,
    pub title: Title,
}

/// Reference to another page. Titles are carried alongside ids because label
/// aggregation derives senses from redirect titles and the final merge
/// annotates labels by them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: PageId,
    pub title: Title,
}

/// An incoming or outgoing link plus the sentences it occurs in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub id: PageId,
    pub sentence_indexes: Vec<SentenceIndex>,
}

/// Evidence counts for one label as it occurs on one page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    /// Number of documents the label links to this page from.
    pub doc_count: i64,
    /// Total occurrences of the label linking to this page.
    pub occ_count: i64,
}

/// One record per page, produced by the external summary extraction keyed by
/// (namespace, title) and re-keyed by id in the page sorting step.
///
/// A redirect page carries only `redirects_to`; its structural fields stay
/// empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageDetail {
    pub id: PageId,
    pub namespace: Namespace,
    pub title: Title,
    pub redirects_to: Option<PageId>,
    pub is_disambiguation: bool,
    pub parent_categories: Vec<PageSummary>,
    pub child_categories: Vec<PageSummary>,
    pub child_articles: Vec<PageSummary>,
    pub links_in: Vec<LinkSummary>,
    pub links_out: Vec<LinkSummary>,
    /// Pages that redirect to this page.
    pub redirects: Vec<PageSummary>,
    pub sentence_splits: Vec<SentenceIndex>,
    /// Label text → evidence counts for links made with that text.
    pub labels: IndexMap<LabelText, LabelCounts>,
}

impl PageDetail {
    /// An empty Main-namespace page, for steps and tests to fill in.
    pub fn new(id: PageId) -> Self {
        Self {
            id,
            namespace: Namespace::Main,
            title: String::new(),
            redirects_to: None,
            is_disambiguation: false,
            parent_categories: Vec::new(),
            child_categories: Vec::new(),
            child_articles: Vec::new(),
            links_in: Vec::new(),
            links_out: Vec::new(),
            redirects: Vec::new(),
            sentence_splits: Vec::new(),
            labels: IndexMap::new(),
        }
    }
}

/// Message passed between depth supersteps, keyed by target page id.
///
/// A missing depth means the page has not been reached yet. Once
/// `depth_forwarded` is set the page never re-notifies its children, even if a
/// smaller depth arrives later (first forward wins).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDepthSummary {
    pub depth: Option<i32>,
    pub depth_forwarded: bool,
    pub child_ids: Vec<PageId>,
}

/// Candidate association between a label text and a target page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSense {
    pub id: PageId,
    pub doc_count: i64,
    pub occ_count: i64,
    /// The label equals the page's own title.
    pub from_title: bool,
    /// The label equals the title of a redirect pointing at the page.
    pub from_redirect: bool,
}

impl LabelSense {
    /// A sense with no link evidence yet (title- or redirect-derived).
    pub fn unlinked(id: PageId) -> Self {
        Self {
            id,
            doc_count: 0,
            occ_count: 0,
            from_title: false,
            from_redirect: false,
        }
    }

    /// Ranking rule for senses of one label: descending doc count, then
    /// descending occurrence count, then ascending page id.
    pub fn rank_cmp(a: &LabelSense, b: &LabelSense) -> Ordering {
        b.doc_count
            .cmp(&a.doc_count)
            .then(b.occ_count.cmp(&a.occ_count))
            .then(a.id.cmp(&b.id))
    }
}

/// Consolidated senses for one label text, ranked by [`LabelSense::rank_cmp`]
/// once the authoritative reduce has run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSenseList {
    pub senses: Vec<LabelSense>,
}

/// Labels for which a page is the top-ranked sense, keyed by page id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryLabels {
    pub labels: Vec<LabelText>,
}

/// Aggregate tallies for one label over link anchors and free text, produced
/// by the external occurrence step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOccurrences {
    pub link_doc_count: i64,
    pub link_occ_count: i64,
    pub text_doc_count: i64,
    pub text_occ_count: i64,
}

/// Final classification of a page in the output `page` relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    Article,
    Category,
    Disambiguation,
    Redirect,
    Template,
    /// Pages with no usable classification (e.g. a category that is also a
    /// redirect); dropped from output.
    Invalid,
}

impl PageType {
    /// Classify a page from its namespace, redirect target, and
    /// disambiguation flag.
    pub fn classify(detail: &PageDetail) -> PageType {
        match detail.namespace {
            Namespace::Main => {
                if detail.redirects_to.is_some() {
                    PageType::Redirect
                } else if detail.is_disambiguation {
                    PageType::Disambiguation
                } else {
                    PageType::Article
                }
            }
            Namespace::Category => {
                if detail.redirects_to.is_some() {
                    // No clean way to deal with category redirects.
                    // TODO: revisit once the serving layer defines semantics for them.
                    PageType::Invalid
                } else {
                    PageType::Category
                }
            }
            Namespace::Template => PageType::Template,
            _ => PageType::Invalid,
        }
    }

    /// Stable name used in the `page` relation's type column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Article => "article",
            PageType::Category => "category",
            PageType::Disambiguation => "disambiguation",
            PageType::Redirect => "redirect",
            PageType::Template => "template",
            PageType::Invalid => "invalid",
        }
    }
}
