/// Constants used for stage directory names under the working directory.
pub mod stages {
    /// Output of the external page-summary extraction (pipeline input).
    pub const PAGE_SUMMARY_DIR: &str = "pageSummary";
    /// Output of the external label-occurrence tally (pipeline input).
    pub const LABEL_OCCURRENCES_DIR: &str = "labelOccurrences";
    /// Pages repartitioned by id.
    pub const SORTED_PAGES_DIR: &str = "sortedPages";
    /// Prefix for per-iteration depth superstep outputs (`pageDepth_0`, ...).
    pub const PAGE_DEPTH_DIR_PREFIX: &str = "pageDepth_";
    /// Ranked candidate senses per label text.
    pub const LABEL_SENSES_DIR: &str = "labelSenses";
    /// Labels for which each page is the top-ranked sense.
    pub const PRIMARY_LABELS_DIR: &str = "primaryLabels";
    /// Final merged relations.
    pub const FINAL_DIR: &str = "final";
}

/// Constants used for per-stage bookkeeping files.
pub mod files {
    /// Name of the single result partition a stage commits.
    pub const PART_FILE: &str = "part-00000";
    /// Prefix shared by all result partitions.
    pub const PART_PREFIX: &str = "part-";
    /// Completion marker; its presence short-circuits re-execution.
    pub const FINISHED_MARKER: &str = "finished";
    /// Persisted counters map (name, value) for checkpoints and convergence.
    pub const COUNTERS_FILE: &str = "counters";
}

/// Counter names tallied by authoritative reducers.
pub mod counters {
    /// Pages holding a depth not yet forwarded to children (convergence predicate).
    pub const UNFORWARDED: &str = "unforwarded";
    /// Pages reached by the depth propagation so far.
    pub const WITH_DEPTH: &str = "with_depth";
    /// Pages not yet reached by the depth propagation.
    pub const WITHOUT_DEPTH: &str = "without_depth";
    /// Labels with more than one candidate sense.
    pub const AMBIGUOUS: &str = "ambiguous";
    /// Labels with exactly one candidate sense.
    pub const UNAMBIGUOUS: &str = "unambiguous";
    /// Page rows written by the final merge.
    pub const PAGES_WRITTEN: &str = "pages_written";
    /// Pages dropped by the final merge because no type could be assigned.
    pub const PAGES_DROPPED: &str = "pages_dropped";
    /// Label rows written by the final merge.
    pub const LABELS_WRITTEN: &str = "labels_written";
}

/// File names of the final output relations.
pub mod output {
    pub const PAGE_FILE: &str = "page.csv";
    pub const ARTICLE_PARENTS_FILE: &str = "articleParents.csv";
    pub const CATEGORY_PARENTS_FILE: &str = "categoryParents.csv";
    pub const CHILD_ARTICLES_FILE: &str = "childArticles.csv";
    pub const CHILD_CATEGORIES_FILE: &str = "childCategories.csv";
    pub const PAGE_LABEL_FILE: &str = "pageLabel.csv";
    pub const PAGE_LINK_IN_FILE: &str = "pageLinkIn.csv";
    pub const PAGE_LINK_OUT_FILE: &str = "pageLinkOut.csv";
    pub const REDIRECT_SOURCES_BY_TARGET_FILE: &str = "redirectSourcesByTarget.csv";
    pub const REDIRECT_TARGETS_BY_SOURCE_FILE: &str = "redirectTargetsBySource.csv";
    pub const SENTENCE_SPLITS_FILE: &str = "sentenceSplits.csv";
    pub const LABEL_FILE: &str = "label.csv";

    /// All relation files the final step commits, in publish order.
    pub const ALL_FILES: [&str; 12] = [
        PAGE_FILE,
        ARTICLE_PARENTS_FILE,
        CATEGORY_PARENTS_FILE,
        CHILD_ARTICLES_FILE,
        CHILD_CATEGORIES_FILE,
        PAGE_LABEL_FILE,
        PAGE_LINK_IN_FILE,
        PAGE_LINK_OUT_FILE,
        REDIRECT_SOURCES_BY_TARGET_FILE,
        REDIRECT_TARGETS_BY_SOURCE_FILE,
        SENTENCE_SPLITS_FILE,
        LABEL_FILE,
    ];
}

/// Constants used by the local map/combine/reduce runner.
pub mod mapreduce {
    /// Input records handled per map task (one combiner pass per task).
    pub const MAP_TASK_SIZE: usize = 4096;
}
