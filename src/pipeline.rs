//! Stage orchestration: run every step in dependency order, resuming from
//! checkpoints, then publish the finished relations.

use std::fs;

use tracing::info;

use crate::config::{LanguageConfig, PipelineConfig};
use crate::constants::counters::{LABELS_WRITTEN, PAGES_DROPPED, PAGES_WRITTEN, WITH_DEPTH};
use crate::constants::output;
use crate::constants::stages::FINAL_DIR;
use crate::errors::ExtractError;
use crate::step::Step;
use crate::steps::final_summary::FinalSummaryStep;
use crate::steps::label_senses::LabelSensesStep;
use crate::steps::page_depth::PageDepthStep;
use crate::steps::page_sorting::PageSortingStep;
use crate::steps::primary_label::PrimaryLabelStep;
use crate::types::Title;

/// Aggregate figures from a completed pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineReport {
    /// Depth supersteps executed until convergence.
    pub depth_supersteps: u32,
    /// Pages the depth propagation reached.
    pub pages_with_depth: i64,
    /// Distinct label texts aggregated.
    pub total_labels: i64,
    pub pages_written: i64,
    pub pages_dropped: i64,
    pub labels_written: i64,
}

pub struct Pipeline {
    config: PipelineConfig,
    root_category: Title,
}

impl Pipeline {
    /// Validate the configuration and resolve the language's root category.
    pub fn new(config: PipelineConfig) -> Result<Self, ExtractError> {
        config.validate()?;
        let languages = LanguageConfig::load(&config.language_file)?;
        let root_category = languages.language(&config.language_code)?.root_category.clone();
        Ok(Self {
            config,
            root_category,
        })
    }

    /// Run every stage to completion. Stages finished by a previous run are
    /// skipped via their checkpoints, so a crashed run picks up where it left
    /// off.
    pub fn run(&self) -> Result<PipelineReport, ExtractError> {
        let working_dir = &self.config.working_dir;

        PageSortingStep::new(working_dir).run()?;

        // One superstep per round until every reached page has forwarded its
        // depth. Finished supersteps short-circuit, so a resumed run replays
        // the loop from persisted counters.
        let mut iteration = 0;
        let depth_counters = loop {
            let counters =
                PageDepthStep::new(working_dir, iteration, &self.root_category).run()?;
            if !PageDepthStep::further_iterations_required(&counters) {
                break counters;
            }
            iteration += 1;
        };

        let sense_counters = LabelSensesStep::new(working_dir).run()?;
        PrimaryLabelStep::new(working_dir).run()?;
        let final_counters = FinalSummaryStep::new(working_dir, iteration).run()?;

        self.publish()?;

        let report = PipelineReport {
            depth_supersteps: iteration + 1,
            pages_with_depth: depth_counters.get(WITH_DEPTH),
            total_labels: LabelSensesStep::total_labels(&sense_counters),
            pages_written: final_counters.get(PAGES_WRITTEN),
            pages_dropped: final_counters.get(PAGES_DROPPED),
            labels_written: final_counters.get(LABELS_WRITTEN),
        };
        info!(
            depth_supersteps = report.depth_supersteps,
            pages_written = report.pages_written,
            labels_written = report.labels_written,
            "pipeline complete"
        );
        Ok(report)
    }

    /// Copy the committed relations out of the working directory.
    fn publish(&self) -> Result<(), ExtractError> {
        let source = self.config.working_dir.join(FINAL_DIR);
        fs::create_dir_all(&self.config.final_dir)?;
        for name in output::ALL_FILES {
            fs::copy(source.join(name), self.config.final_dir.join(name))?;
        }
        info!(dir = %self.config.final_dir.display(), "relations published");
        Ok(())
    }
}
