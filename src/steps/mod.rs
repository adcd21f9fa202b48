//! The pipeline's stages, in dependency order.

pub mod page_sorting;
pub mod page_depth;
pub mod label_senses;
pub mod primary_label;
pub mod final_summary;
