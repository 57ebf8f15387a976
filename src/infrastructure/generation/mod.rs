//! Post-processing of generated files

pub mod post_processor;

pub use post_processor::{
    CanonicalFormatter, CommandPostProcessor, LintFixer, PostProcessReport,
    PostProcessingPipeline,
};
