pub mod config;
pub mod models;
pub mod processing;
pub mod utils;
pub mod passport_pipeline;

pub use config::PipelineConfig;
pub use passport_pipeline::{PassportPipeline, PipelineOutput};
