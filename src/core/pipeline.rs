pub use crate::app::pipelines::ReportPipeline;
