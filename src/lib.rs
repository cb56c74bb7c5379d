pub mod analysis;
pub mod analysis_errors;
pub mod constants;
pub mod fix;
pub mod flight;
pub mod geodesy;
pub mod pipeline;
pub mod track_reader;

pub use analysis::AnalysisParams;
pub use analysis_errors::AnalysisError;
pub use fix::Fix;
pub use flight::Flight;
pub use pipeline::{analyze, analyze_with, Pipeline};
