pub mod analysis;

pub use analysis::AnalysisConfig;
