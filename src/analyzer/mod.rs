// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod history;
pub mod movers;
pub mod position;
pub mod ranking;
pub mod scoring;
pub mod trend_analysis;

// Re-export the main Analyzer implementation for ease of use.
pub use trend_analysis::{Analyzer, AnalyzerImpl};
