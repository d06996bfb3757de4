// Library interface for MyFlow modules
// Integration tests and the CLI both go through these exports

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod factors;
pub mod ingest;
pub mod load;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pacing;
pub mod sleep;
pub mod stats;
pub mod vulnerability;

// Re-export commonly used types for convenience
pub use analysis::{AnalysisReport, ContributionRow, FlowAnalyzer};
pub use config::AnalysisConfig;
pub use error::{MyFlowError, Result};
pub use export::ExportFormat;
pub use factors::{ProtectiveFactorRanker, ProtectiveFactorResult};
pub use ingest::{ingest_file, ingest_json, IngestReport};
pub use load::CompositeLoadCalculator;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use normalize::MetricNormalizer;
pub use pacing::{PacingDetector, PacingResult, PacingState};
pub use sleep::{SleepAnalysisResult, SleepCorrelationEngine, SleepOutcome};
pub use vulnerability::{SleepVulnerabilityAnalyzer, VulnerabilityVerdict};
