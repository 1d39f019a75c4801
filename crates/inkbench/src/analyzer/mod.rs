pub mod analysis;
pub mod readiness;
pub mod report;

pub use analysis::{analyze, DatasetAnalysis, FileStats, LengthStats, QualityMetrics, StatusCounts};
pub use readiness::{assess, ReadinessReport};
pub use report::{render_report, write_report};
