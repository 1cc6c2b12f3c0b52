//! Salon Optimizer Common Library
//!
//! CLIクライアントとテストで共有される型と純粋な変換処理（I/Oなし）

pub mod confidence;
pub mod error;
pub mod file;
pub mod mapping;
pub mod navigation;
pub mod presenter;
pub mod schema;
pub mod types;

pub use confidence::{classify, ConfidenceTier};
pub use error::{Error, Result};
pub use file::{format_file_size, UploadedFile, MAX_UPLOAD_BYTES};
pub use mapping::{ColumnMapping, FieldConfidence};
pub use navigation::ResultsLink;
pub use presenter::{present, DetectedColumn, ReviewRow, ReviewableMapping, ScoredTier};
pub use schema::{OptimizationMethod, MANDATORY_FIELDS, REQUIRED_FIELDS};
pub use types::{
    DetectionResult, HistoryEntry, HistoryMetrics, MetricFigure, OptimizationRequest,
    OptimizationResultRef, UploadReceipt,
};
