pub mod client;
pub mod error;
pub mod ingest;
pub mod models;
pub mod parser;
pub mod presenter;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use client::AnalysisClient;
pub use error::{AnalyzerError, Result};
pub use ingest::{EncodedImagePayload, encode_image};
pub use models::SolarAnalysis;
pub use parser::{extract_json_span, parse_analysis};
pub use presenter::{MetricView, ReportView, report_json};
pub use prompt::solar_analysis_prompt;
pub use session::{InMemorySessionStorage, Session, SessionPhase, SessionStorage};
