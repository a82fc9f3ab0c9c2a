//! Submission handling and scheduled metric refresh, the two entry points the
//! host process drives.

pub mod error;
pub mod parser;
pub mod pipeline;
pub mod refresh;
pub mod services;

pub use error::{ParserError, PipelineError, RefreshError};
pub use parser::ParserClient;
pub use pipeline::{PipelineConfig, Stage, SubmissionOutcome, SubmissionPipeline};
pub use refresh::{RefreshJob, RefreshSummary};
pub use services::{Services, SetupError};
