//! Client for the remote analysis engine.
//!
//! Thin contract wrapper: forwards uploads and mappings, normalizes responses
//! and errors into the job model. The one distinction that matters to callers
//! is connectivity failure (no response at all) versus an application error
//! (the engine answered with a failure status): only the former may trigger
//! demo-mode fallback, and only at job creation time.

mod client;
mod error;
mod types;

pub use client::EngineClient;
pub use error::EngineError;
pub use types::{CsvPreview, EngineJob, JobAck, JobPage, SubmitOptions};
