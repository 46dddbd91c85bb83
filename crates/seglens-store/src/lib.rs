//! Session-scoped state for the segmentation service.
//!
//! All state is keyed by an explicit session identifier: the current upload,
//! the current column mapping, and the jobs created in that session. Nothing
//! here runs in the background; demo jobs progress lazily when polled.

pub mod history;
pub mod jobs;
pub mod session;
pub mod uploads;

use thiserror::Error;

pub use jobs::{DemoSource, JobCell};
pub use session::SessionStore;
pub use uploads::UploadStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found")]
    JobNotFound,

    #[error("no upload in progress")]
    NoCurrentUpload,

    #[error("no column mapping saved")]
    NoMappingSaved,

    #[error(transparent)]
    Domain(#[from] seglens_core::CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
