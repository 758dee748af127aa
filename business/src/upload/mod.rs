//! Exam-sheet upload pipeline.
//!
//! A batch moves through three network stages against two kinds of server:
//!
//! 1. [`resolver`] asks the backend for one presigned destination per file.
//! 2. [`transfer`] writes every file straight to the object store, all at
//!    once.
//! 3. [`registrar`] tells the backend which objects now exist.
//!
//! [`pipeline`] strings the stages together as store commands and publishes
//! milestone progress; [`history`] reads back the backend's records.

pub mod history;
pub mod pipeline;
pub mod registrar;
pub mod resolver;
pub mod transfer;
pub mod types;


use crate::error::ApiError;
use crate::http::Response;

/// Turn a non-2xx response into [`ApiError::Status`], keeping the body for
/// message extraction.
pub(crate) fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            status: response.status,
            body: response.body,
        })
    }
}
