//! Business layer of the examscan client.
//!
//! Everything here is driven through an [`examscan_states::StateCtx`]:
//! hosts register the states, computes and commands with
//! [`build_scanning_ctx`], submit a batch with [`submit_upload`], and watch
//! [`UploadPipelineCompute`] / [`FileHistoryCompute`] for results.

mod config;
pub mod error;
pub mod http;
mod session;
pub mod upload;

#[cfg(test)]
mod test_utils;

use examscan_states::StateCtx;

pub use config::{BusinessConfig, ConfigError, DEFAULT_REQUEST_TIMEOUT, ENV_PREFIX};
pub use error::{ApiError, PipelineError, extract_error_message};
pub use session::SessionState;
pub use upload::history::{
    FetchFileHistoryCommand, FileHistoryCompute, FileHistoryInput, FileHistoryPage,
    RECENT_HISTORY_LIMIT, RefreshFileHistoryCommand,
};
pub use upload::pipeline::{
    ClearScanningCommand, EMPTY_BATCH_MESSAGE, ResetUploadCommand, UploadBatchInput,
    UploadFilesCommand, UploadPipelineCompute, UploadStep, submit_upload,
};
pub use upload::types::{
    ContentHandle, FileDescriptor, FileRecord, FileStatus, GroupingKey, PaperCode,
    UploadDestination, UploadedFileMetadata,
};

/// A store with every scanning state, compute and command registered.
pub fn build_scanning_ctx(config: BusinessConfig, session: SessionState) -> StateCtx {
    let mut ctx = StateCtx::new();

    ctx.add_state(config);
    ctx.add_state(session);

    // Upload pipeline
    ctx.add_state(UploadBatchInput::default());
    ctx.record_compute(UploadPipelineCompute::default());

    // File history
    ctx.add_state(FileHistoryInput::default());
    ctx.record_compute(FileHistoryCompute::default());

    // Commands
    ctx.record_command(UploadFilesCommand);
    ctx.record_command(ResetUploadCommand);
    ctx.record_command(ClearScanningCommand);
    ctx.record_command(FetchFileHistoryCommand);
    ctx.record_command(RefreshFileHistoryCommand);

    ctx
}
