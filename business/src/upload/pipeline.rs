use std::any::Any;

use examscan_states::{
    Command, CommandFuture, CommandSnapshot, Compute, State, StateCtx, Updater, state_assign_impl,
};

use super::history::{FileHistoryCompute, RefreshFileHistoryCommand};
use super::registrar::register_files;
use super::resolver::resolve_destinations;
use super::transfer::transfer_all;
use super::types::{FileDescriptor, FileRecord, GroupingKey, PaperCode, UploadDestination};
use crate::BusinessConfig;
use crate::error::PipelineError;
use crate::session::SessionState;

/// Shown when a batch is submitted without files.
pub const EMPTY_BATCH_MESSAGE: &str = "Select at least one file to upload.";

pub const PROGRESS_STARTED: u8 = 0;
pub const PROGRESS_RESOLVED: u8 = 33;
pub const PROGRESS_TRANSFERRED: u8 = 66;
pub const PROGRESS_REGISTERED: u8 = 100;

/// The batch the next [`UploadFilesCommand`] will submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatchInput {
    pub key: GroupingKey,
    pub files: Vec<FileDescriptor>,
}

impl State for UploadBatchInput {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadStep {
    #[default]
    Input,
    Uploading,
    Success,
    Error,
}

/// Progress of the current batch.
///
/// `progress` only ever takes the milestone values. On failure the step
/// becomes [`UploadStep::Error`] and progress stays at the last milestone
/// reached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadPipelineCompute {
    pub step: UploadStep,
    pub progress: u8,
    pub error: Option<PipelineError>,
    pub destinations: Vec<UploadDestination>,
    pub uploaded_files: Vec<FileRecord>,
    pub paper_code: Option<PaperCode>,
}

impl UploadPipelineCompute {
    fn started() -> Self {
        Self {
            step: UploadStep::Uploading,
            progress: PROGRESS_STARTED,
            ..Self::default()
        }
    }

    fn failed(mut self, error: PipelineError) -> Self {
        log::error!("Upload failed at {} stage: {error}", error.stage());
        self.step = UploadStep::Error;
        self.error = Some(error);
        self
    }

    pub fn is_uploading(&self) -> bool {
        self.step == UploadStep::Uploading
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

impl State for UploadPipelineCompute {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

impl Compute for UploadPipelineCompute {}

/// Run the submitted batch through resolve, transfer and register.
///
/// Publishes a new [`UploadPipelineCompute`] at every milestone and, once
/// the batch is registered, enqueues [`RefreshFileHistoryCommand`].
#[derive(Debug, Default)]
pub struct UploadFilesCommand;

impl Command for UploadFilesCommand {
    fn run(&self, snap: CommandSnapshot, updater: Updater) -> CommandFuture {
        let input = snap.state::<UploadBatchInput>().clone();
        let config = snap.state::<BusinessConfig>().clone();
        let session = snap.state::<SessionState>().clone();

        Box::pin(async move {
            let UploadBatchInput { key, files } = input;

            if files.is_empty() {
                updater.set(
                    UploadPipelineCompute::default()
                        .failed(PipelineError::InvalidBatch(EMPTY_BATCH_MESSAGE.to_owned())),
                );
                return;
            }

            log::info!(
                "Uploading {} files for {} / {}",
                files.len(),
                key.subject_name,
                key.paper_code
            );
            let mut pipeline = UploadPipelineCompute::started();
            updater.set(pipeline.clone());

            let destinations = match resolve_destinations(&config, &session, &key, &files).await {
                Ok(destinations) => destinations,
                Err(err) => {
                    updater.set(pipeline.failed(PipelineError::resolution(&err)));
                    return;
                }
            };
            pipeline.progress = PROGRESS_RESOLVED;
            pipeline.destinations = destinations.clone();
            updater.set(pipeline.clone());

            let uploaded = match transfer_all(destinations, files).await {
                Ok(uploaded) => uploaded,
                Err(error) => {
                    updater.set(pipeline.failed(error));
                    return;
                }
            };
            pipeline.progress = PROGRESS_TRANSFERRED;
            updater.set(pipeline.clone());

            let batch = match register_files(&config, &session, &key, &uploaded).await {
                Ok(batch) => batch,
                Err(err) => {
                    log::warn!(
                        "{} objects were stored but are not registered with the backend",
                        uploaded.len()
                    );
                    updater.set(pipeline.failed(PipelineError::registration(&err)));
                    return;
                }
            };

            pipeline.step = UploadStep::Success;
            pipeline.progress = PROGRESS_REGISTERED;
            pipeline.uploaded_files = batch.files;
            pipeline.paper_code = batch.paper_code;
            updater.set(pipeline);

            updater.enqueue::<RefreshFileHistoryCommand>();
        })
    }
}

/// Return the pipeline to [`UploadStep::Input`]. File history is kept.
#[derive(Debug, Default)]
pub struct ResetUploadCommand;

impl Command for ResetUploadCommand {
    fn run(&self, _snap: CommandSnapshot, updater: Updater) -> CommandFuture {
        Box::pin(async move {
            updater.set(UploadPipelineCompute::default());
        })
    }
}

/// Drop every trace of the session's scanning activity, history included.
/// Used on logout.
#[derive(Debug, Default)]
pub struct ClearScanningCommand;

impl Command for ClearScanningCommand {
    fn run(&self, _snap: CommandSnapshot, updater: Updater) -> CommandFuture {
        Box::pin(async move {
            updater.set(UploadPipelineCompute::default());
            updater.set(FileHistoryCompute::default());
        })
    }
}

/// Store `files` under `key` as the next batch and queue its upload.
///
/// The upload starts on the next `flush_commands`.
pub fn submit_upload(ctx: &mut StateCtx, key: GroupingKey, files: Vec<FileDescriptor>) {
    ctx.update::<UploadBatchInput>(|input| {
        input.key = key;
        input.files = files;
    });
    ctx.enqueue_command::<UploadFilesCommand>();
}
