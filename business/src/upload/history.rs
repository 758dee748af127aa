//! Backend file history: the fetch call, its input state, and the compute
//! the pipeline refreshes after a successful batch.

use std::any::Any;

use examscan_states::{
    Command, CommandFuture, CommandSnapshot, Compute, State, Updater, state_assign_impl,
};
use serde::Deserialize;

use super::ensure_success;
use super::types::FileRecord;
use crate::BusinessConfig;
use crate::error::{ApiError, PipelineError};
use crate::http::Client;
use crate::session::SessionState;

/// Page size used when refreshing history after an upload.
pub const RECENT_HISTORY_LIMIT: u32 = 10;

/// Filter and paging for a history fetch. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHistoryInput {
    pub paper_code_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl FileHistoryInput {
    /// The most recent records across all paper codes.
    pub fn recent() -> Self {
        Self {
            limit: Some(RECENT_HISTORY_LIMIT),
            ..Self::default()
        }
    }
}

impl State for FileHistoryInput {
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

/// One page of history as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileHistoryPage {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<FileRecord>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

pub async fn fetch_file_history(
    config: &BusinessConfig,
    session: &SessionState,
    input: &FileHistoryInput,
) -> Result<FileHistoryPage, ApiError> {
    let mut request = session
        .authorize(Client::get(format!("{}/file-history", config.api_url())))
        .timeout(config.request_timeout);

    if let Some(id) = input.paper_code_id.as_deref().filter(|id| !id.is_empty()) {
        request = request.query("paper_code_id", id);
    }
    if let Some(limit) = input.limit.filter(|limit| *limit > 0) {
        request = request.query("limit", limit);
    }
    if let Some(offset) = input.offset.filter(|offset| *offset > 0) {
        request = request.query("offset", offset);
    }

    let page: FileHistoryPage = ensure_success(request.send().await?)?.json()?;
    log::debug!("Fetched {} of {} history records", page.data.len(), page.total);
    Ok(page)
}

/// History list kept across batches.
///
/// A failed fetch keeps the previous records and only sets `last_error`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileHistoryCompute {
    pub records: Vec<FileRecord>,
    pub total: u64,
    pub last_error: Option<PipelineError>,
}

impl FileHistoryCompute {
    fn loaded(page: FileHistoryPage) -> Self {
        Self {
            records: page.data,
            total: page.total,
            last_error: None,
        }
    }

    fn failed(mut self, error: PipelineError) -> Self {
        self.last_error = Some(error);
        self
    }
}

impl State for FileHistoryCompute {
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

impl Compute for FileHistoryCompute {}

fn load_history(snap: &CommandSnapshot, input: FileHistoryInput, updater: Updater) -> CommandFuture {
    let config = snap.state::<BusinessConfig>().clone();
    let session = snap.state::<SessionState>().clone();
    let previous = snap.state::<FileHistoryCompute>().clone();

    Box::pin(async move {
        match fetch_file_history(&config, &session, &input).await {
            Ok(page) => updater.set(FileHistoryCompute::loaded(page)),
            Err(err) => {
                let error = PipelineError::history_refresh(&err);
                log::error!("Failed to fetch file history: {error} ({err})");
                updater.set(previous.failed(error));
            }
        }
    })
}

/// Fetch history using whatever [`FileHistoryInput`] currently holds.
#[derive(Debug, Default)]
pub struct FetchFileHistoryCommand;

impl Command for FetchFileHistoryCommand {
    fn run(&self, snap: CommandSnapshot, updater: Updater) -> CommandFuture {
        let input = snap.state::<FileHistoryInput>().clone();
        load_history(&snap, input, updater)
    }
}

/// Reload the [`RECENT_HISTORY_LIMIT`] newest records. Enqueued by the
/// upload pipeline after a batch is registered.
#[derive(Debug, Default)]
pub struct RefreshFileHistoryCommand;

impl Command for RefreshFileHistoryCommand {
    fn run(&self, snap: CommandSnapshot, updater: Updater) -> CommandFuture {
        load_history(&snap, FileHistoryInput::recent(), updater)
    }
}
