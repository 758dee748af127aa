//! File history command.

use anyhow::Result;
use examscan_business::{FetchFileHistoryCommand, FileHistoryCompute, FileHistoryInput, FileRecord};
use examscan_states::StateCtx;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::context::flush_and_await;
use crate::output::{Output, styled_status};
use crate::utils::{format_size, format_timestamp, truncate};

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "File")]
    file_name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Paper code")]
    paper_code: String,
    #[tabled(rename = "Uploaded")]
    created_at: String,
    #[tabled(rename = "ID")]
    file_id: String,
}

impl From<&FileRecord> for RecordRow {
    fn from(record: &FileRecord) -> Self {
        Self {
            file_name: truncate(&record.file_name, 40),
            status: styled_status(record.status),
            size: format_size(record.file_size),
            paper_code: record
                .paper_code
                .map_or_else(|| "-".to_owned(), |code| code.to_string()),
            created_at: format_timestamp(&record.created_at),
            file_id: record.file_id.to_string(),
        }
    }
}

pub fn records_table(records: &[FileRecord]) -> String {
    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Fetch one page of history into the store.
///
/// Fails with the extracted backend message; the previous records stay in
/// [`FileHistoryCompute`] either way.
pub async fn fetch_history(ctx: &mut StateCtx, input: FileHistoryInput) -> Result<FileHistoryCompute> {
    ctx.update::<FileHistoryInput>(|current| *current = input);
    ctx.enqueue_command::<FetchFileHistoryCommand>();
    flush_and_await(ctx).await;

    let history = ctx.compute::<FileHistoryCompute>().clone();
    match &history.last_error {
        Some(error) => anyhow::bail!("Error fetching file history: {error}"),
        None => Ok(history),
    }
}

#[instrument(skip_all, name = "history", fields(limit, offset))]
pub async fn run_history(
    mut ctx: StateCtx,
    paper_code_id: Option<String>,
    limit: u32,
    offset: u32,
) -> Result<()> {
    let out = Output::new();

    let input = FileHistoryInput {
        paper_code_id,
        limit: Some(limit),
        offset: Some(offset),
    };
    let result = fetch_history(&mut ctx, input).await;
    ctx.shutdown().await;
    let history = result?;

    if history.records.is_empty() {
        out.dim("No uploaded files found.");
        return Ok(());
    }

    out.print(records_table(&history.records));
    out.dim(format!(
        "Showing {} of {} file(s)",
        history.records.len(),
        history.total
    ));
    Ok(())
}
