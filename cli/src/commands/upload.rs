//! Upload command.

use std::path::PathBuf;

use anyhow::Result;
use examscan_business::{
    FileDescriptor, FileHistoryCompute, GroupingKey, UploadPipelineCompute, UploadStep,
    submit_upload,
};
use examscan_states::StateCtx;
use tracing::instrument;

use crate::commands::history::records_table;
use crate::context::flush_and_await_with;
use crate::output::Output;
use crate::utils::{describe_file, format_size};

/// Submit one batch and drive it to completion, printing each milestone.
///
/// Returns the final pipeline state on success and the extracted message
/// as the error otherwise.
pub async fn upload_batch(
    ctx: &mut StateCtx,
    key: GroupingKey,
    files: Vec<FileDescriptor>,
    out: &Output,
) -> Result<UploadPipelineCompute> {
    let updates = ctx.observe::<UploadPipelineCompute>();
    submit_upload(ctx, key, files);

    flush_and_await_with(ctx, |_| {
        for pipeline in updates.try_iter() {
            out.progress(pipeline.step, pipeline.progress);
        }
    })
    .await;

    let pipeline = ctx.compute::<UploadPipelineCompute>().clone();
    match pipeline.step {
        UploadStep::Success => Ok(pipeline),
        UploadStep::Error => match pipeline.error_message() {
            Some(message) => anyhow::bail!("Upload failed: {message}"),
            None => anyhow::bail!("Upload failed"),
        },
        step => anyhow::bail!("Upload did not complete (stopped at {step:?})"),
    }
}

#[instrument(skip_all, name = "upload", fields(subject = %subject, paper_code = %paper_code, file_count = paths.len()))]
pub async fn run_upload(
    mut ctx: StateCtx,
    subject: String,
    paper_code: String,
    paths: Vec<PathBuf>,
) -> Result<()> {
    let out = Output::new();

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        files.push(describe_file(path).await?);
    }

    out.header(format!(
        "Uploading {} file(s) for {subject} / {paper_code}",
        files.len()
    ));
    for file in &files {
        out.file_item(
            &file.name,
            file.content_type(),
            format_size(file.size.unwrap_or(0)),
        );
    }

    let result = upload_batch(
        &mut ctx,
        GroupingKey::new(subject, paper_code),
        files,
        &out,
    )
    .await;
    let pipeline = match result {
        Ok(pipeline) => pipeline,
        Err(err) => {
            ctx.shutdown().await;
            return Err(err);
        }
    };

    out.success(format!(
        "Registered {} file(s) for evaluation",
        pipeline.uploaded_files.len()
    ));
    if let Some(code) = &pipeline.paper_code {
        out.labeled_indent("Paper code id", code.paper_code_id, 2);
    }
    if !pipeline.uploaded_files.is_empty() {
        out.print(records_table(&pipeline.uploaded_files));
    }

    let history = ctx.compute::<FileHistoryCompute>();
    match &history.last_error {
        Some(error) => out.warning(format!("Could not refresh file history: {error}")),
        None => out.count("Recent uploads", history.records.len()),
    }

    ctx.shutdown().await;
    Ok(())
}
