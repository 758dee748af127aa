use std::collections::HashMap;

use tokio::task::JoinSet;

use super::ensure_success;
use super::types::{FileDescriptor, UploadDestination, UploadedFileMetadata};
use crate::error::{ApiError, FALLBACK_MESSAGE, PipelineError};
use crate::http::{Client, MultipartForm};

/// Name of the multipart part carrying the file bytes.
const FILE_PART: &str = "file";

/// Write one file to its presigned destination.
///
/// No bearer token and no timeout: the destination carries its own
/// authorization and large scans may take a while on slow links.
pub async fn transfer_file(
    destination: &UploadDestination,
    file: &FileDescriptor,
) -> Result<UploadedFileMetadata, ApiError> {
    let data = file.content.read().await?;
    let content_type = file.content_type();

    let request = match destination {
        UploadDestination::Multipart(dest) => {
            log::info!("POST {} ({} bytes) to {}", file.name, data.len(), dest.base_url);
            let form = dest
                .fields
                .iter()
                .fold(MultipartForm::new(), |form, (name, value)| {
                    form.text(name.as_str(), value.as_str())
                })
                .file(FILE_PART, file.name.as_str(), content_type, data);
            Client::post(dest.base_url.as_str()).multipart(form)
        }
        UploadDestination::DirectPut(dest) => {
            log::info!("PUT {} ({} bytes)", file.name, data.len());
            Client::put(dest.url.as_str())
                .header("Content-Type", content_type)
                .body(data)
        }
    };

    ensure_success(request.send().await?)?;

    Ok(UploadedFileMetadata {
        file_name: file.name.clone(),
        s3_url: destination.final_url().to_owned(),
        file_size: file.size.unwrap_or(0),
        mime_type: content_type.to_owned(),
    })
}

/// Transfer every file concurrently, pairing destinations and files by
/// position.
///
/// Returns confirmations in input order. The first failure to complete wins;
/// the remaining transfers are detached and left to finish on their own.
pub async fn transfer_all(
    destinations: Vec<UploadDestination>,
    files: Vec<FileDescriptor>,
) -> Result<Vec<UploadedFileMetadata>, PipelineError> {
    let count = files.len();
    let mut set = JoinSet::new();
    let mut names = HashMap::with_capacity(count);

    for (index, (destination, file)) in destinations.into_iter().zip(files).enumerate() {
        let name = file.name.clone();
        let handle = set.spawn(async move {
            let result = transfer_file(&destination, &file)
                .await
                .map_err(|err| PipelineError::transfer(file.name.as_str(), &err));
            (index, result)
        });
        names.insert(handle.id(), name);
    }

    let mut slots: Vec<Option<UploadedFileMetadata>> = vec![None; count];

    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((_, (index, Ok(metadata)))) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(metadata);
                }
            }
            Ok((_, (_, Err(err)))) => {
                log::error!("Transfer failed, abandoning batch: {err:?}");
                set.detach_all();
                return Err(err);
            }
            Err(join_err) => {
                let file_name = names.remove(&join_err.id()).unwrap_or_default();
                log::error!("Transfer task for {file_name} did not finish: {join_err}");
                set.detach_all();
                return Err(PipelineError::Transfer {
                    file_name,
                    message: FALLBACK_MESSAGE.to_owned(),
                });
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
