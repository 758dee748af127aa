use serde::{Deserialize, Serialize};

use super::ensure_success;
use super::types::{FileRecord, GroupingKey, PaperCode, UploadedFileMetadata};
use crate::BusinessConfig;
use crate::error::ApiError;
use crate::http::Client;
use crate::session::SessionState;

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    subject_name: &'a str,
    paper_code: &'a str,
    files: &'a [UploadedFileMetadata],
}

/// What the backend recorded for a batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegisteredBatch {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub paper_code: Option<PaperCode>,
}

/// Report the stored objects of a batch to the backend, in upload order.
pub async fn register_files(
    config: &BusinessConfig,
    session: &SessionState,
    key: &GroupingKey,
    files: &[UploadedFileMetadata],
) -> Result<RegisteredBatch, ApiError> {
    let url = format!("{}/files/file-upload", config.api_url());
    log::info!("Registering {} uploaded files at {url}", files.len());

    let response = session
        .authorize(Client::post(url))
        .timeout(config.request_timeout)
        .json(&RegisterRequest {
            subject_name: &key.subject_name,
            paper_code: &key.paper_code,
            files,
        })?
        .send()
        .await?;

    let batch: RegisteredBatch = ensure_success(response)?.json()?;
    log::info!("Backend recorded {} files", batch.files.len());
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::extract_error_message;
    use crate::upload::types::FileStatus;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn metadata(name: &str) -> UploadedFileMetadata {
        UploadedFileMetadata {
            file_name: name.to_owned(),
            s3_url: format!("https://bucket/{name}"),
            file_size: 42,
            mime_type: "application/pdf".to_owned(),
        }
    }

    #[tokio::test]
    async fn posts_metadata_and_parses_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files/file-upload"))
            .and(body_json(json!({
                "subject_name": "Physics",
                "paper_code": "PHY-101",
                "files": [{
                    "file_name": "a.pdf",
                    "s3_url": "https://bucket/a.pdf",
                    "file_size": 42,
                    "mime_type": "application/pdf"
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [{
                    "file_id": "f-1",
                    "paper_code_id": "pc-1",
                    "file_name": "a.pdf",
                    "s3_url": "https://bucket/a.pdf",
                    "file_size": 42,
                    "mime_type": "application/pdf",
                    "status": "pending",
                    "evaluation_result": null,
                    "evaluation_count": 0,
                    "created_at": "2025-03-01T10:00:00Z"
                }],
                "paper_code": {
                    "paper_code_id": "pc-1",
                    "subject_name": "Physics",
                    "paper_code": "PHY-101",
                    "code": "PHY101",
                    "description": null,
                    "is_active": true,
                    "created_at": "2025-01-01T00:00:00Z"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let batch = register_files(
            &BusinessConfig::new(server.uri()),
            &SessionState::default(),
            &GroupingKey::new("Physics", "PHY-101"),
            &[metadata("a.pdf")],
        )
        .await
        .expect("registration should succeed");

        assert_eq!(batch.files.len(), 1);
        assert_eq!(batch.files[0].status, FileStatus::Pending);
        let paper_code = batch.paper_code.expect("paper code echo");
        assert_eq!(paper_code.paper_code_id.as_str(), "pc-1");
        assert!(paper_code.is_active);
    }

    #[tokio::test]
    async fn validation_error_surfaces_first_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{"loc": ["body", "files", 0, "s3_url"], "msg": "invalid url"}]
            })))
            .mount(&server)
            .await;

        let err = register_files(
            &BusinessConfig::new(server.uri()),
            &SessionState::default(),
            &GroupingKey::new("Physics", "PHY-101"),
            &[metadata("a.pdf")],
        )
        .await
        .expect_err("422 should fail");

        assert_eq!(extract_error_message(&err), "invalid url");
    }
}
