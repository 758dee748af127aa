use serde::{Deserialize, Serialize};

use super::ensure_success;
use super::types::{FileDescriptor, GroupingKey, PresignedUpload, UploadDestination};
use crate::BusinessConfig;
use crate::error::ApiError;
use crate::http::Client;
use crate::session::SessionState;

/// Shown when the backend answers 2xx without usable destinations.
pub const PRESIGN_FAILED_MESSAGE: &str = "Failed to get presigned URLs";

#[derive(Debug, Serialize)]
struct FileRequest<'a> {
    file_name: &'a str,
    file_type: &'a str,
}

#[derive(Debug, Serialize)]
struct PresignRequest<'a> {
    subject_name: &'a str,
    paper_code: &'a str,
    files: Vec<FileRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct PresignResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    uploads: Option<Vec<PresignedUpload>>,
}

/// Request one destination per file, in the order the files were given.
///
/// The result always has exactly `files.len()` entries; any other count is
/// reported as an error rather than silently pairing the wrong files.
pub async fn resolve_destinations(
    config: &BusinessConfig,
    session: &SessionState,
    key: &GroupingKey,
    files: &[FileDescriptor],
) -> Result<Vec<UploadDestination>, ApiError> {
    let request = PresignRequest {
        subject_name: &key.subject_name,
        paper_code: &key.paper_code,
        files: files
            .iter()
            .map(|file| FileRequest {
                file_name: &file.name,
                file_type: file.content_type(),
            })
            .collect(),
    };

    let url = format!("{}/files/presigned-upload", config.api_url());
    log::info!("Requesting {} upload destinations from {url}", files.len());

    let response = session
        .authorize(Client::post(url))
        .timeout(config.request_timeout)
        .json(&request)?
        .send()
        .await?;
    let body: PresignResponse = ensure_success(response)?.json()?;

    let uploads = match body {
        PresignResponse {
            success: true,
            uploads: Some(uploads),
        } => uploads,
        _ => return Err(ApiError::Rejected(PRESIGN_FAILED_MESSAGE.to_owned())),
    };

    if uploads.len() != files.len() {
        log::error!(
            "Backend returned {} destinations for {} files",
            uploads.len(),
            files.len()
        );
        return Err(ApiError::Rejected(format!(
            "Expected {} upload destinations but received {}",
            files.len(),
            uploads.len()
        )));
    }

    Ok(uploads.into_iter().map(UploadDestination::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::extract_error_message;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn files(names: &[&str]) -> Vec<FileDescriptor> {
        names
            .iter()
            .map(|name| FileDescriptor::from_bytes(*name, Some("application/pdf".to_owned()), vec![0]))
            .collect()
    }

    #[tokio::test]
    async fn returns_destinations_in_request_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files/presigned-upload"))
            .and(header("Authorization", "Bearer t0k"))
            .and(body_json(json!({
                "subject_name": "Physics",
                "paper_code": "PHY-101",
                "files": [
                    {"file_name": "a.pdf", "file_type": "application/pdf"},
                    {"file_name": "b.pdf", "file_type": "application/pdf"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "uploads": [
                    {"url": "https://bucket/a.pdf", "file_name": "a.pdf"},
                    {"url": "https://bucket/b.pdf", "file_name": "b.pdf"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = BusinessConfig::new(server.uri());
        let session = SessionState::with_token("t0k");
        let key = GroupingKey::new("Physics", "PHY-101");

        let destinations = resolve_destinations(&config, &session, &key, &files(&["a.pdf", "b.pdf"]))
            .await
            .expect("resolution should succeed");

        let urls: Vec<&str> = destinations.iter().map(UploadDestination::final_url).collect();
        assert_eq!(urls, vec!["https://bucket/a.pdf", "https://bucket/b.pdf"]);
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "uploads": [{"url": "https://bucket/a.pdf"}]
            })))
            .mount(&server)
            .await;

        let config = BusinessConfig::new(server.uri());
        let err = resolve_destinations(
            &config,
            &SessionState::default(),
            &GroupingKey::new("Physics", "PHY-101"),
            &files(&["a.pdf", "b.pdf"]),
        )
        .await
        .expect_err("one destination for two files must fail");

        assert_eq!(
            extract_error_message(&err),
            "Expected 2 upload destinations but received 1"
        );
    }

    #[tokio::test]
    async fn unsuccessful_answer_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        let config = BusinessConfig::new(server.uri());
        let err = resolve_destinations(
            &config,
            &SessionState::default(),
            &GroupingKey::new("Physics", "PHY-101"),
            &files(&["a.pdf"]),
        )
        .await
        .expect_err("success=false must fail");

        assert_eq!(extract_error_message(&err), PRESIGN_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "Paper code not found"})),
            )
            .mount(&server)
            .await;

        let config = BusinessConfig::new(server.uri());
        let err = resolve_destinations(
            &config,
            &SessionState::default(),
            &GroupingKey::new("Physics", "NOPE"),
            &files(&["a.pdf"]),
        )
        .await
        .expect_err("404 must fail");

        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert_eq!(extract_error_message(&err), "Paper code not found");
    }
}
