//! Test utilities for driving the scanning commands against a mock backend.
//!
//! One [`MockServer`] plays both the examscan API and the object store:
//! destinations handed out by [`TestContext::mock_presign`] point back at it
//! under `/bucket/...`.
//!
//! # Example
//!
//! ```ignore
//! let mut test_ctx = TestContext::new().await;
//! test_ctx
//!     .mock_presign(vec![test_ctx.put_destination("a.pdf")])
//!     .await;
//! test_ctx.mock_put("a.pdf", 200).await;
//! test_ctx
//!     .mock_register(vec![sample_file_record("f-1", "a.pdf")], 1)
//!     .await;
//!
//! submit_upload(&mut test_ctx.ctx, sample_key(), vec![sample_pdf("a.pdf")]);
//! test_ctx.flush_and_wait().await;
//!
//! assert_eq!(test_ctx.ctx.compute::<UploadPipelineCompute>().progress, 100);
//! ```

use std::time::{Duration, Instant};

use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

use crate::{BusinessConfig, FileDescriptor, GroupingKey, SessionState, build_scanning_ctx};
use examscan_states::StateCtx;

pub const TEST_TOKEN: &str = "test_token";

/// Test context that holds a mock server and a configured `StateCtx`.
pub struct TestContext {
    pub mock_server: MockServer,
    pub ctx: StateCtx,
}

impl TestContext {
    pub async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = BusinessConfig::new(mock_server.uri());
        let ctx = build_scanning_ctx(config, SessionState::default());

        Self { mock_server, ctx }
    }

    pub fn set_authenticated(&mut self, token: &str) {
        self.ctx
            .update::<SessionState>(|session| session.set_token(Some(token.to_owned())));
    }

    /// Flush queued commands and wait until the store is idle.
    ///
    /// Follow-up commands enqueued by finished tasks are flushed too, so a
    /// successful upload also runs its history refresh before this returns.
    pub async fn flush_and_wait(&mut self) {
        let timeout = Duration::from_secs(5);
        let start = Instant::now();

        loop {
            self.ctx.sync_computes();
            self.ctx.flush_commands();

            if self.ctx.task_count() == 0 {
                break;
            }

            if start.elapsed() > timeout {
                panic!(
                    "Timed out waiting for pending tasks ({} still running)",
                    self.ctx.task_count()
                );
            }

            self.ctx.join_next_task().await;
        }

        self.ctx.sync_computes();
    }

    // =========================================================================
    // Destinations
    // =========================================================================

    /// A direct-PUT destination served by the mock object store.
    pub fn put_destination(&self, object: &str) -> Value {
        json!({
            "base_url": null,
            "fields": {},
            "object_key": format!("papers/{object}"),
            "url": format!("{}/bucket/{object}", self.mock_server.uri()),
            "file_name": object
        })
    }

    /// A multipart destination whose POST lands on `/bucket`.
    pub fn multipart_destination(&self, object: &str) -> Value {
        json!({
            "base_url": format!("{}/bucket", self.mock_server.uri()),
            "fields": {
                "key": format!("papers/{object}"),
                "x-amz-algorithm": "AWS4-HMAC-SHA256",
                "policy": "cG9saWN5",
                "x-amz-signature": "c2lnbmF0dXJl"
            },
            "object_key": format!("papers/{object}"),
            "url": format!("https://bucket.example/papers/{object}"),
            "file_name": object
        })
    }

    // =========================================================================
    // Mock endpoint helpers
    // =========================================================================

    pub async fn mock_presign(&self, uploads: Vec<Value>) {
        let response = ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "uploads": uploads
        }));

        Mock::given(method("POST"))
            .and(path("/api/files/presigned-upload"))
            .respond_with(response)
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_presign_error(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path("/api/files/presigned-upload"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_put(&self, object: &str, status: u16) {
        Mock::given(method("PUT"))
            .and(path(format!("/bucket/{object}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_multipart(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/bucket"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    /// Mock registration; `expected` pins how many times it may be called.
    pub async fn mock_register(&self, files: Vec<Value>, expected: u64) {
        let response = ResponseTemplate::new(200).set_body_json(json!({
            "files": files,
            "paper_code": sample_paper_code()
        }));

        Mock::given(method("POST"))
            .and(path("/api/files/file-upload"))
            .respond_with(response)
            .expect(expected)
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_register_error(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path("/api/files/file-upload"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_history(&self, records: Vec<Value>) {
        let total = records.len();
        let response = ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": records,
            "total": total,
            "limit": 10,
            "offset": 0
        }));

        Mock::given(method("GET"))
            .and(path("/api/file-history"))
            .respond_with(response)
            .mount(&self.mock_server)
            .await;
    }

    /// History endpoint that only answers authenticated calls.
    pub async fn mock_history_authenticated(&self, records: Vec<Value>) {
        let total = records.len();
        Mock::given(method("GET"))
            .and(path("/api/file-history"))
            .and(header("Authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": records,
                "total": total,
                "limit": 10,
                "offset": 0
            })))
            .expect(1)
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_history_error(&self, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/file-history"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }
}

pub fn sample_key() -> GroupingKey {
    GroupingKey::new("Physics", "PHY-101")
}

pub fn sample_pdf(name: &str) -> FileDescriptor {
    FileDescriptor::from_bytes(name, Some("application/pdf".to_owned()), b"%PDF-1.7 sheet".to_vec())
}

pub fn sample_image(name: &str) -> FileDescriptor {
    FileDescriptor::from_bytes(name, Some("image/jpeg".to_owned()), vec![0xFF, 0xD8, 0xFF, 0xE0])
}

pub fn sample_file_record(id: &str, file_name: &str) -> Value {
    json!({
        "file_id": id,
        "paper_code_id": "pc-1",
        "file_name": file_name,
        "s3_url": format!("https://bucket.example/papers/{file_name}"),
        "file_size": 14,
        "mime_type": "application/pdf",
        "status": "pending",
        "evaluation_result": null,
        "evaluation_count": 0,
        "created_at": "2025-03-01T10:00:00Z",
        "subject_name": "Physics",
        "paper_code": "PHY-101"
    })
}

pub fn sample_paper_code() -> Value {
    json!({
        "paper_code_id": "pc-1",
        "subject_name": "Physics",
        "paper_code": "PHY-101",
        "code": "PHY101",
        "description": null,
        "is_active": true,
        "created_at": "2025-01-01T00:00:00Z"
    })
}
