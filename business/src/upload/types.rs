//! Data carried through the upload pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use ustr::Ustr;

use crate::error::ApiError;

/// Content type used when a file declares none.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Subject and paper code a batch is filed under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingKey {
    pub subject_name: String,
    pub paper_code: String,
}

impl GroupingKey {
    pub fn new(subject_name: impl Into<String>, paper_code: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            paper_code: paper_code.into(),
        }
    }
}

/// Where the bytes of a file live on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentHandle {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl ContentHandle {
    /// Load the whole payload. Path handles are read on the blocking pool.
    pub async fn read(&self) -> Result<Vec<u8>, ApiError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Path(path) => tokio::fs::read(path).await.map_err(|err| {
                log::error!("Reading {} failed: {err}", path.display());
                let name = path.file_name().map_or_else(
                    || path.display().to_string(),
                    |name| name.to_string_lossy().into_owned(),
                );
                ApiError::Io(format!("Could not read {name}."))
            }),
        }
    }
}

/// A file selected for upload. Immutable once handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: Option<String>,
    pub content: ContentHandle,
    /// Declared size in bytes, if the source knew it.
    pub size: Option<u64>,
}

impl FileDescriptor {
    pub fn from_bytes(name: impl Into<String>, mime_type: Option<String>, data: Vec<u8>) -> Self {
        let size = u64::try_from(data.len()).ok();
        Self {
            name: name.into(),
            mime_type,
            content: ContentHandle::Bytes(data),
            size,
        }
    }

    pub fn from_path(
        name: impl Into<String>,
        mime_type: Option<String>,
        path: impl Into<PathBuf>,
        size: Option<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type,
            content: ContentHandle::Path(path.into()),
            size,
        }
    }

    /// Declared MIME type, or [`FALLBACK_CONTENT_TYPE`] when it is missing
    /// or not a `type/subtype` media type.
    pub fn content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .map(str::trim)
            .filter(|mime| is_media_type(mime))
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}

/// `type/subtype` with RFC 7230 token characters, parameters allowed.
fn is_media_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };
    let is_token = |part: &str| {
        !part.is_empty()
            && part
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
    };
    is_token(kind) && is_token(subtype)
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of the presigned-upload response, as sent by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresignedUpload {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub object_key: Option<String>,
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Presigned multipart POST target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartDestination {
    pub base_url: String,
    /// Server-issued form fields in server order.
    pub fields: Vec<(String, String)>,
    pub object_key: Option<String>,
    /// Where the object can be read once stored.
    pub url: String,
    pub file_name: Option<String>,
}

/// Presigned PUT target; the same URL is written and later read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectPutDestination {
    pub url: String,
    pub object_key: Option<String>,
    pub file_name: Option<String>,
}

/// Server-issued write target for exactly one file of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDestination {
    Multipart(MultipartDestination),
    DirectPut(DirectPutDestination),
}

impl UploadDestination {
    /// URL the object is readable at after a successful transfer.
    pub fn final_url(&self) -> &str {
        match self {
            Self::Multipart(dest) => &dest.url,
            Self::DirectPut(dest) => &dest.url,
        }
    }

    pub fn object_key(&self) -> Option<&str> {
        match self {
            Self::Multipart(dest) => dest.object_key.as_deref(),
            Self::DirectPut(dest) => dest.object_key.as_deref(),
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

fn field_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl From<PresignedUpload> for UploadDestination {
    /// Multipart when the server sent a POST URL and at least one field,
    /// direct PUT otherwise.
    fn from(upload: PresignedUpload) -> Self {
        let PresignedUpload {
            base_url,
            fields,
            object_key,
            url,
            file_name,
        } = upload;

        match (base_url, fields) {
            (Some(base_url), Some(fields)) if !fields.is_empty() && !base_url.is_empty() => {
                Self::Multipart(MultipartDestination {
                    base_url,
                    fields: fields
                        .into_iter()
                        .map(|(name, value)| (name, field_value(value)))
                        .collect(),
                    object_key,
                    url,
                    file_name,
                })
            }
            _ => Self::DirectPut(DirectPutDestination {
                url,
                object_key,
                file_name,
            }),
        }
    }
}

/// Confirmation of one stored object, sent to the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileMetadata {
    pub file_name: String,
    pub s3_url: String,
    /// Declared size, or 0 when the descriptor had none.
    pub file_size: u64,
    pub mime_type: String,
}

/// Evaluation state of a registered file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

/// The backend's durable record of an uploaded file.
///
/// Only the ids and timestamp are required. Everything else reads a missing
/// or `null` value as its default, so one sparse record never fails a batch
/// the backend already stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: Ustr,
    pub paper_code_id: Ustr,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub s3_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: FileStatus,
    #[serde(default)]
    pub evaluation_result: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evaluation_count: u32,
    /// ISO 8601 timestamp.
    pub created_at: Ustr,
    #[serde(default)]
    pub subject_name: Option<Ustr>,
    #[serde(default)]
    pub paper_code: Option<Ustr>,
    #[serde(default)]
    pub code: Option<Ustr>,
}

/// Subject/paper code echo returned by registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperCode {
    pub paper_code_id: Ustr,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub paper_code: String,
    #[serde(default)]
    pub code: Option<Ustr>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<Ustr>,
}
