//! Thin HTTP client over reqwest with owned, cloneable responses.
//!
//! Every call goes through [`RequestBuilder::send`], which hands back a
//! [`Response`] holding only plain data (status, lowercased headers, body
//! bytes). Commands can move it across tasks and inspect it after the
//! connection is gone.
//!
//! Transport failures are classified into [`HttpErrorKind`] so callers can
//! tell a missing connection from a timeout without string matching.

use std::collections::HashMap;
use std::time::Duration;

/// HTTP method for requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

/// A simplified HTTP response that contains only Send-safe data.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers (lowercased keys)
    pub headers: HashMap<String, String>,
    /// Response body as bytes
    pub body: Vec<u8>,
}

impl Response {
    /// Returns true if the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Attempt to deserialize the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Coarse transport failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    /// The server could not be reached at all.
    Connect,
    /// The request did not finish within its timeout.
    Timeout,
    /// Anything else (TLS, malformed URL, body read failure, ...).
    Other,
}

/// HTTP client error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("HTTP error: {message}")]
pub struct HttpError {
    pub kind: HttpErrorKind,
    pub message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            HttpErrorKind::Timeout
        } else if err.is_connect() {
            HttpErrorKind::Connect
        } else {
            HttpErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        data: Vec<u8>,
    },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Ordered multipart form.
///
/// Parts are written to the wire in exactly the order they were added.
/// Presigned object-store POSTs sign over the field sequence, so callers
/// rely on this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    fn into_reqwest(self) -> HttpResult<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    content_type,
                    data,
                } => {
                    let part = reqwest::multipart::Part::bytes(data)
                        .file_name(file_name)
                        .mime_str(&content_type)
                        .map_err(HttpError::from)?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[derive(Debug, Clone)]
enum Body {
    Bytes(Vec<u8>),
    Multipart(MultipartForm),
}

/// A builder for constructing HTTP requests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    query: Vec<(String, String)>,
    body: Option<Body>,
    timeout: Option<Duration>,
}

impl RequestBuilder {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Bound the whole request, including reading the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the request body as raw bytes.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Body::Bytes(body.into()));
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let json_bytes = serde_json::to_vec(value)?;
        self.body = Some(Body::Bytes(json_bytes));
        self.headers
            .insert("content-type".to_owned(), "application/json".to_owned());
        Ok(self)
    }

    /// Set a multipart body. The boundary header is generated on send.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Send the request and collect the whole response.
    pub async fn send(self) -> HttpResult<Response> {
        let client = reqwest::Client::new();

        let mut request = match self.method {
            Method::Get => client.get(&self.url),
            Method::Post => client.post(&self.url),
            Method::Put => client.put(&self.url),
        };

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if !self.query.is_empty() {
            request = request.query(&self.query);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request = match self.body {
            Some(Body::Bytes(bytes)) => request.body(bytes),
            Some(Body::Multipart(form)) => request.multipart(form.into_reqwest()?),
            None => request,
        };

        let response = request.send().await?;

        // Extract status and headers before consuming the response
        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), v.to_owned());
            }
        }

        let body = response.bytes().await?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Entry point for building requests.
///
/// # Example
///
/// ```ignore
/// use examscan_business::http::Client;
///
/// async fn fetch_history() {
///     let response = Client::get("https://api.example.com/api/file-history")
///         .header("Authorization", "Bearer token")
///         .query("limit", 10)
///         .send()
///         .await
///         .unwrap();
///
///     if response.is_success() {
///         let page: FileHistoryPage = response.json().unwrap();
///     }
/// }
/// ```
pub struct Client;

impl Client {
    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(Method::Post, url)
    }

    /// Create a PUT request.
    pub fn put(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(Method::Put, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_response_is_success() {
        let ok = Response {
            status: 204,
            headers: HashMap::new(),
            body: Vec::new(),
        };
        assert!(ok.is_success());

        let not_found = Response {
            status: 404,
            headers: HashMap::new(),
            body: Vec::new(),
        };
        assert!(!not_found.is_success());
    }

    #[test]
    fn test_response_header_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("etag".to_owned(), "\"abc\"".to_owned());

        let response = Response {
            status: 200,
            headers,
            body: Vec::new(),
        };

        assert_eq!(response.header("ETag"), Some("\"abc\""));
        assert_eq!(response.header("ETAG"), Some("\"abc\""));
    }

    #[test]
    fn test_multipart_form_keeps_insertion_order() {
        let form = MultipartForm::new()
            .text("key", "uploads/a.pdf")
            .text("policy", "p")
            .file("file", "a.pdf", "application/pdf", b"%PDF".to_vec())
            .text("late", "x");

        let names: Vec<&str> = form.parts().iter().map(FormPart::name).collect();
        assert_eq!(names, vec!["key", "policy", "file", "late"]);
    }

    #[test]
    fn test_request_builder_json_sets_content_type() {
        #[derive(serde::Serialize)]
        struct Payload {
            limit: u32,
        }

        let builder = Client::post("https://example.com")
            .json(&Payload { limit: 10 })
            .expect("json body should serialize");

        assert_eq!(
            builder.headers.get("content-type"),
            Some(&"application/json".to_owned())
        );
        assert!(builder.body.is_some());
    }

    #[tokio::test]
    async fn test_send_passes_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let response = Client::get(format!("{}/items", server.uri()))
            .query("limit", 10)
            .send()
            .await
            .expect("mock server should answer");

        assert!(response.is_success());
        assert_eq!(response.body, b"ok");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connect_error() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = Client::get(format!("http://{addr}/"))
            .send()
            .await
            .expect_err("closed port should fail");

        assert_eq!(err.kind, HttpErrorKind::Connect);
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = Client::get(server.uri())
            .timeout(Duration::from_millis(50))
            .send()
            .await
            .expect_err("request should time out");

        assert_eq!(err.kind, HttpErrorKind::Timeout);
    }
}
