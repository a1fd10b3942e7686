// Outbound HTTP plumbing. `Transport` is the seam between request
// construction and the wire so the rest of the client can be exercised
// against an in-process mock; `ReqwestTransport` is the production
// implementation; `HttpClient` is the single point every service request
// goes through (bearer token, 401 interception, error mapping).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, ClientError};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A file submitted as multipart form data under the `file` field.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(FilePayload),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Executes one request. Implementations perform no retries and no
/// response interpretation beyond producing status and body.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError>;
}

/// Production transport over a pooled `reqwest` client with a fixed
/// request timeout.
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Init(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            client,
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(file) => {
                let part = reqwest::multipart::Part::bytes(file.bytes.to_vec())
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)
                    .map_err(|err| ApiError::Decode(format!("Invalid mime type: {}", err)))?;
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ApiError::Timeout(self.timeout_ms)
            } else {
                ApiError::Network(err.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(RawResponse { status, body })
    }
}

/// Percent-encodes query parameters and joins them. Callers pass only
/// defined parameters; unset keys never reach this function.
pub fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

type AuthExpiredHandler = Arc<dyn Fn() + Send + Sync>;

/// Single point of outbound request construction and cross-cutting
/// response handling.
///
/// On any 401 the session store is cleared and the registered
/// auth-expired handler invoked before the error is returned; the
/// transport itself never navigates anywhere.
pub struct HttpClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    auth_expired: RwLock<Option<AuthExpiredHandler>>,
}

impl HttpClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session,
            auth_expired: RwLock::new(None),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn on_auth_expired(&self, handler: AuthExpiredHandler) {
        *self.auth_expired.write() = Some(handler);
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, encode_query(query))
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: RequestBody,
    ) -> Result<RawResponse, ApiError> {
        let url = self.url(path, query);
        tracing::debug!("{} {}", method.as_str(), url);

        let request = ApiRequest {
            method,
            url,
            bearer: self.session.token(),
            body,
        };
        let response = self.transport.execute(request).await?;

        if response.status == 401 {
            tracing::warn!("Received 401 from {}, clearing session", path);
            self.session.clear();
            let handler = self.auth_expired.read().clone();
            if let Some(handler) = handler {
                handler();
            }
            return Err(ApiError::AuthExpired);
        }

        if !(200..300).contains(&response.status) {
            let message = extract_message(&response.body, response.status);
            tracing::warn!("{} {} failed: {} {}", method.as_str(), path, response.status, message);
            return Err(ApiError::Response {
                status_code: response.status,
                message,
            });
        }

        Ok(response)
    }

    fn json_body<B: Serialize>(body: &B) -> Result<RequestBody, ApiError> {
        serde_json::to_value(body)
            .map(RequestBody::Json)
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::Get, path, &[], RequestBody::Empty).await?;
        decode(&response.body)
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.send(Method::Get, path, query, RequestBody::Empty).await?;
        decode(&response.body)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::json_body(body)?;
        let response = self.send(Method::Post, path, &[], body).await?;
        decode(&response.body)
    }

    /// POST with no request body and no response body required, e.g. a
    /// booking cancellation.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::Post, path, &[], RequestBody::Empty).await?;
        Ok(())
    }

    /// POST with a body whose response body is irrelevant.
    pub async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = Self::json_body(body)?;
        self.send(Method::Post, path, &[], body).await?;
        Ok(())
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::json_body(body)?;
        let response = self.send(Method::Put, path, &[], body).await?;
        decode(&response.body)
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::json_body(body)?;
        let response = self.send(Method::Patch, path, &[], body).await?;
        decode(&response.body)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::Delete, path, &[], RequestBody::Empty).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        file: FilePayload,
    ) -> Result<T, ApiError> {
        let response = self
            .send(Method::Post, path, &[], RequestBody::Multipart(file))
            .await?;
        decode(&response.body)
    }
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Pulls the server-provided `message` out of an error body. Validation
/// errors may carry an array of messages; those are joined. Anything
/// unparseable falls back to a status-derived message.
fn extract_message(body: &Bytes, status: u16) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        match value.get("message") {
            Some(serde_json::Value::String(message)) => return message.clone(),
            Some(serde_json::Value::Array(messages)) => {
                let joined: Vec<String> = messages
                    .iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect();
                if !joined.is_empty() {
                    return joined.join(", ");
                }
            }
            _ => {}
        }
    }
    format!("Request failed with status {}", status)
}

// In-process mock transport for tests, in place of a live API.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Records every request and serves canned responses registered per
    /// (method, path). Routes may be registered with or without a query
    /// string; an exact path+query match wins over a path-only match.
    /// Unmatched requests get a 404.
    pub struct MockTransport {
        routes: Mutex<HashMap<(Method, String), RawResponse>>,
        requests: Mutex<Vec<ApiRequest>>,
        delay: Mutex<Option<Duration>>,
        failure: Mutex<Option<ApiError>>,
    }

    impl MockTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                routes: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                delay: Mutex::new(None),
                failure: Mutex::new(None),
            })
        }

        pub fn respond_json(
            &self,
            method: Method,
            path: &str,
            status: u16,
            body: serde_json::Value,
        ) {
            self.routes.lock().insert(
                (method, path.to_string()),
                RawResponse {
                    status,
                    body: Bytes::from(body.to_string()),
                },
            );
        }

        /// Artificial latency before every response, to hold requests
        /// in flight long enough for coalescing tests.
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }

        /// Every subsequent request fails at the transport level, before
        /// any status handling runs. Stands in for a timed-out or refused
        /// connection.
        pub fn fail_with(&self, error: ApiError) {
            *self.failure.lock() = Some(error);
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }

        /// Number of executed requests whose path (query excluded)
        /// equals `path`.
        pub fn calls_to(&self, path: &str) -> usize {
            self.requests
                .lock()
                .iter()
                .filter(|request| strip_base(strip_query(path_of(&request.url))) == path)
                .count()
        }
    }

    /// Path and query of a full URL, e.g. "/tours?page=1".
    pub fn path_of(url: &str) -> &str {
        let after_scheme = match url.find("://") {
            Some(idx) => &url[idx + 3..],
            None => url,
        };
        match after_scheme.find('/') {
            Some(idx) => &after_scheme[idx..],
            None => "/",
        }
    }

    fn strip_query(path: &str) -> &str {
        match path.find('?') {
            Some(idx) => &path[..idx],
            None => path,
        }
    }

    /// The test base URLs mount the API under `/api`; routes are
    /// registered relative to that prefix, so it is stripped before
    /// matching.
    fn strip_base(path: &str) -> &str {
        if path.starts_with("/api/") {
            &path[4..]
        } else {
            path
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
            self.requests.lock().push(request.clone());

            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(error) = self.failure.lock().clone() {
                return Err(error);
            }

            let path_and_query = strip_base(path_of(&request.url)).to_string();
            let path_only = strip_query(&path_and_query).to_string();

            let routes = self.routes.lock();
            let response = routes
                .get(&(request.method, path_and_query))
                .or_else(|| routes.get(&(request.method, path_only)))
                .cloned();
            drop(routes);

            Ok(response.unwrap_or(RawResponse {
                status: 404,
                body: Bytes::from(r#"{"message":"Not found"}"#),
            }))
        }
    }
}
