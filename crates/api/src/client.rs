//! REST client for the Wiro HTTP endpoints.
//!
//! Wraps task submission (`/Run`), detail, cancellation and kill calls
//! using [`reqwest`]. Catalogue and project queries live in
//! [`crate::catalog`]. Every call carries the auth headers configured with
//! [`WiroApi::with_headers`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wiro_core::inputs::looks_like_numeric;
use wiro_core::types::{ApiErrorItem, RunResponse, TaskDetailResponse};

use crate::error::ApiError;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.wiro.ai/v1";

/// HTTP client for the Wiro API.
#[derive(Debug, Clone)]
pub struct WiroApi {
    pub(crate) client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

/// One `/Run` input value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunInput {
    /// Sent as a plain text form field (also used for remote URLs).
    Text(String),
    /// Read from disk and sent as a file part named by its basename.
    File(PathBuf),
}

impl WiroApi {
    /// Create a new API client with its own connection pool.
    ///
    /// * `base_url` - e.g. `https://api.wiro.ai/v1`. A trailing `/` is trimmed.
    /// * `timeout` - whole-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        let base_url = match base_url.trim() {
            "" => DEFAULT_API_URL,
            url => url,
        };
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: HeaderMap::new(),
        }
    }

    /// Attach headers (normally auth) sent with every request.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// POST `body` as JSON and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit a task to `/Run/{owner}/{model}` as multipart form data.
    pub async fn run(
        &self,
        owner: &str,
        model: &str,
        inputs: &[(String, RunInput)],
    ) -> Result<RunResponse, ApiError> {
        let mut form = Form::new();
        for (key, input) in inputs {
            form = match input {
                RunInput::Text(value) => form.text(key.clone(), value.clone()),
                RunInput::File(path) => form.part(key.clone(), file_part(path).await?),
            };
        }

        tracing::debug!(owner, model, fields = inputs.len(), "Submitting task");

        let response = self
            .client
            .post(self.endpoint(&format!("/Run/{owner}/{model}")))
            .headers(self.headers.clone())
            .multipart(form)
            .send()
            .await?;

        let resp: RunResponse = Self::parse_response(response).await?;
        check_envelope("run", resp.result, &resp.errors)?;
        Ok(resp)
    }

    /// Query `/Task/Detail` by numeric id or socket token.
    pub async fn task_detail(&self, id_or_token: &str) -> Result<TaskDetailResponse, ApiError> {
        let body = if looks_like_numeric(id_or_token) {
            serde_json::json!({ "taskid": id_or_token })
        } else {
            serde_json::json!({ "tasktoken": id_or_token })
        };
        let resp: TaskDetailResponse = self.post_json("/Task/Detail", &body).await?;
        check_envelope("task detail", resp.result, &resp.errors)?;
        Ok(resp)
    }

    /// Ask the service to cancel a queued task.
    pub async fn cancel(&self, task_id: &str) -> Result<TaskDetailResponse, ApiError> {
        self.task_action("/Task/Cancel", "task cancel", task_id).await
    }

    /// Ask the service to kill a running task.
    pub async fn kill(&self, task_id: &str) -> Result<TaskDetailResponse, ApiError> {
        self.task_action("/Task/Kill", "task kill", task_id).await
    }

    // ---- private helpers ----

    async fn task_action(
        &self,
        path: &str,
        operation: &'static str,
        task_id: &str,
    ) -> Result<TaskDetailResponse, ApiError> {
        let body = serde_json::json!({ "taskid": task_id });
        let resp: TaskDetailResponse = self.post_json(path, &body).await?;
        check_envelope(operation, resp.result, &resp.errors)?;
        Ok(resp)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type,
    /// keeping the raw body on decode failure.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { source, body })
    }
}

/// A `result: false` envelope with errors is a remote failure.
pub(crate) fn check_envelope(
    operation: &'static str,
    result: bool,
    errors: &[ApiErrorItem],
) -> Result<(), ApiError> {
    match errors.first() {
        Some(first) if !result => Err(ApiError::Remote {
            operation,
            message: first.message.clone(),
        }),
        _ => Ok(()),
    }
}

async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}
