//! The remote boundary: [`JobClient`] and its HTTP implementation.
//!
//! The workflow only ever talks to an `Arc<dyn JobClient>`. Tests hand in
//! scripted mocks; production uses [`HttpJobClient`]. Every operation returns
//! `Ok(None)` when the backend answered successfully without a JSON body and
//! `Err(ApiError)` with a human-readable message otherwise.
//!
//! ## Response contract
//!
//! | Response | Result |
//! |----------|--------|
//! | non-2xx, body `"job not found"` | `Err(Status { message: "job not found" })` |
//! | non-2xx, empty body | `Err(Status { message: <operation default> })` |
//! | 2xx, `content-type` without `application/json` | `Ok(None)` |
//! | 2xx JSON | `Ok(Some(value))` |

use crate::config::ClientConfig;
use crate::error::{ApiError, PackDimError};
use crate::input::SelectedFile;
use crate::model::{DimensionsUpdate, OcrItem};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const MSG_CREATE_FAILED: &str = "failed to create analysis job.";
pub const MSG_STATUS_FAILED: &str = "failed to fetch job status.";
pub const MSG_RESULT_FAILED: &str = "failed to fetch analysis result.";
pub const MSG_UPDATE_FAILED: &str = "failed to save dimensions.";
pub const MSG_OCR_FAILED: &str = "failed to extract OCR text.";
pub const MSG_MAP_FAILED: &str = "failed to map dimensions.";

/// Result of every remote operation: an optional opaque JSON body.
pub type ApiResult = Result<Option<Value>, ApiError>;

/// Body of the dimension-mapping call.
#[derive(Debug, Clone, Serialize)]
pub struct MapDimensionsRequest {
    /// Normalized OCR items.
    pub ocr: Vec<OcrItem>,
    /// The untouched OCR response, for server-side diagnostics.
    pub raw: Value,
}

/// Remote operations the analysis workflow needs.
///
/// Implementations must be `Send + Sync`; the controller clones the `Arc`
/// into dispatched poll ticks.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Upload the image and create an asynchronous analysis job.
    async fn create_job(&self, file: &SelectedFile) -> ApiResult;

    /// Current status of a job.
    async fn get_job(&self, job_id: &str) -> ApiResult;

    /// Final analysis result of a finished job.
    async fn get_job_result(&self, job_id: &str) -> ApiResult;

    /// Persist user-corrected dimensions.
    async fn update_dimensions(&self, job_id: &str, dimensions: DimensionsUpdate) -> ApiResult;

    /// Upload the image for synchronous OCR.
    async fn extract_ocr(&self, file: &SelectedFile) -> ApiResult;

    /// Map OCR items to package dimensions.
    async fn map_dimensions(&self, request: &MapDimensionsRequest) -> ApiResult;
}

/// [`JobClient`] over the backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpJobClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpJobClient {
    pub fn new(config: &ClientConfig) -> Result<Self, PackDimError> {
        let timeout = config.request_timeout();
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let http = builder
            .build()
            .map_err(|e| PackDimError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// `/api/v1/jobs/{job_id}/{tail..}` with the id escaped as one path segment.
    fn job_url(&self, job_id: &str, tail: &[&str]) -> Result<Url, ApiError> {
        let base = self.url("/api/v1/jobs");
        let mut url = Url::parse(&base).map_err(|e| transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| transport(format!("backend URL cannot carry a path: {base}")))?
            .push(job_id)
            .extend(tail);
        Ok(url)
    }

    fn upload_form(file: &SelectedFile) -> Result<Form, ApiError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| ApiError::Io {
                message: format!("invalid MIME type '{}': {e}", file.mime_type),
            })?;
        Ok(Form::new().part("file", part))
    }

    async fn send(&self, request: reqwest::RequestBuilder, default_message: &str) -> ApiResult {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(
            "HTTP {} ({}), {} bytes",
            status.as_u16(),
            content_type,
            body.len()
        );

        let result = classify_response(status.as_u16(), &content_type, &body, default_message);
        if let Err(ref e) = result {
            warn!("Backend call failed: {}", e);
        }
        result
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout {
                secs: self.config.request_timeout_secs,
            }
        } else {
            ApiError::Transport {
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl JobClient for HttpJobClient {
    async fn create_job(&self, file: &SelectedFile) -> ApiResult {
        info!("Creating job for {} ({} bytes)", file.name, file.size);
        let form = Self::upload_form(file)?;
        let request = self.http.post(self.url("/api/v1/jobs")).multipart(form);
        self.send(request, MSG_CREATE_FAILED).await
    }

    async fn get_job(&self, job_id: &str) -> ApiResult {
        debug!("Polling job {}", job_id);
        let request = self.http.get(self.job_url(job_id, &[])?);
        self.send(request, MSG_STATUS_FAILED).await
    }

    async fn get_job_result(&self, job_id: &str) -> ApiResult {
        info!("Fetching result for job {}", job_id);
        let request = self.http.get(self.job_url(job_id, &["result"])?);
        self.send(request, MSG_RESULT_FAILED).await
    }

    async fn update_dimensions(&self, job_id: &str, dimensions: DimensionsUpdate) -> ApiResult {
        info!("Saving dimensions for job {}", job_id);
        let request = self
            .http
            .patch(self.job_url(job_id, &["dimensions"])?)
            .json(&dimensions);
        self.send(request, MSG_UPDATE_FAILED).await
    }

    async fn extract_ocr(&self, file: &SelectedFile) -> ApiResult {
        info!("Running OCR on {} ({} bytes)", file.name, file.size);
        let form = Self::upload_form(file)?;
        let request = self
            .http
            .post(self.url("/api/v1/ocr/extract"))
            .multipart(form);
        self.send(request, MSG_OCR_FAILED).await
    }

    async fn map_dimensions(&self, request: &MapDimensionsRequest) -> ApiResult {
        info!("Mapping {} OCR items to dimensions", request.ocr.len());
        let builder = self
            .http
            .post(self.url("/api/v1/ocr/map-dimensions"))
            .json(request);
        self.send(builder, MSG_MAP_FAILED).await
    }
}

fn transport(message: String) -> ApiError {
    ApiError::Transport { message }
}

/// Apply the response contract to an already-read response.
pub fn classify_response(
    status: u16,
    content_type: &str,
    body: &str,
    default_message: &str,
) -> ApiResult {
    if !(200..300).contains(&status) {
        let message = if body.is_empty() {
            default_message.to_string()
        } else {
            body.to_string()
        };
        return Err(ApiError::Status { status, message });
    }

    if !content_type.contains("application/json") {
        return Ok(None);
    }

    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| ApiError::Decode {
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_body_becomes_message() {
        let result = classify_response(404, "text/plain", "job not found", MSG_STATUS_FAILED);
        assert_eq!(
            result.unwrap_err(),
            ApiError::Status {
                status: 404,
                message: "job not found".into()
            }
        );
    }

    #[test]
    fn empty_error_body_uses_default() {
        let result = classify_response(500, "application/json", "", MSG_UPDATE_FAILED);
        assert_eq!(result.unwrap_err().to_string(), MSG_UPDATE_FAILED);
    }

    #[test]
    fn non_json_success_is_no_body() {
        assert_eq!(
            classify_response(200, "text/html", "<p>ok</p>", "x").unwrap(),
            None
        );
        assert_eq!(classify_response(204, "", "", "x").unwrap(), None);
    }

    #[test]
    fn json_success_parses() {
        let v = classify_response(
            201,
            "application/json; charset=utf-8",
            r#"{"job_id":"job-1","status":"processing"}"#,
            "x",
        )
        .unwrap();
        assert_eq!(v, Some(json!({"job_id": "job-1", "status": "processing"})));
    }

    #[test]
    fn bad_json_is_decode_error() {
        let result = classify_response(200, "application/json", "{nope", "x");
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }

    #[test]
    fn upload_form_rejects_garbage_mime() {
        let f = SelectedFile::new("x.png", "not a mime", vec![1]);
        assert!(HttpJobClient::upload_form(&f).is_err());
    }

    #[test]
    fn url_joins_base() {
        let config = ClientConfig::builder()
            .base_url("http://backend:9000/")
            .build()
            .unwrap();
        let client = HttpJobClient::new(&config).unwrap();
        assert_eq!(
            client.url("/api/v1/jobs"),
            "http://backend:9000/api/v1/jobs"
        );
    }

    #[test]
    fn job_url_escapes_id() {
        let client = HttpJobClient::new(&ClientConfig::default()).unwrap();
        let url = client.job_url("a/b?c#d", &["result"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/api/v1/jobs/a%2Fb%3Fc%23d/result"
        );
        let url = client.job_url("job-1", &[]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/api/v1/jobs/job-1");
    }
}
