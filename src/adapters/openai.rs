use crate::config::credentials::Credentials;
use crate::config::settings::ApiSettings;
use crate::domain::model::ImageRequest;
use crate::domain::ports::ImageGenerator;
use crate::utils::error::{ApiErrorKind, AppError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    r#type: Option<String>,
}

/// OpenAI 相容的影像生成 API 客戶端
pub struct OpenAiImageClient {
    client: Client,
    base_url: String,
    model: String,
    credentials: Credentials,
}

impl OpenAiImageClient {
    pub fn new(settings: &ApiSettings, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        let mut credentials = credentials;
        if credentials.organization.is_none() {
            credentials.organization = settings.organization.clone();
        }
        if credentials.project.is_none() {
            credentials.project = settings.project.clone();
        }

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            credentials,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }

    /// 把錯誤回應整理成可分類的訊息（包含狀態碼、錯誤代碼與說明）
    fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
        let detail = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => {
                let parts: Vec<String> = [
                    envelope.error.code,
                    envelope.error.r#type,
                    envelope.error.message,
                ]
                .into_iter()
                .flatten()
                .collect();
                parts.join(": ")
            }
            Err(_) => body.trim().to_string(),
        };

        format!("Error code: {} - {}", status.as_u16(), detail)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>> {
        let payload = GenerationRequest {
            model: &self.model,
            prompt: &request.prompt,
            size: &request.size,
            n: 1,
        };

        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.credentials.api_key)
            .json(&payload);
        if let Some(org) = &self.credentials.organization {
            builder = builder.header("OpenAI-Organization", org);
        }
        if let Some(project) = &self.credentials.project {
            builder = builder.header("OpenAI-Project", project);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let status = e.status().map(|s| s.as_u16());
                return Err(AppError::api(
                    ApiErrorKind::classify(status, &e.to_string()),
                    status,
                    e.to_string(),
                ));
            }
        };

        let status = response.status();
        tracing::debug!("Image API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = Self::describe_failure(status, &body);
            return Err(AppError::api(
                ApiErrorKind::classify(Some(status.as_u16()), &message),
                Some(status.as_u16()),
                message,
            ));
        }

        let body: GenerationResponse = response.json().await.map_err(|e| {
            AppError::api(
                ApiErrorKind::InvalidResponse,
                Some(status.as_u16()),
                format!("Malformed response body: {}", e),
            )
        })?;

        let encoded = body
            .data
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .ok_or_else(|| {
                AppError::api(
                    ApiErrorKind::InvalidResponse,
                    Some(status.as_u16()),
                    "Response contained no base64 image data",
                )
            })?;

        STANDARD.decode(encoded.as_bytes()).map_err(|e| {
            AppError::api(
                ApiErrorKind::InvalidResponse,
                Some(status.as_u16()),
                format!("Invalid base64 image data: {}", e),
            )
        })
    }
}
