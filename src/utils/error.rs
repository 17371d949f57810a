use std::fmt;
use thiserror::Error;

/// 影像生成 API 失敗的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BillingHardLimit,
    Authentication,
    AccessDenied,
    BadRequest,
    InvalidResponse,
    Transient,
}

impl ApiErrorKind {
    /// 依 HTTP 狀態碼與錯誤訊息判斷失敗類型
    ///
    /// 順序有意義：帳單上限優先於一般 4xx 判斷，`rate limit` 字樣的 400 視為暫時性錯誤。
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let text = message.to_lowercase();

        if text.contains("billing hard limit") || text.contains("billing_hard_limit_reached") {
            return Self::BillingHardLimit;
        }
        if status == Some(401) || text.contains("invalid api key") || text.contains("unauthorized")
        {
            return Self::Authentication;
        }
        if status == Some(403) || text.contains("must be verified") || text.contains("access denied")
        {
            return Self::AccessDenied;
        }
        if (status == Some(400) || text.contains("bad request")) && !text.contains("rate limit") {
            return Self::BadRequest;
        }
        Self::Transient
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BillingHardLimit => "billing hard limit",
            Self::Authentication => "authentication",
            Self::AccessDenied => "access denied",
            Self::BadRequest => "bad request",
            Self::InvalidResponse => "invalid response",
            Self::Transient => "transient",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image API error ({kind}): {message}")]
    ApiError {
        kind: ApiErrorKind,
        status: Option<u16>,
        message: String,
    },

    #[error("Frame {index} failed: {source}")]
    FrameError {
        index: u32,
        #[source]
        source: Box<AppError>,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Scene processing error: {message}")]
    ProcessingError { message: String },

    #[error("Video encoding failed: {message}")]
    EncodingError { message: String },

    #[error("Preflight step '{step}' failed with exit code {code}")]
    PreflightError { step: String, code: i32 },
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Configuration,
    Data,
    Encoding,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 對應 CLI 的離開碼
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl AppError {
    pub fn api(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::ApiError {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn for_frame(self, index: u32) -> Self {
        match self {
            AppError::FrameError { .. } => self,
            other => AppError::FrameError {
                index,
                source: Box::new(other),
            },
        }
    }

    /// 取得最內層的錯誤（剝除 frame 包裝）
    pub fn root(&self) -> &AppError {
        match self {
            AppError::FrameError { source, .. } => source.root(),
            other => other,
        }
    }

    /// 若為影像 API 錯誤則回傳其分類，網路錯誤視為暫時性
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self.root() {
            AppError::ApiError { kind, .. } => Some(*kind),
            AppError::HttpError(_) => Some(ApiErrorKind::Transient),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.api_kind().is_some_and(|kind| kind.is_retryable())
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            AppError::HttpError(_) => ErrorCategory::Network,
            AppError::ApiError { .. } => ErrorCategory::Api,
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. }
            | AppError::PreflightError { .. } => ErrorCategory::Configuration,
            AppError::SerializationError(_) | AppError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            AppError::EncodingError { .. } => ErrorCategory::Encoding,
            AppError::IoError(_) | AppError::FrameError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.root() {
            AppError::HttpError(_) => ErrorSeverity::Medium,
            AppError::ApiError { kind, .. } if kind.is_retryable() => ErrorSeverity::Medium,
            AppError::ApiError { .. } => ErrorSeverity::High,
            AppError::IoError(_) | AppError::EncodingError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.root() {
            AppError::ApiError { kind, .. } => match kind {
                ApiErrorKind::BillingHardLimit => {
                    "Increase your monthly limit, wait for the billing cycle reset, or use another key"
                        .to_string()
                }
                ApiErrorKind::Authentication => "Check OPENAI_API_KEY".to_string(),
                ApiErrorKind::AccessDenied => "Verify your organization and enable billing for this project; \
                     ensure the API key belongs to a project with model access; \
                     optionally set OPENAI_ORG_ID / OPENAI_PROJECT"
                    .to_string(),
                ApiErrorKind::BadRequest => {
                    "Check your 'size' (e.g., 1024x1024) and prompt contents".to_string()
                }
                ApiErrorKind::InvalidResponse => {
                    "The API answered without image data; retry later or check the API base URL"
                        .to_string()
                }
                ApiErrorKind::Transient => {
                    "The API is busy or unreachable; wait and re-run with --skip-existing".to_string()
                }
            },
            AppError::HttpError(_) => {
                "Check your network connection and the API base URL".to_string()
            }
            AppError::ConfigError { .. }
            | AppError::ConfigValidationError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => {
                "Review the command-line flags and the settings file".to_string()
            }
            AppError::ProcessingError { .. } | AppError::SerializationError(_) => {
                "Check the prompts file: it must be a JSON list of scenes with 'index' and 'prompt_text'"
                    .to_string()
            }
            AppError::EncodingError { .. } => {
                "Make sure ffmpeg is installed and the frames are valid images".to_string()
            }
            AppError::PreflightError { .. } => {
                "Fix formatting and lint issues and re-run, or pass --no-preflight".to_string()
            }
            AppError::IoError(_) | AppError::FrameError { .. } => {
                "Check file permissions and available disk space".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        let frame = match self {
            AppError::FrameError { index, .. } => Some(*index),
            _ => None,
        };

        match (self.root(), frame) {
            (AppError::ApiError { kind, .. }, _) => match kind {
                ApiErrorKind::BillingHardLimit => "Billing hard limit reached. Aborting.".to_string(),
                ApiErrorKind::Authentication => {
                    "Authentication error calling OpenAI. Check OPENAI_API_KEY. Aborting.".to_string()
                }
                ApiErrorKind::AccessDenied => "Access denied for gpt-image-1. Aborting.".to_string(),
                ApiErrorKind::BadRequest => match frame {
                    Some(index) => format!("Bad request for frame {}: {}", index, self.root()),
                    None => format!("Bad request: {}", self.root()),
                },
                _ => self.to_string(),
            },
            (root, Some(index)) => format!("Image generation failed for scene {}: {}", index, root),
            (root, None) => root.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_message() {
        assert_eq!(
            ApiErrorKind::classify(Some(400), "Billing hard limit has been reached"),
            ApiErrorKind::BillingHardLimit
        );
        assert_eq!(
            ApiErrorKind::classify(None, "error code: billing_hard_limit_reached"),
            ApiErrorKind::BillingHardLimit
        );
        assert_eq!(
            ApiErrorKind::classify(None, "Incorrect API key provided: Invalid API key"),
            ApiErrorKind::Authentication
        );
        assert_eq!(
            ApiErrorKind::classify(
                None,
                "Your organization must be verified to use the model `gpt-image-1`."
            ),
            ApiErrorKind::AccessDenied
        );
    }

    #[test]
    fn test_classify_by_status() {
        assert_eq!(ApiErrorKind::classify(Some(401), ""), ApiErrorKind::Authentication);
        assert_eq!(ApiErrorKind::classify(Some(403), ""), ApiErrorKind::AccessDenied);
        assert_eq!(ApiErrorKind::classify(Some(400), "invalid size"), ApiErrorKind::BadRequest);
        assert_eq!(ApiErrorKind::classify(Some(429), "slow down"), ApiErrorKind::Transient);
        assert_eq!(ApiErrorKind::classify(Some(503), ""), ApiErrorKind::Transient);
    }

    #[test]
    fn test_rate_limit_wording_is_not_a_bad_request() {
        assert_eq!(
            ApiErrorKind::classify(Some(400), "Rate limit exceeded"),
            ApiErrorKind::Transient
        );
    }

    #[test]
    fn test_frame_wrapping_keeps_classification() {
        let err = AppError::api(ApiErrorKind::BadRequest, Some(400), "bad size").for_frame(7);
        assert_eq!(err.api_kind(), Some(ApiErrorKind::BadRequest));
        assert!(!err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().starts_with("Bad request for frame 7"));

        let rewrapped = err.for_frame(9);
        assert!(matches!(rewrapped, AppError::FrameError { index: 7, .. }));
    }

    #[test]
    fn test_severity_exit_codes() {
        let transient = AppError::api(ApiErrorKind::Transient, Some(500), "boom");
        assert_eq!(transient.severity().exit_code(), 2);

        let encoding = AppError::EncodingError {
            message: "ffmpeg exited".to_string(),
        };
        assert_eq!(encoding.severity().exit_code(), 3);
        assert_eq!(encoding.category(), ErrorCategory::Encoding);
    }
}
