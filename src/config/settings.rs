use crate::core::retry::RetryPolicy;
use crate::utils::error::{AppError, Result};
use crate::utils::logger::DEFAULT_LOG_FILE;
use crate::utils::validation::{validate_path, validate_positive_number, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 未指定 `--config` 時嘗試載入的設定檔
pub const DEFAULT_SETTINGS_FILE: &str = "story-to-video.toml";

/// 工具層級設定（API、重試、日誌、影片編碼），全部欄位皆有預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub api: ApiSettings,
    pub retry: RetrySettings,
    pub logging: LoggingSettings,
    pub video: VideoSettings,
    pub credentials: CredentialSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub organization: Option<String>,
    pub project: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-image-1".to_string(),
            timeout_seconds: 120,
            organization: None,
            project: None,
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: Option<u32>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub ffmpeg: String,
    pub codec: String,
    pub pixel_format: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub env_file: PathBuf,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from("local.env"),
        }
    }
}

impl ToolSettings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 明確指定的檔案必須存在；預設檔案不存在時使用預設值
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_SETTINGS_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_ORG_ID})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            max_attempts: self.retry.max_attempts,
        }
    }
}

impl Validate for ToolSettings {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_positive_number("api.timeout_seconds", self.api.timeout_seconds as usize, 1)?;
        validate_positive_number("retry.initial_delay_ms", self.retry.initial_delay_ms as usize, 1)?;

        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(AppError::InvalidConfigValueError {
                field: "retry.max_delay_ms".to_string(),
                value: self.retry.max_delay_ms.to_string(),
                reason: "Must not be smaller than retry.initial_delay_ms".to_string(),
            });
        }

        if let Some(attempts) = self.retry.max_attempts {
            validate_positive_number("retry.max_attempts", attempts as usize, 1)?;
        }

        validate_path("logging.file", &self.logging.file.to_string_lossy())?;
        validate_path("credentials.env_file", &self.credentials.env_file.to_string_lossy())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = ToolSettings::from_toml_str("").unwrap();

        assert_eq!(settings.api.base_url, "https://api.openai.com/v1");
        assert_eq!(settings.api.model, "gpt-image-1");
        assert_eq!(settings.retry.initial_delay_ms, 1_000);
        assert_eq!(settings.retry.max_delay_ms, 60_000);
        assert!(settings.retry.max_attempts.is_none());
        assert_eq!(settings.logging.file, PathBuf::from("story-to-video/run.log"));
        assert_eq!(settings.video.codec, "libx264");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml_content = r#"
[api]
base_url = "http://localhost:9000/v1"
timeout_seconds = 30

[retry]
max_attempts = 5

[video]
ffmpeg = "/usr/local/bin/ffmpeg"
"#;

        let settings = ToolSettings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.api.base_url, "http://localhost:9000/v1");
        assert_eq!(settings.api.model, "gpt-image-1");
        assert_eq!(settings.api.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.retry_policy().max_attempts, Some(5));
        assert_eq!(settings.video.ffmpeg, "/usr/local/bin/ffmpeg");
        assert_eq!(settings.video.pixel_format, "yuv420p");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SORA_TEST_ORG", "org-123");

        let toml_content = r#"
[api]
organization = "${SORA_TEST_ORG}"
project = "${SORA_TEST_UNSET_PROJECT}"
"#;

        let settings = ToolSettings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.api.organization.as_deref(), Some("org-123"));
        assert_eq!(
            settings.api.project.as_deref(),
            Some("${SORA_TEST_UNSET_PROJECT}")
        );

        std::env::remove_var("SORA_TEST_ORG");
    }

    #[test]
    fn test_validation() {
        let settings = ToolSettings::from_toml_str(
            r#"
[api]
base_url = "not a url"
"#,
        )
        .unwrap();
        assert!(settings.validate().is_err());

        let settings = ToolSettings::from_toml_str(
            r#"
[retry]
initial_delay_ms = 5000
max_delay_ms = 100
"#,
        )
        .unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = ToolSettings::from_toml_str("[api\nbase_url =").unwrap_err();
        assert!(matches!(err, AppError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_settings_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[logging]\nfile = \"logs/custom.log\"\n")
            .unwrap();

        let settings = ToolSettings::load(Some(temp_file.path())).unwrap();
        assert_eq!(settings.logging.file, PathBuf::from("logs/custom.log"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = ToolSettings::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(AppError::IoError(_))));
    }
}
