use crate::utils::error::{AppError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AppError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 解析 `寬<sep>高` 格式，兩者皆須為正整數
fn parse_dimensions(value: &str, separator: char) -> Option<(u32, u32)> {
    let (left, right) = value.split_once(separator)?;
    let width: u32 = left.trim().parse().ok()?;
    let height: u32 = right.trim().parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

/// 影像尺寸：`auto` 或 `1024x1024` 這類格式
pub fn validate_image_size(field_name: &str, value: &str) -> Result<()> {
    if value == "auto" || parse_dimensions(value, 'x').is_some() {
        return Ok(());
    }
    Err(AppError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: "Expected 'auto' or WIDTHxHEIGHT (e.g. 1024x1024)".to_string(),
    })
}

/// 畫面比例：`16:9` 這類格式
pub fn validate_aspect_ratio(field_name: &str, value: &str) -> Result<()> {
    parse_dimensions(value, ':')
        .map(|_| ())
        .ok_or_else(|| AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected WIDTH:HEIGHT (e.g. 16:9)".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api.base_url", "https://api.openai.com/v1").is_ok());
        assert!(validate_url("api.base_url", "http://localhost:8080").is_ok());
        assert!(validate_url("api.base_url", "").is_err());
        assert!(validate_url("api.base_url", "invalid-url").is_err());
        assert!(validate_url("api.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("threads", 4, 1).is_ok());
        assert!(validate_positive_number("threads", 0, 1).is_err());
    }

    #[test]
    fn test_validate_image_size() {
        assert!(validate_image_size("size", "1024x1024").is_ok());
        assert!(validate_image_size("size", "1536x1024").is_ok());
        assert!(validate_image_size("size", "auto").is_ok());
        assert!(validate_image_size("size", "0x1024").is_err());
        assert!(validate_image_size("size", "1024").is_err());
        assert!(validate_image_size("size", "big").is_err());
    }

    #[test]
    fn test_validate_aspect_ratio() {
        assert!(validate_aspect_ratio("aspect", "16:9").is_ok());
        assert!(validate_aspect_ratio("aspect", "1:1").is_ok());
        assert!(validate_aspect_ratio("aspect", "16x9").is_err());
        assert!(validate_aspect_ratio("aspect", ":9").is_err());
    }
}
