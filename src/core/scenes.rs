use crate::domain::model::Scene;
use crate::utils::error::{AppError, Result};
use serde::Deserialize;

/// prompts 檔中的原始場景，欄位可能缺漏
#[derive(Debug, Deserialize)]
struct RawScene {
    index: Option<u32>,
    title: Option<String>,
    narrative_role: Option<String>,
    prompt_text: Option<String>,
}

/// 解析場景清單並套用 `max_images` 篩選
///
/// 缺少 `index` 或 `index > max_images` 的項目會被略過，其餘依檔案順序取前 `max_images` 筆。
pub fn parse_scenes(data: &[u8], max_images: usize) -> Result<Vec<Scene>> {
    let value: serde_json::Value = serde_json::from_slice(data)?;
    let serde_json::Value::Array(items) = value else {
        return Err(AppError::ProcessingError {
            message: "prompts file must contain a list of scenes".to_string(),
        });
    };

    let mut scenes = Vec::new();
    for item in items {
        let raw: RawScene = serde_json::from_value(item)?;
        let Some(index) = raw.index else {
            tracing::debug!("Dropping scene without an index");
            continue;
        };
        if index as usize > max_images {
            tracing::debug!("Dropping scene {} (beyond max images {})", index, max_images);
            continue;
        }
        if scenes.len() == max_images {
            break;
        }

        let prompt_text = raw
            .prompt_text
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::ProcessingError {
                message: format!("Scene {} is missing a 'prompt_text'", index),
            })?;

        scenes.push(Scene {
            index,
            title: raw.title.unwrap_or_else(|| format!("Scene {}", index)),
            narrative_role: raw.narrative_role.unwrap_or_default(),
            prompt_text,
        });
    }

    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_scene() {
        let data = br#"[
            {"index": 1, "title": "Dawn", "narrative_role": "setup", "prompt_text": "sunrise over hills"}
        ]"#;

        let scenes = parse_scenes(data, 12).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].title, "Dawn");
        assert_eq!(scenes[0].narrative_role, "setup");
        assert_eq!(scenes[0].prompt_text, "sunrise over hills");
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let data = br#"[{"index": 4, "prompt_text": "a quiet harbor"}]"#;

        let scenes = parse_scenes(data, 12).unwrap();
        assert_eq!(scenes[0].title, "Scene 4");
        assert_eq!(scenes[0].narrative_role, "");
    }

    #[test]
    fn test_filters_missing_and_out_of_range_indexes() {
        let data = br#"[
            {"title": "no index", "prompt_text": "x"},
            {"index": 1, "prompt_text": "one"},
            {"index": 9, "prompt_text": "nine"},
            {"index": 2, "prompt_text": "two"},
            {"index": 3, "prompt_text": "three"}
        ]"#;

        let scenes = parse_scenes(data, 2).unwrap();
        let indexes: Vec<u32> = scenes.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![1, 2]);
    }

    #[test]
    fn test_truncates_to_max_images_in_file_order() {
        let data = br#"[
            {"index": 3, "prompt_text": "three"},
            {"index": 1, "prompt_text": "one"},
            {"index": 2, "prompt_text": "two"}
        ]"#;

        let scenes = parse_scenes(data, 3).unwrap();
        let indexes: Vec<u32> = scenes.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![3, 1, 2]);
    }

    #[test]
    fn test_missing_prompt_text_is_an_error() {
        let data = br#"[{"index": 5, "title": "Blank", "prompt_text": ""}]"#;

        let err = parse_scenes(data, 12).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Scene processing error: Scene 5 is missing a 'prompt_text'"
        );
    }

    #[test]
    fn test_whitespace_prompt_is_kept_as_given() {
        let data = br#"[{"index": 2, "prompt_text": "  "}, {"index": 3}]"#;

        let err = parse_scenes(data, 12).unwrap_err();
        assert!(err.to_string().contains("Scene 3 is missing"));

        let scenes = parse_scenes(br#"[{"index": 2, "prompt_text": "  "}]"#, 12).unwrap();
        assert_eq!(scenes[0].prompt_text, "  ");
    }

    #[test]
    fn test_non_list_document_is_rejected() {
        let err = parse_scenes(br#"{"index": 1}"#, 12).unwrap_err();
        assert!(err.to_string().contains("must contain a list of scenes"));
    }

    #[test]
    fn test_invalid_json_is_a_serialization_error() {
        let err = parse_scenes(b"[{", 12).unwrap_err();
        assert!(matches!(err, AppError::SerializationError(_)));
    }
}
