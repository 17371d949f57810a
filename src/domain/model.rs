use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 故事中的一個場景，對應影片中的一張畫格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub index: u32,
    pub title: String,
    pub narrative_role: String,
    pub prompt_text: String,
}

impl Scene {
    /// 畫格檔名，例如 `frame_007.png`
    pub fn frame_file_name(&self) -> String {
        frame_file_name(self.index)
    }

    /// 實際送出的提示詞：場景描述加上畫風
    pub fn prompt_with_style(&self, style: &str) -> String {
        let style = style.trim();
        if style.is_empty() {
            self.prompt_text.clone()
        } else {
            format!("{}\n\nStyle: {}", self.prompt_text, style)
        }
    }
}

pub fn frame_file_name(index: u32) -> String {
    format!("frame_{:03}.png", index)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub index: u32,
    pub prompt: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub index: u32,
    pub path: PathBuf,
    pub reused: bool,
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub frames: Vec<Frame>,
    pub generated: usize,
    pub reused: usize,
}

/// 寫入畫格目錄的執行紀錄
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub created_at: DateTime<Utc>,
    pub story: String,
    pub style: String,
    pub size: String,
    pub aspect: String,
    pub scenes: Vec<Scene>,
    pub frames: Vec<Frame>,
}
