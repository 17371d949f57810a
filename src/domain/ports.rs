use crate::domain::model::{Frame, ImageRequest, RenderResult, Scene};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &Path) -> impl std::future::Future<Output = bool> + Send;
    fn create_dir(&self, path: &Path) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn story(&self) -> &str;
    fn style(&self) -> &str;
    fn prompts_file(&self) -> &Path;
    fn frames_dir(&self) -> &Path;
    fn max_images(&self) -> usize;
    fn image_size(&self) -> &str;
    fn threads(&self) -> usize;
    fn skip_existing(&self) -> bool;
    fn output_file(&self) -> &Path;
    fn fps(&self) -> u32;
    fn aspect(&self) -> &str;
    fn kenburns(&self) -> bool;
    fn audio(&self) -> Option<&Path>;
}

/// 影像生成服務，回傳已解碼的圖片位元組
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub frames: Vec<PathBuf>,
    pub output_file: PathBuf,
    pub fps: u32,
    /// 畫格尺寸 `WxH`，輸出影片維持這個尺寸
    pub size: String,
    pub kenburns: bool,
    pub audio: Option<PathBuf>,
}

#[async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn encode(&self, job: &EncodeJob) -> Result<()>;
}

#[async_trait]
pub trait StoryPipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Scene>>;
    async fn render(&self, scenes: Vec<Scene>) -> Result<RenderResult>;
    async fn assemble(&self, frames: &[Frame]) -> Result<PathBuf>;
}
