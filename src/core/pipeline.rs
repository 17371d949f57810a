use crate::core::retry::{generate_with_retry, RetryPolicy};
use crate::core::scenes::parse_scenes;
use crate::domain::model::{Frame, ImageRequest, RenderResult, RunManifest, Scene};
use crate::domain::ports::{
    ConfigProvider, EncodeJob, ImageGenerator, Storage, StoryPipeline, VideoEncoder,
};
use crate::utils::error::{AppError, Result};
use crate::utils::monitor::RunMonitor;
use crate::utils::progress::SceneProgress;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const MANIFEST_FILE: &str = "manifest.json";

const SMOKE_TEST_PROMPT: &str = "a single red cube on a clean white background, studio lighting";
const SMOKE_TEST_SIZE: &str = "256x256";

/// dry-run 時顯示的場景資訊
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePreview {
    pub scene: Scene,
    pub frame_path: PathBuf,
    pub reuse: bool,
}

/// 故事 → 畫格 → 影片 的主要流程
pub struct RenderPipeline<G, S, E, C>
where
    G: ImageGenerator + 'static,
    S: Storage + 'static,
    E: VideoEncoder,
    C: ConfigProvider,
{
    generator: Arc<G>,
    storage: Arc<S>,
    encoder: E,
    config: C,
    retry_policy: RetryPolicy,
    monitor: Arc<RunMonitor>,
    show_progress: bool,
}

impl<G, S, E, C> RenderPipeline<G, S, E, C>
where
    G: ImageGenerator + 'static,
    S: Storage + 'static,
    E: VideoEncoder,
    C: ConfigProvider,
{
    pub fn new(generator: G, storage: S, encoder: E, config: C) -> Self {
        Self {
            generator: Arc::new(generator),
            storage: Arc::new(storage),
            encoder,
            config,
            retry_policy: RetryPolicy::default(),
            monitor: Arc::new(RunMonitor::default()),
            show_progress: true,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<RunMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_progress(mut self, visible: bool) -> Self {
        self.show_progress = visible;
        self
    }

    pub fn monitor(&self) -> Arc<RunMonitor> {
        Arc::clone(&self.monitor)
    }

    fn frame_path(&self, scene: &Scene) -> PathBuf {
        self.config.frames_dir().join(scene.frame_file_name())
    }

    /// 以極小尺寸試算一張圖，提早發現認證、帳單或權限問題；不重試
    pub async fn smoke_test(&self) -> Result<()> {
        tracing::info!("Running smoke test (one {} render)…", SMOKE_TEST_SIZE);
        let request = ImageRequest {
            index: 0,
            prompt: SMOKE_TEST_PROMPT.to_string(),
            size: SMOKE_TEST_SIZE.to_string(),
        };

        match self.generator.generate(&request).await {
            Ok(bytes) => {
                tracing::debug!("Smoke test returned {} bytes", bytes.len());
                tracing::info!("Smoke test OK.");
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ Smoke test failed: {}", e.user_friendly_message());
                Err(e)
            }
        }
    }

    /// 列出會被渲染的場景與是否沿用既有畫格，不呼叫 API
    pub async fn preview(&self, scenes: &[Scene]) -> Vec<ScenePreview> {
        let mut previews = Vec::with_capacity(scenes.len());
        for scene in scenes {
            let frame_path = self.frame_path(scene);
            let reuse = self.config.skip_existing() && self.storage.exists(&frame_path).await;
            previews.push(ScenePreview {
                scene: scene.clone(),
                frame_path,
                reuse,
            });
        }
        previews
    }

    async fn write_manifest(&self, scenes: Vec<Scene>, frames: &[Frame]) -> Result<()> {
        let manifest = RunManifest {
            created_at: chrono::Utc::now(),
            story: self.config.story().to_string(),
            style: self.config.style().to_string(),
            size: self.config.image_size().to_string(),
            aspect: self.config.aspect().to_string(),
            scenes,
            frames: frames.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&manifest)?;
        let path = self.config.frames_dir().join(MANIFEST_FILE);
        self.storage.write_file(&path, &json).await?;
        tracing::debug!("Run manifest written to {}", path.display());
        Ok(())
    }
}

async fn render_frame<G, S>(
    generator: Arc<G>,
    storage: Arc<S>,
    request: ImageRequest,
    frame_path: PathBuf,
    policy: RetryPolicy,
    monitor: Arc<RunMonitor>,
) -> Result<Frame>
where
    G: ImageGenerator + 'static,
    S: Storage + 'static,
{
    let bytes = generate_with_retry(generator.as_ref(), &request, &policy, Some(&monitor)).await?;

    storage
        .write_file(&frame_path, &bytes)
        .await
        .map_err(|e| e.for_frame(request.index))?;
    monitor.record_generated();
    tracing::info!("Frame {} saved to {}", request.index, frame_path.display());

    Ok(Frame {
        index: request.index,
        path: frame_path,
        reused: false,
    })
}

fn sort_by_file_name(frames: &mut [Frame]) {
    frames.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
}

#[async_trait::async_trait]
impl<G, S, E, C> StoryPipeline for RenderPipeline<G, S, E, C>
where
    G: ImageGenerator + 'static,
    S: Storage + 'static,
    E: VideoEncoder,
    C: ConfigProvider,
{
    async fn extract(&self) -> Result<Vec<Scene>> {
        let prompts_file = self.config.prompts_file();
        tracing::debug!("Loading prompts from {}", prompts_file.display());

        self.storage.create_dir(self.config.frames_dir()).await?;
        let data = self.storage.read_file(prompts_file).await?;
        parse_scenes(&data, self.config.max_images())
    }

    async fn render(&self, scenes: Vec<Scene>) -> Result<RenderResult> {
        let threads = self.config.threads().max(1);
        let semaphore = Arc::new(Semaphore::new(threads));
        let mut tasks = JoinSet::new();
        let mut frames = Vec::with_capacity(scenes.len());
        let mut reused = 0;

        let queue_progress = SceneProgress::new(
            scenes.len(),
            "Queueing scenes",
            "scene",
            self.show_progress,
        );

        for scene in &scenes {
            queue_progress.inc();
            tracing::info!(
                "Queueing image {}: {} ({})",
                scene.index,
                scene.title,
                scene.narrative_role
            );
            tracing::debug!("Prompt for scene {}: {}", scene.index, scene.prompt_text);

            let frame_path = self.frame_path(scene);
            if self.config.skip_existing() && self.storage.exists(&frame_path).await {
                tracing::info!(
                    "Skipping existing frame for scene {} at {}",
                    scene.index,
                    frame_path.display()
                );
                self.monitor.record_reused();
                reused += 1;
                frames.push(Frame {
                    index: scene.index,
                    path: frame_path,
                    reused: true,
                });
                continue;
            }

            let request = ImageRequest {
                index: scene.index,
                prompt: scene.prompt_with_style(self.config.style()),
                size: self.config.image_size().to_string(),
            };
            let generator = Arc::clone(&self.generator);
            let storage = Arc::clone(&self.storage);
            let monitor = Arc::clone(&self.monitor);
            let semaphore = Arc::clone(&semaphore);
            let policy = self.retry_policy.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::ProcessingError {
                        message: format!("Worker pool closed: {}", e),
                    })?;
                render_frame(generator, storage, request, frame_path, policy, monitor).await
            });
        }
        queue_progress.finish();

        let generation_progress = SceneProgress::new(
            tasks.len(),
            "Generating images",
            "img",
            self.show_progress,
        );

        while let Some(joined) = tasks.join_next().await {
            generation_progress.inc();
            let outcome = joined.map_err(|e| AppError::ProcessingError {
                message: format!("Image worker stopped unexpectedly: {}", e),
            });

            match outcome.and_then(|frame| frame) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    generation_progress.abandon();
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }
        generation_progress.finish();

        let generated = frames.len() - reused;
        sort_by_file_name(&mut frames);
        self.write_manifest(scenes, &frames).await?;

        Ok(RenderResult {
            frames,
            generated,
            reused,
        })
    }

    async fn assemble(&self, frames: &[Frame]) -> Result<PathBuf> {
        let job = EncodeJob {
            frames: frames.iter().map(|f| f.path.clone()).collect(),
            output_file: self.config.output_file().to_path_buf(),
            fps: self.config.fps(),
            size: self.config.image_size().to_string(),
            kenburns: self.config.kenburns(),
            audio: self.config.audio().map(Path::to_path_buf),
        };

        self.encoder.encode(&job).await?;
        tracing::info!("Video written to {}", job.output_file.display());
        Ok(job.output_file)
    }
}
