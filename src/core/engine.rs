use crate::domain::ports::StoryPipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;
use std::path::PathBuf;
use std::sync::Arc;

pub struct RenderEngine<P: StoryPipeline> {
    pipeline: P,
    monitor: Arc<RunMonitor>,
}

impl<P: StoryPipeline> RenderEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: Arc::new(RunMonitor::default()),
        }
    }

    /// 與 pipeline 共用同一個監控器，才能在最後輸出完整統計
    pub fn new_with_monitor(pipeline: P, monitor: Arc<RunMonitor>) -> Self {
        Self { pipeline, monitor }
    }

    pub async fn run(&self) -> Result<PathBuf> {
        tracing::info!("🚀 Starting story render");
        self.monitor.log_stats("Render started");

        // 讀取場景
        let scenes = self.pipeline.extract().await?;
        tracing::info!("📜 Loaded {} scenes", scenes.len());
        self.monitor.log_stats("Scenes loaded");

        // 生成畫格
        let result = self.pipeline.render(scenes).await?;
        tracing::info!(
            "🖼️ {} frames ready ({} generated, {} reused)",
            result.frames.len(),
            result.generated,
            result.reused
        );
        self.monitor.log_stats("Frames rendered");

        // 組裝影片
        println!("\nAssembling video…");
        let output_path = self.pipeline.assemble(&result.frames).await?;
        self.monitor.log_stats("Video assembled");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Frame, RenderResult, Scene};
    use crate::utils::error::AppError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubPipeline {
        calls: Mutex<Vec<&'static str>>,
        fail_render: bool,
    }

    #[async_trait]
    impl StoryPipeline for StubPipeline {
        async fn extract(&self) -> Result<Vec<Scene>> {
            self.calls.lock().unwrap().push("extract");
            Ok(vec![Scene {
                index: 1,
                title: "Opening".to_string(),
                narrative_role: "setup".to_string(),
                prompt_text: "a foggy pier".to_string(),
            }])
        }

        async fn render(&self, scenes: Vec<Scene>) -> Result<RenderResult> {
            self.calls.lock().unwrap().push("render");
            if self.fail_render {
                return Err(AppError::ProcessingError {
                    message: "render failed".to_string(),
                });
            }
            let frames = scenes
                .iter()
                .map(|s| Frame {
                    index: s.index,
                    path: PathBuf::from(format!("frames/{}", s.frame_file_name())),
                    reused: false,
                })
                .collect();
            Ok(RenderResult {
                frames,
                generated: 1,
                reused: 0,
            })
        }

        async fn assemble(&self, frames: &[Frame]) -> Result<PathBuf> {
            self.calls.lock().unwrap().push("assemble");
            assert_eq!(frames.len(), 1);
            Ok(PathBuf::from("output.mp4"))
        }
    }

    #[tokio::test]
    async fn test_run_executes_phases_in_order() {
        let engine = RenderEngine::new(StubPipeline::default());

        let output = engine.run().await.unwrap();

        assert_eq!(output, PathBuf::from("output.mp4"));
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["extract", "render", "assemble"]
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_render_failure() {
        let engine = RenderEngine::new(StubPipeline {
            fail_render: true,
            ..StubPipeline::default()
        });

        assert!(engine.run().await.is_err());
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["extract", "render"]
        );
    }
}
