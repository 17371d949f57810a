use crate::config::settings::VideoSettings;
use crate::domain::ports::{EncodeJob, VideoEncoder};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Ken Burns 效果每張畫格的最大放大倍率
const KENBURNS_MAX_ZOOM: f32 = 1.2;
const KENBURNS_FPS: u32 = 25;
/// 只保留 ffmpeg stderr 的最後幾行作為錯誤訊息
const STDERR_TAIL_LINES: usize = 12;

/// 透過 `ffmpeg` 的 concat demuxer 把畫格組成影片
pub struct FfmpegEncoder {
    settings: VideoSettings,
}

impl FfmpegEncoder {
    pub fn new(settings: VideoSettings) -> Self {
        Self { settings }
    }

    /// 產生 ffconcat 清單；最後一張重複一次，否則最後一格的持續時間會被忽略
    pub fn concat_list(frames: &[PathBuf], fps: u32) -> String {
        let duration = 1.0 / f64::from(fps.max(1));
        let mut list = String::from("ffconcat version 1.0\n");

        for frame in frames {
            list.push_str(&format!("file '{}'\n", escape_path(frame)));
            list.push_str(&format!("duration {:.6}\n", duration));
        }
        if let Some(last) = frames.last() {
            list.push_str(&format!("file '{}'\n", escape_path(last)));
        }

        list
    }

    /// zoompan 未指定 `s` 時會輸出 hd720，必須沿用畫格本身的尺寸
    fn video_filter(job: &EncodeJob) -> String {
        let mut filters = Vec::new();
        if job.kenburns {
            let steps = (KENBURNS_FPS / job.fps.max(1)).max(1);
            let increment = (KENBURNS_MAX_ZOOM - 1.0) / steps as f32;
            filters.push(format!(
                "zoompan=z='min(zoom+{:.4},{:.2})':d={}:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={}:fps={}",
                increment, KENBURNS_MAX_ZOOM, steps, job.size, KENBURNS_FPS
            ));
        }
        filters.push("scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string());
        filters.join(",")
    }

    /// 組出 ffmpeg 參數；`audio` 為已確認可讀取的音訊檔
    pub fn build_args(
        &self,
        job: &EncodeJob,
        list_path: &Path,
        audio: Option<&Path>,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.to_string_lossy().into_owned(),
        ];

        if let Some(audio) = audio {
            args.push("-i".into());
            args.push(audio.to_string_lossy().into_owned());
        }

        // zoompan 以 25fps 內插，輸出必須保留這個速率才看得到平滑放大
        let output_rate = if job.kenburns {
            KENBURNS_FPS
        } else {
            job.fps
        };
        args.extend([
            "-vf".into(),
            Self::video_filter(job),
            "-c:v".into(),
            self.settings.codec.clone(),
            "-pix_fmt".into(),
            self.settings.pixel_format.clone(),
            "-r".into(),
            output_rate.to_string(),
        ]);

        if audio.is_some() {
            args.extend(["-c:a".into(), "aac".into(), "-shortest".into()]);
        }

        args.push(job.output_file.to_string_lossy().into_owned());
        args
    }

    /// 音訊無法讀取時只記錄警告，影片照樣輸出
    async fn usable_audio(audio: Option<&Path>) -> Option<PathBuf> {
        let audio = audio?;
        match tokio::fs::File::open(audio).await {
            Ok(_) => Some(audio.to_path_buf()),
            Err(e) => {
                tracing::warn!("Failed to load audio {}: {}", audio.display(), e);
                None
            }
        }
    }
}

fn escape_path(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute.to_string_lossy().replace('\'', r"'\''")
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, job: &EncodeJob) -> Result<()> {
        if job.frames.is_empty() {
            return Err(AppError::EncodingError {
                message: "No frame paths provided to make video".to_string(),
            });
        }

        if let Some(parent) = job.output_file.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let list_path = job.output_file.with_extension("ffconcat");
        tokio::fs::write(&list_path, Self::concat_list(&job.frames, job.fps)).await?;

        let audio = Self::usable_audio(job.audio.as_deref()).await;
        let args = self.build_args(job, &list_path, audio.as_deref());
        tracing::debug!("Running {} {}", self.settings.ffmpeg, args.join(" "));

        let output = Command::new(&self.settings.ffmpeg)
            .args(&args)
            .output()
            .await
            .map_err(|e| AppError::EncodingError {
                message: format!("Failed to start '{}': {}", self.settings.ffmpeg, e),
            });

        if let Err(e) = tokio::fs::remove_file(&list_path).await {
            tracing::debug!("Could not remove {}: {}", list_path.display(), e);
        }

        let output = output?;
        if !output.status.success() {
            return Err(AppError::EncodingError {
                message: format!(
                    "ffmpeg exited with {}: {}",
                    output.status,
                    stderr_tail(&output.stderr)
                ),
            });
        }

        Ok(())
    }
}
