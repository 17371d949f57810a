pub mod cli;
pub mod credentials;
pub mod settings;

#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_aspect_ratio, validate_image_size, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

/// 專案入口指令：輸出問候語
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "sora_imagegen_tool")]
#[command(about = "Project CLI")]
pub struct GreetArgs {
    /// Name to greet
    #[arg(long, default_value = "world")]
    pub name: String,
}

#[cfg(feature = "cli")]
fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(64)
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "story_to_video")]
#[command(about = "Generate images from a story and compile them into a video.")]
pub struct StoryArgs {
    /// Narrative brief
    #[arg(long)]
    pub story: String,

    /// Art style applied to prompts
    #[arg(long)]
    pub style: String,

    /// Maximum number of images
    #[arg(long, default_value_t = 12)]
    pub max_images: usize,

    /// Aspect ratio (video metadata only)
    #[arg(long, default_value = "16:9")]
    pub aspect: String,

    /// Image resolution for generation
    #[arg(long, default_value = "1024x1024")]
    pub size: String,

    /// Frames per second for output video
    #[arg(long, default_value_t = 3)]
    pub fps: u32,

    /// Output video file name
    #[arg(long, default_value = "output.mp4")]
    pub output_file: PathBuf,

    /// Path to JSON file containing prompts
    #[arg(long, default_value = "prompts.json")]
    pub prompts_file: PathBuf,

    /// Directory to save generated images
    #[arg(long, default_value = "frames")]
    pub frames_dir: PathBuf,

    /// Skip image generation if frame already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Suppress console DEBUG logs
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also show debug logs of dependencies
    #[arg(short, long)]
    pub verbose: bool,

    /// Slow zoom-in (Ken Burns) effect on every frame
    #[arg(long)]
    pub kenburns: bool,

    /// Optional audio file for video
    #[arg(long)]
    pub audio: Option<PathBuf>,

    /// Number of parallel image generations. Defaults to CPU core count
    #[arg(long, default_value_t = default_threads())]
    pub threads: usize,

    /// Skip formatter and linter checks before generation
    #[arg(long)]
    pub no_preflight: bool,

    /// Do a 1-shot 256x256 test render before queueing all scenes
    #[arg(long)]
    pub smoke_test: bool,

    /// Show the scenes that would be rendered without calling the API
    #[arg(long)]
    pub dry_run: bool,

    /// Log CPU and memory statistics per phase
    #[arg(long)]
    pub monitor: bool,

    /// Tool settings file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(feature = "cli")]
impl ConfigProvider for StoryArgs {
    fn story(&self) -> &str {
        &self.story
    }

    fn style(&self) -> &str {
        &self.style
    }

    fn prompts_file(&self) -> &Path {
        &self.prompts_file
    }

    fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    fn max_images(&self) -> usize {
        self.max_images
    }

    fn image_size(&self) -> &str {
        &self.size
    }

    fn threads(&self) -> usize {
        self.threads
    }

    fn skip_existing(&self) -> bool {
        self.skip_existing
    }

    fn output_file(&self) -> &Path {
        &self.output_file
    }

    fn fps(&self) -> u32 {
        self.fps
    }

    fn aspect(&self) -> &str {
        &self.aspect
    }

    fn kenburns(&self) -> bool {
        self.kenburns
    }

    fn audio(&self) -> Option<&Path> {
        self.audio.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for StoryArgs {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("story", &self.story)?;
        validate_positive_number("max_images", self.max_images, 1)?;
        validate_range("threads", self.threads, 1, 64)?;
        validate_range("fps", self.fps, 1, 120)?;
        validate_image_size("size", &self.size)?;
        validate_aspect_ratio("aspect", &self.aspect)?;
        validate_path("prompts_file", &self.prompts_file.to_string_lossy())?;
        validate_path("frames_dir", &self.frames_dir.to_string_lossy())?;
        validate_path("output_file", &self.output_file.to_string_lossy())?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> StoryArgs {
        let mut argv = vec![
            "story_to_video",
            "--story",
            "A fox crosses the winter forest",
            "--style",
            "ink wash",
        ];
        argv.extend_from_slice(extra);
        StoryArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.max_images, 12);
        assert_eq!(args.aspect, "16:9");
        assert_eq!(args.size, "1024x1024");
        assert_eq!(args.fps, 3);
        assert_eq!(args.output_file, PathBuf::from("output.mp4"));
        assert_eq!(args.prompts_file, PathBuf::from("prompts.json"));
        assert_eq!(args.frames_dir, PathBuf::from("frames"));
        assert!(args.threads >= 1);
        assert!(!args.skip_existing);
        assert!(args.audio.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_story_and_style_are_required() {
        assert!(StoryArgs::try_parse_from(["story_to_video", "--story", "x"]).is_err());
        assert!(StoryArgs::try_parse_from(["story_to_video", "--style", "x"]).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(parse(&["--size", "huge"]).validate().is_err());
        assert!(parse(&["--threads", "0"]).validate().is_err());
        assert!(parse(&["--max-images", "0"]).validate().is_err());
        assert!(parse(&["--aspect", "wide"]).validate().is_err());
        assert!(parse(&["--fps", "0"]).validate().is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let argv = [
            "story_to_video",
            "--story",
            "s",
            "--style",
            "t",
            "--quiet",
            "--verbose",
        ];
        assert!(StoryArgs::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_greet_default_name() {
        let args = GreetArgs::try_parse_from(["sora_imagegen_tool"]).unwrap();
        assert_eq!(args.name, "world");
        let args = GreetArgs::try_parse_from(["sora_imagegen_tool", "--name", "Atlas"]).unwrap();
        assert_eq!(args.name, "Atlas");
    }
}
