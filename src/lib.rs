pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{GreetArgs, StoryArgs};

pub use adapters::{ffmpeg::FfmpegEncoder, openai::OpenAiImageClient};
pub use config::{cli::LocalStorage, credentials::Credentials, settings::ToolSettings};
pub use core::{engine::RenderEngine, greeting::hello, pipeline::RenderPipeline};
pub use utils::error::{AppError, Result};
