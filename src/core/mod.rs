pub mod engine;
pub mod greeting;
pub mod pipeline;
pub mod retry;
pub mod scenes;

pub use crate::domain::model::{Frame, ImageRequest, RenderResult, Scene};
pub use crate::domain::ports::{ConfigProvider, ImageGenerator, Storage, StoryPipeline, VideoEncoder};
pub use crate::utils::error::Result;
