// Adapters layer: concrete implementations for external systems (image API, ffmpeg, dev tooling).

pub mod ffmpeg;
pub mod openai;
pub mod preflight;
