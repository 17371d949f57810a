// Domain layer: scene models and ports (interfaces) implemented by adapters and pipelines.

pub mod model;
pub mod ports;
