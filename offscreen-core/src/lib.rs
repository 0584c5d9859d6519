pub mod color;
pub mod config;
pub mod error;
pub mod messages;
pub mod pixel_rect;
pub mod surface;

pub use color::Rgba;
pub use config::{
    WorkerConfig, DEFAULT_LOAD_DEPTH, DEFAULT_LOAD_SENTINEL, DEFAULT_REPAINT_INTERVAL_MS,
    MAX_LOAD_DEPTH,
};
pub use error::WorkerError;
pub use messages::{is_load_sentinel, InitPayload, MainToWorker, PostedMessage};
pub use pixel_rect::PixelRect;
pub use surface::{DrawingSurface, PixelContext, PixelSurface, RenderContext};
