pub mod fibonacci;
pub mod render_worker;
pub mod scheduler;
#[cfg(target_arch = "wasm32")]
pub mod worker;

pub use fibonacci::{fibonacci, simulate_load};
pub use render_worker::{Outcome, RenderWorker, WorkerState};
pub use scheduler::{spawn_worker, WorkerHandle, WorkerStats};
#[cfg(target_arch = "wasm32")]
pub use worker::{init_worker, parse_event, CanvasContext, CanvasSurface};

// Re-export core types for convenience
pub use offscreen_core::*;
