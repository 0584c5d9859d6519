use crate::fibonacci::simulate_load;
use offscreen_core::{
    DrawingSurface, MainToWorker, PixelRect, PostedMessage, RenderContext, Rgba, WorkerConfig,
    WorkerError,
};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// No canvas, no timer.
    Uninitialized,
    /// Canvas installed; the host is ticking the repaint loop.
    Running,
}

/// What the host has to do after a message was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Canvas installed. Start calling [`RenderWorker::tick`] every `period`.
    Started { period: Duration },

    /// Load simulation finished.
    LoadSimulated { depth: u32, value: u64 },
}

/// Worker state: at most one canvas, its 2D context and the repaint counter.
///
/// Hosts own exactly one instance for the lifetime of the worker and feed it
/// messages and timer ticks from a single thread.
pub struct RenderWorker<S: DrawingSurface> {
    config: WorkerConfig,
    context: Option<S::Context>,
    repaint_count: u64,
}

impl<S: DrawingSurface> RenderWorker<S> {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            context: None,
            repaint_count: 0,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        match self.context {
            Some(_) => WorkerState::Running,
            None => WorkerState::Uninitialized,
        }
    }

    pub fn repaint_count(&self) -> u64 {
        self.repaint_count
    }

    pub fn canvas(&self) -> Option<&S> {
        self.context.as_ref().map(|ctx| ctx.canvas())
    }

    /// Tear down and give the canvas back (if one was installed).
    pub fn into_canvas(self) -> Option<S> {
        self.context.map(|ctx| ctx.into_canvas())
    }

    /// Parse a raw inbound message against the configured sentinel, then
    /// handle it.
    pub fn handle_posted(&mut self, message: PostedMessage<S>) -> Result<Outcome, WorkerError> {
        let message = message.parse(&self.config.load_sentinel)?;
        self.handle(message)
    }

    pub fn handle(&mut self, message: MainToWorker<S>) -> Result<Outcome, WorkerError> {
        match message {
            MainToWorker::SimulateLoad => {
                let depth = self.config.load_depth;
                log::debug!("Simulating load: fibonacci({depth})");
                let value = simulate_load(depth);
                log::debug!("fibonacci({depth}) = {value}");
                Ok(Outcome::LoadSimulated { depth, value })
            }
            MainToWorker::Initialize { canvas } => self.install(canvas),
        }
    }

    fn install(&mut self, canvas: S) -> Result<Outcome, WorkerError> {
        if self.context.is_some() {
            // The incoming canvas is dropped; the running loop keeps its own.
            return Err(WorkerError::AlreadyInitialized);
        }

        let (width, height) = (canvas.width(), canvas.height());
        let context = canvas.into_context_2d()?;
        self.context = Some(context);

        let period = self.config.repaint_interval();
        log::info!(
            "Canvas {}x{} installed, repainting every {}ms",
            width,
            height,
            period.as_millis()
        );
        Ok(Outcome::Started { period })
    }

    /// One repaint: redraw, then bump the counter. Returns the new count.
    pub fn tick(&mut self) -> Result<u64, WorkerError> {
        let context = self.context.as_mut().ok_or(WorkerError::NotInitialized)?;
        redraw(context, self.config.fill_color);
        self.repaint_count += 1;
        Ok(self.repaint_count)
    }
}

/// Clear the whole canvas and flood it with `color`.
fn redraw<C: RenderContext>(context: &mut C, color: Rgba) {
    let canvas = context.canvas();
    let full = PixelRect::full(canvas.width(), canvas.height());
    context.clear_rect(full);
    context.set_fill_style(color);
    context.fill_rect(full);
}
