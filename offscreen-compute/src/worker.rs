use crate::render_worker::{Outcome, RenderWorker};
use gloo_timers::callback::Interval;
use offscreen_core::{
    is_load_sentinel, DrawingSurface, MainToWorker, PixelRect, RenderContext, Rgba, WorkerConfig,
    WorkerError,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    DedicatedWorkerGlobalScope, MessageEvent, OffscreenCanvas, OffscreenCanvasRenderingContext2d,
};

type SharedWorker = Rc<RefCell<RenderWorker<CanvasSurface>>>;

/// Transferred `OffscreenCanvas`.
pub struct CanvasSurface {
    canvas: OffscreenCanvas,
}

impl CanvasSurface {
    pub fn new(canvas: OffscreenCanvas) -> Self {
        Self { canvas }
    }
}

impl DrawingSurface for CanvasSurface {
    type Context = CanvasContext;

    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn into_context_2d(self) -> Result<CanvasContext, WorkerError> {
        let ctx = self
            .canvas
            .get_context("2d")
            .map_err(|e| WorkerError::ContextUnavailable(format!("{e:?}")))?
            .ok_or_else(|| {
                WorkerError::ContextUnavailable("getContext(\"2d\") returned null".into())
            })?
            .dyn_into::<OffscreenCanvasRenderingContext2d>()
            .map_err(|_| WorkerError::ContextUnavailable("not a 2D context".into()))?;

        Ok(CanvasContext { surface: self, ctx })
    }
}

pub struct CanvasContext {
    surface: CanvasSurface,
    ctx: OffscreenCanvasRenderingContext2d,
}

impl RenderContext for CanvasContext {
    type Canvas = CanvasSurface;

    fn canvas(&self) -> &CanvasSurface {
        &self.surface
    }

    fn clear_rect(&mut self, rect: PixelRect) {
        self.ctx.clear_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }

    fn set_fill_style(&mut self, color: Rgba) {
        self.ctx.set_fill_style_str(&color.to_css());
    }

    fn fill_rect(&mut self, rect: PixelRect) {
        self.ctx.fill_rect(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
    }

    fn into_canvas(self) -> CanvasSurface {
        self.surface
    }
}

/// Classify `MessageEvent.data`: the sentinel string, or `{ canvas }` holding
/// a transferred `OffscreenCanvas`.
pub fn parse_event(
    data: &JsValue,
    sentinel: &str,
) -> Result<MainToWorker<CanvasSurface>, WorkerError> {
    if is_load_sentinel(data.as_string().as_deref(), sentinel) {
        return Ok(MainToWorker::SimulateLoad);
    }
    if !data.is_object() {
        return Err(WorkerError::MalformedMessage(format!(
            "expected {sentinel:?} or {{ canvas }}, got {data:?}"
        )));
    }

    let canvas = js_sys::Reflect::get(data, &JsValue::from_str("canvas"))
        .map_err(|e| WorkerError::MalformedMessage(format!("{e:?}")))?;
    let canvas = canvas.dyn_into::<OffscreenCanvas>().map_err(|v| {
        WorkerError::MalformedMessage(format!("canvas is not an OffscreenCanvas: {v:?}"))
    })?;

    Ok(MainToWorker::Initialize {
        canvas: CanvasSurface::new(canvas),
    })
}

/// Worker initialization - call once from the worker bootstrap script.
/// `config_json` overrides [`WorkerConfig`] fields.
#[wasm_bindgen]
pub fn init_worker(config_json: Option<String>) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);

    let config = match config_json {
        Some(json) => WorkerConfig::from_json(&json).map_err(to_js)?,
        None => WorkerConfig::default(),
    };

    let global = js_sys::global()
        .dyn_into::<DedicatedWorkerGlobalScope>()
        .map_err(|_| JsValue::from_str("init_worker must run in a dedicated worker"))?;

    let worker: SharedWorker = Rc::new(RefCell::new(RenderWorker::new(config)));

    let onmessage = Closure::wrap(Box::new(move |e: MessageEvent| {
        if let Err(err) = handle_message(&worker, &e.data()) {
            match err {
                WorkerError::AlreadyInitialized => log::warn!("{err}"),
                _ => log::error!("Rejected message: {err}"),
            }
        }
    }) as Box<dyn FnMut(_)>);

    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    log::info!("Render worker ready");
    Ok(())
}

fn handle_message(worker: &SharedWorker, data: &JsValue) -> Result<(), WorkerError> {
    let sentinel = worker.borrow().config().load_sentinel.clone();
    let message = parse_event(data, &sentinel)?;

    let outcome = worker.borrow_mut().handle(message)?;
    if let Outcome::Started { period } = outcome {
        start_repaint_loop(Rc::clone(worker), period);
    }
    Ok(())
}

/// Tick forever. No handle is kept, so only terminating the worker stops it.
fn start_repaint_loop(worker: SharedWorker, period: Duration) {
    let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
    Interval::new(millis, move || {
        if let Err(err) = worker.borrow_mut().tick() {
            log::error!("Repaint failed: {err}");
        }
    })
    .forget();
}

fn to_js(err: WorkerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
