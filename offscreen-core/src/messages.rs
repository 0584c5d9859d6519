use crate::{WorkerError, DEFAULT_LOAD_SENTINEL};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from host to worker, after parsing.
#[derive(Debug)]
pub enum MainToWorker<S> {
    /// Burn CPU on the worker's own context.
    SimulateLoad,

    /// Hand over the drawing surface and start repainting.
    Initialize { canvas: S },
}

/// Shape of the initialization payload. `canvas` is the slot of the surface
/// in the transfer list.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitPayload {
    pub canvas: usize,
}

/// A message as it arrives on the inbound channel: structured data plus the
/// objects whose ownership moves with it.
#[derive(Debug)]
pub struct PostedMessage<S> {
    pub data: Value,
    pub transfer: Vec<S>,
}

impl<S> PostedMessage<S> {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            transfer: Vec::new(),
        }
    }

    pub fn with_transfer(data: Value, transfer: Vec<S>) -> Self {
        Self { data, transfer }
    }

    /// The default load sentinel, `"slowDown"`.
    pub fn slow_down() -> Self {
        Self::new(Value::String(DEFAULT_LOAD_SENTINEL.to_string()))
    }

    /// `{ canvas }` with the surface moved in transfer slot 0.
    pub fn initialize(canvas: S) -> Self {
        let data = serde_json::to_value(InitPayload { canvas: 0 })
            .unwrap_or_else(|_| serde_json::json!({ "canvas": 0 }));
        Self::with_transfer(data, vec![canvas])
    }

    /// Classify the message. A string equal to `sentinel` means load
    /// simulation; anything else must be an init payload.
    pub fn parse(self, sentinel: &str) -> Result<MainToWorker<S>, WorkerError> {
        if is_load_sentinel(self.data.as_str(), sentinel) {
            return Ok(MainToWorker::SimulateLoad);
        }

        if !self.data.is_object() {
            return Err(WorkerError::MalformedMessage(format!(
                "expected {sentinel:?} or an object with a canvas, got {}",
                self.data
            )));
        }
        let payload: InitPayload = serde_json::from_value(self.data)
            .map_err(|e| WorkerError::MalformedMessage(format!("init payload: {e}")))?;

        let mut transfer = self.transfer;
        if payload.canvas >= transfer.len() {
            return Err(WorkerError::MalformedMessage(format!(
                "canvas refers to transfer slot {} but only {} object(s) were transferred",
                payload.canvas,
                transfer.len()
            )));
        }
        let canvas = transfer.swap_remove(payload.canvas);
        Ok(MainToWorker::Initialize { canvas })
    }
}

/// Exact, case-sensitive comparison against the configured sentinel.
pub fn is_load_sentinel(data: Option<&str>, sentinel: &str) -> bool {
    data == Some(sentinel)
}
