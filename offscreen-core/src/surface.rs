//! Drawing surfaces and their 2D contexts.
//!
//! A [`DrawingSurface`] is the transferable handle a host hands to the worker.
//! The worker converts it once into a [`RenderContext`], which keeps the
//! surface alive for as long as drawing happens (the equivalent of
//! `ctx.canvas` on a canvas 2D context).

use crate::{PixelRect, Rgba, WorkerError};

pub trait DrawingSurface: Sized {
    type Context: RenderContext<Canvas = Self>;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Derive the 2D context. Consumes the handle; the context owns it from
    /// here on.
    fn into_context_2d(self) -> Result<Self::Context, WorkerError>;
}

/// Imperative drawing operations used by the repaint loop.
pub trait RenderContext {
    type Canvas: DrawingSurface;

    fn canvas(&self) -> &Self::Canvas;

    /// Reset the rectangle to transparent black.
    fn clear_rect(&mut self, rect: PixelRect);

    fn set_fill_style(&mut self, color: Rgba);

    fn fill_rect(&mut self, rect: PixelRect);

    /// Give the surface back, dropping the context state.
    fn into_canvas(self) -> Self::Canvas;
}

/// In-memory RGBA8 surface, row-major, 4 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelSurface {
    /// New surface, fully transparent.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 4;
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(Rgba::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// True when every pixel equals `color`.
    pub fn is_filled_with(&self, color: Rgba) -> bool {
        let bytes = color.to_bytes();
        self.pixels.chunks_exact(4).all(|px| px == bytes)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn for_each_in(&mut self, rect: PixelRect, mut f: impl FnMut(&mut [u8])) {
        let rect = rect.clip_to(self.width, self.height);
        if rect.is_empty() {
            return;
        }
        for y in rect.y..rect.y + rect.height {
            let start = self.offset(rect.x, y);
            let end = start + rect.width as usize * 4;
            self.pixels[start..end].chunks_exact_mut(4).for_each(&mut f);
        }
    }
}

impl DrawingSurface for PixelSurface {
    type Context = PixelContext;

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn into_context_2d(self) -> Result<PixelContext, WorkerError> {
        Ok(PixelContext {
            surface: self,
            fill_style: Rgba::BLACK,
        })
    }
}

/// 2D context over a [`PixelSurface`]. Fill style defaults to black, as on
/// a fresh canvas.
#[derive(Debug)]
pub struct PixelContext {
    surface: PixelSurface,
    fill_style: Rgba,
}

impl PixelContext {
    pub fn fill_style(&self) -> Rgba {
        self.fill_style
    }
}

impl RenderContext for PixelContext {
    type Canvas = PixelSurface;

    fn canvas(&self) -> &PixelSurface {
        &self.surface
    }

    fn clear_rect(&mut self, rect: PixelRect) {
        self.surface
            .for_each_in(rect, |px| px.copy_from_slice(&Rgba::TRANSPARENT.to_bytes()));
    }

    fn set_fill_style(&mut self, color: Rgba) {
        self.fill_style = color;
    }

    fn fill_rect(&mut self, rect: PixelRect) {
        let color = self.fill_style;
        if color.is_opaque() {
            let bytes = color.to_bytes();
            self.surface.for_each_in(rect, |px| px.copy_from_slice(&bytes));
        } else {
            self.surface.for_each_in(rect, |px| {
                let dst = Rgba::from_bytes([px[0], px[1], px[2], px[3]]);
                px.copy_from_slice(&color.over(dst).to_bytes());
            });
        }
    }

    fn into_canvas(self) -> PixelSurface {
        self.surface
    }
}
