use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::RectF;

use super::transform::rect_to_screen_px;
use super::{RenderError, RenderTarget, Rgba, Viewport};

pub struct PixelsSurface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    scale: f64,
}

impl PixelsSurface {
    pub fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            scale: 1.0,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, RenderError> {
        let surface = SurfaceTexture::new(width, height, window);
        Ok(Pixels::new(width, height, surface)?)
    }
}

impl RenderTarget for PixelsSurface {
    fn clear(&mut self, color: Rgba) {
        for chunk in self.pixels.frame_mut().chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn scale(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            warn!(factor, "ignored_invalid_surface_scale");
            return;
        }
        self.scale = factor;
    }

    fn fill_rect(&mut self, rect: RectF, color: Rgba) {
        let Some(px) = rect_to_screen_px(rect, self.scale, self.viewport) else {
            return;
        };
        let width = self.viewport.width as usize;
        let frame = self.pixels.frame_mut();
        for y in px.top as usize..px.bottom as usize {
            let start = (y * width + px.left as usize) * 4;
            let end = (y * width + px.right as usize) * 4;
            let Some(row) = frame.get_mut(start..end) else {
                return;
            };
            for chunk in row.chunks_exact_mut(4) {
                chunk.copy_from_slice(&color);
            }
        }
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        self.pixels.render()?;
        Ok(())
    }
}
