mod pixels_surface;
mod transform;

use thiserror::Error;

use super::RectF;

pub use pixels_surface::PixelsSurface;
pub use transform::{reference_scale, Viewport};

pub type Rgba = [u8; 4];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pixels backend error: {0}")]
    Pixels(#[from] pixels::Error),
    #[error("render target unavailable: {0}")]
    Unavailable(&'static str),
}

/// Double-buffered 2D drawing surface. Draw calls go to the back buffer and
/// become visible on [`RenderTarget::present`].
pub trait RenderTarget {
    fn clear(&mut self, color: Rgba);

    /// Sets the reference-to-pixel factor applied to later draw calls.
    fn scale(&mut self, factor: f64);

    fn fill_rect(&mut self, rect: RectF, color: Rgba);

    fn present(&mut self) -> Result<(), RenderError>;
}
