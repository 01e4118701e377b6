use crate::app::RectF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Uniform factor that makes the reference canvas cover `viewport`.
pub fn reference_scale(viewport: Viewport, reference: Viewport) -> f64 {
    let scale_x = f64::from(viewport.width) / f64::from(reference.width.max(1));
    let scale_y = f64::from(viewport.height) / f64::from(reference.height.max(1));
    scale_x.max(scale_y)
}

/// Pixel rectangle with exclusive right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScreenRectPx {
    pub(crate) left: u32,
    pub(crate) top: u32,
    pub(crate) right: u32,
    pub(crate) bottom: u32,
}

pub(crate) fn rect_to_screen_px(
    rect: RectF,
    scale: f64,
    viewport: Viewport,
) -> Option<ScreenRectPx> {
    let to_px = |value: f32, limit: u32| -> u32 {
        let scaled = (f64::from(value) * scale).round();
        scaled.clamp(0.0, f64::from(limit)) as u32
    };

    let left = to_px(rect.x, viewport.width);
    let right = to_px(rect.x + rect.width, viewport.width);
    let top = to_px(rect.y, viewport.height);
    let bottom = to_px(rect.y + rect.height, viewport.height);

    if left >= right || top >= bottom {
        return None;
    }
    Some(ScreenRectPx {
        left,
        top,
        right,
        bottom,
    })
}
