//! Per-frame compositing: caption band, then frame, then text.

use crate::{
    canvas::Canvas2d,
    core::{BAND_COLOR, CanvasGeometry, CaptionStyle, Frame, TEXT_BASELINE_STEP},
};

/// Composite one animation tick onto the surface.
///
/// Paint order is load-bearing:
/// 1. clear the caption band (full surface width, from y=0 down to
///    `frame.y + band`) so stale pixels from a taller previous line set are
///    erased,
/// 2. draw the frame raster below the band, scaled to the content area,
/// 3. draw the caption lines on top, centered, one baseline step apart.
///
/// An empty `lines` slice renders the frame only (band height 0).
pub fn paint(
    canvas: &mut dyn Canvas2d,
    frame: &Frame,
    geometry: &CanvasGeometry,
    lines: &[String],
    style: &CaptionStyle,
) {
    let band = geometry.caption_band_height;

    canvas.fill_rect(0, 0, canvas.width(), frame.y + band, BAND_COLOR);
    canvas.draw_raster(
        &frame.raster,
        frame.x as i32,
        (frame.y + band) as i32,
        geometry.content_width,
        geometry.content_height,
    );

    let center_x = canvas.width() as f32 / 2.0;
    for (idx, line) in lines.iter().enumerate() {
        canvas.fill_text_centered(style, line, center_x, TEXT_BASELINE_STEP * (idx as f32 + 1.0));
    }
}
