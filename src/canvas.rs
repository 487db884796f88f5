//! The raster surface the compositor draws on.
//!
//! [`Canvas2d`] is the seam the core consumes: fill, scaled blit, text
//! metrics, centered text fill, snapshot. [`PixelCanvas`] is the bundled
//! implementation: a premultiplied RGBA8 buffer plus fontdue glyph
//! rasterization.

use std::rc::Rc;

use crate::{
    core::{CaptionStyle, Raster},
    error::{CapgifError, CapgifResult},
};

/// Advance multiplier applied when a style asks for condensed text.
///
/// fontdue has no synthetic condensing, so tightened advances stand in for a
/// narrower face. The original surface's `condensed` font keyword was itself
/// best-effort.
pub const CONDENSED_ADVANCE_FACTOR: f32 = 0.85;

/// A 2D drawing surface.
///
/// `resize` clears the buffer, like a canvas element. Coordinates may fall
/// outside the surface; implementations clip.
pub trait Canvas2d {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn resize(&mut self, width: u32, height: u32);
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: [u8; 4]);
    /// Draw `src` scaled to `dst_w` x `dst_h` at (`x`, `y`), source-over.
    fn draw_raster(&mut self, src: &Raster, x: i32, y: i32, dst_w: u32, dst_h: u32);
    fn measure_text(&self, style: &CaptionStyle, text: &str) -> f32;
    fn fill_text_centered(&mut self, style: &CaptionStyle, text: &str, center_x: f32, baseline_y: f32);
    /// Copy the surface into an independent raster buffer.
    fn snapshot(&self) -> Raster;
}

/// Parsed font faces shared by every surface the player creates.
#[derive(Clone)]
pub struct FontBank {
    regular: Rc<fontdue::Font>,
    bold: Option<Rc<fontdue::Font>>,
}

impl FontBank {
    pub fn from_bytes(regular: &[u8], bold: Option<&[u8]>) -> CapgifResult<Self> {
        let regular = fontdue::Font::from_bytes(regular, fontdue::FontSettings::default())
            .map_err(|e| CapgifError::validation(format!("failed to parse font: {e}")))?;
        let bold = match bold {
            Some(bytes) => Some(Rc::new(
                fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
                    .map_err(|e| CapgifError::validation(format!("failed to parse bold font: {e}")))?,
            )),
            None => None,
        };
        Ok(Self {
            regular: Rc::new(regular),
            bold,
        })
    }

    /// The face to draw with, plus whether bold must be synthesized by
    /// double-striking.
    fn face(&self, style: &CaptionStyle) -> (&fontdue::Font, bool) {
        if style.bold {
            match &self.bold {
                Some(f) => (f.as_ref(), false),
                None => (self.regular.as_ref(), true),
            }
        } else {
            (self.regular.as_ref(), false)
        }
    }

    fn advance_factor(style: &CaptionStyle) -> f32 {
        if style.condensed {
            CONDENSED_ADVANCE_FACTOR
        } else {
            1.0
        }
    }
}

/// CPU surface: premultiplied RGBA8, nearest-neighbor scaling, fontdue text.
pub struct PixelCanvas {
    buffer: Raster,
    fonts: FontBank,
}

impl PixelCanvas {
    /// A zero-sized surface; callers resize before drawing.
    pub fn new(fonts: FontBank) -> Self {
        Self {
            buffer: Raster::new(0, 0),
            fonts,
        }
    }
}

impl Canvas2d for PixelCanvas {
    fn width(&self) -> u32 {
        self.buffer.width
    }

    fn height(&self) -> u32 {
        self.buffer.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.buffer = Raster::new(width, height);
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: [u8; 4]) {
        fill_rect(&mut self.buffer, x, y, w, h, color);
    }

    fn draw_raster(&mut self, src: &Raster, x: i32, y: i32, dst_w: u32, dst_h: u32) {
        draw_scaled(&mut self.buffer, src, x, y, dst_w, dst_h);
    }

    fn measure_text(&self, style: &CaptionStyle, text: &str) -> f32 {
        let (face, _) = self.fonts.face(style);
        let factor = FontBank::advance_factor(style);
        text.chars()
            .map(|c| face.metrics(c, style.size_px).advance_width * factor)
            .sum()
    }

    fn fill_text_centered(&mut self, style: &CaptionStyle, text: &str, center_x: f32, baseline_y: f32) {
        let total = self.measure_text(style, text);
        let (face, synthetic_bold) = self.fonts.face(style);
        let factor = FontBank::advance_factor(style);
        let color = premultiply(style.color);

        let mut pen_x = center_x - total / 2.0;
        let baseline = baseline_y.round() as i32;
        for c in text.chars() {
            let (metrics, coverage) = face.rasterize(c, style.size_px);
            let gx = (pen_x + metrics.xmin as f32).round() as i32;
            let gy = baseline - (metrics.height as i32 + metrics.ymin);
            blit_glyph(&mut self.buffer, &coverage, &metrics, gx, gy, color);
            if synthetic_bold {
                blit_glyph(&mut self.buffer, &coverage, &metrics, gx + 1, gy, color);
            }
            pen_x += metrics.advance_width * factor;
        }
    }

    fn snapshot(&self) -> Raster {
        self.buffer.clone()
    }
}

/// Fill a clipped rectangle, source-over.
pub(crate) fn fill_rect(dst: &mut Raster, x: i32, y: i32, w: u32, h: u32, color: [u8; 4]) {
    if dst.is_empty() || w == 0 || h == 0 {
        return;
    }
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = x.saturating_add(w as i32).clamp(0, dst.width as i32) as u32;
    let y1 = y.saturating_add(h as i32).clamp(0, dst.height as i32) as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            blend_px(dst, px, py, color);
        }
    }
}

/// Nearest-neighbor scaled blit, source-over.
pub(crate) fn draw_scaled(dst: &mut Raster, src: &Raster, x: i32, y: i32, dst_w: u32, dst_h: u32) {
    if dst.is_empty() || src.is_empty() || dst_w == 0 || dst_h == 0 {
        return;
    }
    for dy in 0..dst_h {
        let py = y + dy as i32;
        if py < 0 || py >= dst.height as i32 {
            continue;
        }
        let sy = (dy as u64 * src.height as u64 / dst_h as u64) as u32;
        for dx in 0..dst_w {
            let px = x + dx as i32;
            if px < 0 || px >= dst.width as i32 {
                continue;
            }
            let sx = (dx as u64 * src.width as u64 / dst_w as u64) as u32;
            let si = ((sy as usize * src.width as usize) + sx as usize) * 4;
            let s = [
                src.data[si],
                src.data[si + 1],
                src.data[si + 2],
                src.data[si + 3],
            ];
            blend_px(dst, px as u32, py as u32, s);
        }
    }
}

fn blit_glyph(
    dst: &mut Raster,
    coverage: &[u8],
    metrics: &fontdue::Metrics,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    for gy in 0..metrics.height {
        let py = y + gy as i32;
        if py < 0 || py >= dst.height as i32 {
            continue;
        }
        for gx in 0..metrics.width {
            let px = x + gx as i32;
            if px < 0 || px >= dst.width as i32 {
                continue;
            }
            let cov = coverage[gy * metrics.width + gx] as u16;
            if cov == 0 {
                continue;
            }
            let s = [
                mul_div255(color[0] as u16, cov),
                mul_div255(color[1] as u16, cov),
                mul_div255(color[2] as u16, cov),
                mul_div255(color[3] as u16, cov),
            ];
            blend_px(dst, px as u32, py as u32, s);
        }
    }
}

/// Source-over for premultiplied RGBA8.
fn blend_px(dst: &mut Raster, x: u32, y: u32, src: [u8; 4]) {
    let i = ((y as usize * dst.width as usize) + x as usize) * 4;
    let sa = src[3] as u16;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        dst.data[i..i + 4].copy_from_slice(&src);
        return;
    }
    let inv = 255u16 - sa;
    for c in 0..4 {
        let d = u16::from(mul_div255(dst.data[i + c] as u16, inv));
        dst.data[i + c] = (src[c] as u16 + d).min(255) as u8;
    }
}

pub(crate) fn premultiply(straight: [u8; 4]) -> [u8; 4] {
    let a = straight[3] as u16;
    if a == 255 {
        return straight;
    }
    [
        mul_div255(straight[0] as u16, a),
        mul_div255(straight[1] as u16, a),
        mul_div255(straight[2] as u16, a),
        straight[3],
    ]
}

pub(crate) fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
