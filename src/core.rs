use crate::error::{CapgifError, CapgifResult};

/// The caption band grows by this many pixels per wrapped line.
pub const BAND_LINE_HEIGHT: u32 = 60;

/// Caption baselines sit at `TEXT_BASELINE_STEP * (index + 1)`.
///
/// Deliberately smaller than [`BAND_LINE_HEIGHT`]; the band reserves more room
/// than the baseline grid consumes, which is what gives the caption its
/// bottom margin.
pub const TEXT_BASELINE_STEP: f32 = 50.0;

/// Sources taller than this are downscaled on load, preserving aspect ratio.
pub const MAX_CONTENT_HEIGHT: u32 = 400;

pub const DEFAULT_FONT_SIZE: f32 = 30.0;

/// Used when a source frame carries no delay of its own.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// Fill color for the caption band.
pub const BAND_COLOR: [u8; 4] = [255, 255, 255, 255];

/// A premultiplied RGBA8 pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Raster {
    /// A transparent buffer of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> CapgifResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| CapgifError::validation("raster size overflow"))?;
        if data.len() != expected {
            return Err(CapgifError::validation(format!(
                "raster data length {} does not match {width}x{height}*4",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One decoded tick of the source animation: a raster patch, its offset within
/// the natural content area, and the display delay the source recorded for it.
#[derive(Clone, Debug)]
pub struct Frame {
    pub raster: Raster,
    pub x: u32,
    pub y: u32,
    /// `None` when the source supplies no delay (or a zero delay, which GIF
    /// players conventionally ignore).
    pub delay_ms: Option<u32>,
}

impl Frame {
    pub fn delay_or_default(&self) -> u32 {
        self.delay_ms.unwrap_or(DEFAULT_FRAME_DELAY_MS)
    }
}

/// Surface dimensions: fixed content area plus the variable caption band.
///
/// `content_width`/`content_height` are set once per loaded source and never
/// change until the next source loads; only the band height moves, and only
/// when the wrapped line count changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasGeometry {
    pub content_width: u32,
    pub content_height: u32,
    pub caption_band_height: u32,
}

impl CanvasGeometry {
    /// Geometry for a freshly loaded source: natural size capped at
    /// [`MAX_CONTENT_HEIGHT`] (width scaled to preserve aspect ratio, then
    /// truncated the way a canvas element truncates), band height zero.
    pub fn from_natural_size(width: u32, height: u32) -> CapgifResult<Self> {
        if width == 0 || height == 0 {
            return Err(CapgifError::validation(
                "source natural size must be non-zero",
            ));
        }
        let (content_width, content_height) = if height <= MAX_CONTENT_HEIGHT {
            (width, height)
        } else {
            let aspect = f64::from(width) / f64::from(height);
            let scaled = (f64::from(MAX_CONTENT_HEIGHT) * aspect) as u32;
            (scaled.max(1), MAX_CONTENT_HEIGHT)
        };
        Ok(Self {
            content_width,
            content_height,
            caption_band_height: 0,
        })
    }

    pub fn band_for_lines(line_count: usize) -> u32 {
        (line_count as u32).saturating_mul(BAND_LINE_HEIGHT)
    }

    pub fn with_line_count(self, line_count: usize) -> Self {
        Self {
            caption_band_height: Self::band_for_lines(line_count),
            ..self
        }
    }

    pub fn surface_height(&self) -> u32 {
        self.content_height + self.caption_band_height
    }
}

/// Caption appearance, supplied read-only by the enclosing UI.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Informational only: carried through serialization for the host UI.
    /// Face selection happens when the host builds its
    /// [`FontBank`](crate::canvas::FontBank); renderers never parse this.
    pub font_family: String,
    pub bold: bool,
    pub condensed: bool,
    /// Straight-alpha RGBA.
    pub color: [u8; 4],
    pub size_px: f32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            bold: false,
            condensed: false,
            color: [0, 0, 0, 255],
            size_px: DEFAULT_FONT_SIZE,
        }
    }
}
