#![forbid(unsafe_code)]

pub mod canvas;
pub mod composite;
pub mod core;
pub mod driver;
pub mod encode_gif;
pub mod error;
pub mod export;
pub mod layout;
pub mod playback;
pub mod surface;

#[cfg(test)]
pub(crate) mod testutil;

pub use canvas::{Canvas2d, FontBank, PixelCanvas};
pub use core::{
    BAND_COLOR, BAND_LINE_HEIGHT, CanvasGeometry, CaptionStyle, DEFAULT_FONT_SIZE,
    DEFAULT_FRAME_DELAY_MS, Frame, MAX_CONTENT_HEIGHT, Raster, TEXT_BASELINE_STEP,
};
pub use driver::{AnimationDriver, GifDriver};
pub use encode_gif::{FrameSink, GifSink, GifSinkConfig};
pub use error::{CapgifError, CapgifResult};
pub use export::{ExportProgress, ExportSession, ExportState, ProgressFn};
pub use layout::wrap;
pub use playback::CaptionPlayer;
pub use surface::{CanvasFactory, SurfaceSlot};
