//! The encoder seam and the bundled in-memory GIF encoder.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::{
    canvas::mul_div255,
    core::Raster,
    error::{CapgifError, CapgifResult},
};

/// Consumes ordered composited frames and produces the final artifact bytes.
pub trait FrameSink {
    fn add_frame(&mut self, snapshot: &Raster, delay_ms: u32) -> CapgifResult<()>;
    /// Finalize and hand back the encoded artifact. Calling twice, or adding
    /// frames afterwards, is an error.
    fn finish(&mut self) -> CapgifResult<Vec<u8>>;
}

#[derive(Clone, Debug)]
pub struct GifSinkConfig {
    pub width: u32,
    pub height: u32,
    /// Encoder speed/quality trade-off, 1 (best) ..= 30 (fastest).
    pub speed: i32,
}

impl GifSinkConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            speed: 10,
        }
    }

    pub fn validate(&self) -> CapgifResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CapgifError::validation("gif width/height must be non-zero"));
        }
        if !(1..=30).contains(&self.speed) {
            return Err(CapgifError::validation("gif speed must be in 1..=30"));
        }
        Ok(())
    }
}

/// GIF encoder writing to an in-memory buffer, looping forever.
///
/// Frames whose size drifted from the session size (a caption edit can resize
/// the surface mid-capture) are padded/cropped onto a white canvas rather
/// than rejected; the capture loop must never fall over because of an
/// unsynchronized edit.
pub struct GifSink {
    cfg: GifSinkConfig,
    encoder: Option<image::codecs::gif::GifEncoder<SharedBuf>>,
    buf: Rc<RefCell<Vec<u8>>>,
}

impl GifSink {
    pub fn new(cfg: GifSinkConfig) -> CapgifResult<Self> {
        cfg.validate()?;
        let buf = Rc::new(RefCell::new(Vec::new()));
        let mut encoder =
            image::codecs::gif::GifEncoder::new_with_speed(SharedBuf(Rc::clone(&buf)), cfg.speed);
        encoder
            .set_repeat(image::codecs::gif::Repeat::Infinite)
            .map_err(|e| CapgifError::export_failed(format!("failed to set gif repeat: {e}")))?;
        Ok(Self {
            cfg,
            encoder: Some(encoder),
            buf,
        })
    }
}

impl FrameSink for GifSink {
    fn add_frame(&mut self, snapshot: &Raster, delay_ms: u32) -> CapgifResult<()> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(CapgifError::export_failed("gif sink is already finalized"));
        };

        let rgba = fit_flatten(snapshot, self.cfg.width, self.cfg.height);
        let buffer = image::RgbaImage::from_raw(self.cfg.width, self.cfg.height, rgba)
            .ok_or_else(|| CapgifError::export_failed("snapshot buffer size mismatch (bug)"))?;
        let frame = image::Frame::from_parts(
            buffer,
            0,
            0,
            image::Delay::from_numer_denom_ms(delay_ms, 1),
        );
        encoder
            .encode_frame(frame)
            .map_err(|e| CapgifError::export_failed(format!("gif frame encode failed: {e}")))?;
        Ok(())
    }

    fn finish(&mut self) -> CapgifResult<Vec<u8>> {
        if self.encoder.take().is_none() {
            return Err(CapgifError::export_failed("gif sink is already finalized"));
        }
        // Dropping the encoder flushes the trailer into the shared buffer.
        Ok(std::mem::take(&mut *self.buf.borrow_mut()))
    }
}

/// Pad/crop a premultiplied snapshot onto an opaque white canvas of the
/// configured size, flattening alpha.
fn fit_flatten(snapshot: &Raster, width: u32, height: u32) -> Vec<u8> {
    let mut out = vec![255u8; (width as usize) * (height as usize) * 4];
    let copy_w = snapshot.width.min(width) as usize;
    let copy_h = snapshot.height.min(height) as usize;
    for y in 0..copy_h {
        for x in 0..copy_w {
            let si = (y * snapshot.width as usize + x) * 4;
            let di = (y * width as usize + x) * 4;
            let a = snapshot.data[si + 3] as u16;
            if a == 255 {
                out[di..di + 3].copy_from_slice(&snapshot.data[si..si + 3]);
            } else {
                let inv = 255u16 - a;
                for c in 0..3 {
                    let white = mul_div255(255, inv) as u16;
                    out[di + c] = (snapshot.data[si + c] as u16 + white).min(255) as u8;
                }
            }
            out[di + 3] = 255;
        }
    }
    out
}

struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
