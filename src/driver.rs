//! The animation driver seam.
//!
//! The core treats the driver as an opaque capability set: natural size,
//! frame count, transport controls, and a per-tick frame pull. Timing lives
//! outside — whatever event loop hosts the player calls
//! [`crate::CaptionPlayer::tick`] when the current frame's delay elapses.
//! [`GifDriver`] is the bundled implementation, decoding a GIF up front via
//! the `image` crate and looping it.

use std::io::Cursor;
use std::path::Path;

use anyhow::Context as _;
use image::AnimationDecoder as _;
use image::ImageDecoder as _;

use crate::{
    core::{Frame, Raster},
    error::{CapgifError, CapgifResult},
};

pub trait AnimationDriver {
    /// Natural (undownscaled) content size of the source.
    fn natural_size(&self) -> (u32, u32);
    /// Number of frames in one full animation cycle.
    fn frame_count(&self) -> usize;
    fn start(&mut self);
    fn stop(&mut self);
    /// Rewind to the first frame. Playing/stopped state is unchanged.
    fn reset(&mut self);
    fn is_playing(&self) -> bool;
    /// The next due frame, or `None` when stopped or empty.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Looping GIF playback over frames decoded up front.
#[derive(Debug)]
pub struct GifDriver {
    width: u32,
    height: u32,
    frames: Vec<Frame>,
    cursor: usize,
    playing: bool,
}

impl GifDriver {
    pub fn from_bytes(bytes: &[u8]) -> CapgifResult<Self> {
        let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(bytes))
            .map_err(|e| CapgifError::source_load(format!("failed to read gif header: {e}")))?;
        let (width, height) = decoder.dimensions();

        let decoded = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| CapgifError::source_load(format!("failed to decode gif frames: {e}")))?;
        if decoded.is_empty() {
            return Err(CapgifError::source_load("gif contains no frames"));
        }

        let mut frames = Vec::with_capacity(decoded.len());
        for f in decoded {
            let (num, den) = f.delay().numer_denom_ms();
            let delay_ms = if den == 0 { 0 } else { (num + den / 2) / den };
            let (x, y) = (f.left(), f.top());
            let buf = f.into_buffer();
            let (fw, fh) = buf.dimensions();
            let mut data = buf.into_raw();
            premultiply_in_place(&mut data);
            frames.push(Frame {
                raster: Raster::from_rgba8(fw, fh, data)?,
                x,
                y,
                // Zero delays are conventionally ignored by players; treat
                // them as absent so the export default applies.
                delay_ms: (delay_ms > 0).then_some(delay_ms),
            });
        }

        Ok(Self {
            width,
            height,
            frames,
            cursor: 0,
            playing: false,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> CapgifResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read gif '{}'", path.display()))?;
        Self::from_bytes(&bytes)
    }
}

impl AnimationDriver for GifDriver {
    fn natural_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn start(&mut self) {
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if !self.playing || self.frames.is_empty() {
            return None;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Some(frame)
    }
}

fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::tiny_gif;

    #[test]
    fn decodes_frames_with_size_and_delays() {
        let bytes = tiny_gif(3, 4, &[[255, 0, 0, 255], [0, 255, 0, 255]], 120);
        let driver = GifDriver::from_bytes(&bytes).unwrap();
        assert_eq!(driver.natural_size(), (3, 4));
        assert_eq!(driver.frame_count(), 2);
        assert_eq!(driver.frames[0].delay_ms, Some(120));
    }

    #[test]
    fn stopped_driver_yields_no_frames() {
        let bytes = tiny_gif(2, 2, &[[1, 2, 3, 255]], 100);
        let mut driver = GifDriver::from_bytes(&bytes).unwrap();
        assert!(driver.next_frame().is_none());
        driver.start();
        assert!(driver.next_frame().is_some());
        driver.stop();
        assert!(driver.next_frame().is_none());
    }

    #[test]
    fn playback_loops_and_reset_rewinds() {
        let bytes = tiny_gif(2, 2, &[[10, 0, 0, 255], [0, 10, 0, 255]], 100);
        let mut driver = GifDriver::from_bytes(&bytes).unwrap();
        driver.start();

        let first = driver.next_frame().unwrap();
        let second = driver.next_frame().unwrap();
        let wrapped = driver.next_frame().unwrap();
        assert_ne!(first.raster.data, second.raster.data);
        assert_eq!(first.raster.data, wrapped.raster.data);

        driver.next_frame();
        driver.reset();
        let again = driver.next_frame().unwrap();
        assert_eq!(again.raster.data, first.raster.data);
    }

    #[test]
    fn garbage_bytes_are_a_source_load_error() {
        let err = GifDriver::from_bytes(b"definitely not a gif").unwrap_err();
        assert!(matches!(err, CapgifError::SourceLoad(_)));
    }
}
