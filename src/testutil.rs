//! Shared test doubles: an op-recording canvas, a scripted driver, and
//! collecting/failing sinks.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    canvas::Canvas2d,
    core::{CaptionStyle, DEFAULT_FONT_SIZE, Frame, Raster},
    driver::AnimationDriver,
    encode_gif::FrameSink,
    error::{CapgifError, CapgifResult},
    playback::CaptionPlayer,
    surface::SurfaceSlot,
};

/// Route tracing output through the test harness so `--nocapture` shows the
/// debug events. Safe to call from every test; later calls are no-ops.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Created,
    Resize {
        w: u32,
        h: u32,
    },
    FillRect {
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: [u8; 4],
    },
    DrawRaster {
        x: i32,
        y: i32,
        w: u32,
        h: u32,
    },
    FillText {
        text: String,
        center_x: f32,
        baseline_y: f32,
    },
}

/// Canvas that records draw calls instead of rasterizing. Text metrics are a
/// fixed per-character advance scaled by the style's font size, so wrap
/// behavior is deterministic without font files.
pub(crate) struct RecordingCanvas {
    width: u32,
    height: u32,
    glyph_width: f32,
    log: Rc<RefCell<Vec<Op>>>,
}

impl RecordingCanvas {
    pub(crate) fn new(glyph_width: f32) -> Self {
        Self::with_log(glyph_width, Rc::new(RefCell::new(Vec::new())))
    }

    pub(crate) fn with_log(glyph_width: f32, log: Rc<RefCell<Vec<Op>>>) -> Self {
        Self {
            width: 0,
            height: 0,
            glyph_width,
            log,
        }
    }

    pub(crate) fn ops(&self) -> Vec<Op> {
        self.log.borrow().clone()
    }
}

impl Canvas2d for RecordingCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.log.borrow_mut().push(Op::Resize {
            w: width,
            h: height,
        });
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: [u8; 4]) {
        self.log.borrow_mut().push(Op::FillRect { x, y, w, h, color });
    }

    fn draw_raster(&mut self, _src: &Raster, x: i32, y: i32, dst_w: u32, dst_h: u32) {
        self.log.borrow_mut().push(Op::DrawRaster {
            x,
            y,
            w: dst_w,
            h: dst_h,
        });
    }

    fn measure_text(&self, style: &CaptionStyle, text: &str) -> f32 {
        let scale = style.size_px / DEFAULT_FONT_SIZE;
        self.glyph_width * scale * text.chars().count() as f32
    }

    fn fill_text_centered(
        &mut self,
        _style: &CaptionStyle,
        text: &str,
        center_x: f32,
        baseline_y: f32,
    ) {
        self.log.borrow_mut().push(Op::FillText {
            text: text.to_string(),
            center_x,
            baseline_y,
        });
    }

    fn snapshot(&self) -> Raster {
        Raster::new(self.width, self.height)
    }
}

/// A player over recording surfaces that all append to one shared log. The
/// factory logs a `Created` op per surface it builds, so surface churn is
/// observable too.
pub(crate) fn recording_player(glyph_width: f32) -> (CaptionPlayer, Rc<RefCell<Vec<Op>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let shared = Rc::clone(&log);
    let slot = SurfaceSlot::new(Box::new(move || {
        shared.borrow_mut().push(Op::Created);
        Box::new(RecordingCanvas::with_log(glyph_width, Rc::clone(&shared)))
    }));
    (CaptionPlayer::new(slot), log)
}

pub(crate) fn solid_raster(width: u32, height: u32, color: [u8; 4]) -> Raster {
    let mut raster = Raster::new(width, height);
    for px in raster.data.chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
    raster
}

pub(crate) fn solid_frame(width: u32, height: u32, color: [u8; 4], delay_ms: Option<u32>) -> Frame {
    Frame {
        raster: solid_raster(width, height, color),
        x: 0,
        y: 0,
        delay_ms,
    }
}

/// Encode a small GIF in memory, one frame per color. Use delays that are
/// multiples of 10 ms; GIF stores centiseconds.
pub(crate) fn tiny_gif(width: u32, height: u32, colors: &[[u8; 4]], delay_ms: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = image::codecs::gif::GifEncoder::new(&mut bytes);
        for color in colors {
            let buffer = image::RgbaImage::from_pixel(width, height, image::Rgba(*color));
            let frame = image::Frame::from_parts(
                buffer,
                0,
                0,
                image::Delay::from_numer_denom_ms(delay_ms, 1),
            );
            encoder.encode_frame(frame).unwrap();
        }
    }
    bytes
}

/// Scripted in-memory driver with the same transport semantics as the GIF
/// one: looping cursor, `reset` rewinds without changing playing state.
pub(crate) struct FakeDriver {
    width: u32,
    height: u32,
    frames: Vec<Frame>,
    cursor: usize,
    playing: bool,
    yielded: usize,
    stall_after: Option<usize>,
}

impl FakeDriver {
    pub(crate) fn new(width: u32, height: u32, frame_count: usize) -> Self {
        let frames = (0..frame_count)
            .map(|i| solid_frame(width, height, [i as u8, 0, 0, 255], Some(40)))
            .collect();
        Self::with_frames(width, height, frames)
    }

    pub(crate) fn with_frames(width: u32, height: u32, frames: Vec<Frame>) -> Self {
        Self {
            width,
            height,
            frames,
            cursor: 0,
            playing: false,
            yielded: 0,
            stall_after: None,
        }
    }

    /// Stop yielding (and report not playing) after `n` frames, simulating a
    /// source that dies mid-cycle.
    pub(crate) fn stall_after(&mut self, n: usize) {
        self.stall_after = Some(n);
    }
}

impl AnimationDriver for FakeDriver {
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
        self.yielded += 1;
        if self.stall_after.is_some_and(|n| self.yielded >= n) {
            self.playing = false;
        }
        Some(frame)
    }
}

#[derive(Debug, Default)]
pub(crate) struct SinkLog {
    pub(crate) frames: Vec<CapturedFrame>,
    pub(crate) finished: bool,
}

#[derive(Debug)]
pub(crate) struct CapturedFrame {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) delay_ms: u32,
}

/// Sink that records frame sizes and delays into a shared log.
pub(crate) struct CollectingSink {
    log: Rc<RefCell<SinkLog>>,
}

impl CollectingSink {
    pub(crate) fn new() -> (Self, Rc<RefCell<SinkLog>>) {
        let log = Rc::new(RefCell::new(SinkLog::default()));
        (Self { log: Rc::clone(&log) }, log)
    }
}

impl FrameSink for CollectingSink {
    fn add_frame(&mut self, snapshot: &Raster, delay_ms: u32) -> CapgifResult<()> {
        self.log.borrow_mut().frames.push(CapturedFrame {
            width: snapshot.width,
            height: snapshot.height,
            delay_ms,
        });
        Ok(())
    }

    fn finish(&mut self) -> CapgifResult<Vec<u8>> {
        let mut log = self.log.borrow_mut();
        if log.finished {
            return Err(CapgifError::export_failed("sink already finalized"));
        }
        log.finished = true;
        Ok(format!("encoded {} frames", log.frames.len()).into_bytes())
    }
}

/// Sink that fails on a chosen frame index, or at finalize.
pub(crate) struct FailingSink {
    fail_on_frame: Option<usize>,
    fail_on_finish: bool,
    seen: usize,
}

impl FailingSink {
    /// Accept `index` frames, then reject the next one.
    pub(crate) fn on_frame(index: usize) -> Self {
        Self {
            fail_on_frame: Some(index),
            fail_on_finish: false,
            seen: 0,
        }
    }

    pub(crate) fn on_finish() -> Self {
        Self {
            fail_on_frame: None,
            fail_on_finish: true,
            seen: 0,
        }
    }
}

impl FrameSink for FailingSink {
    fn add_frame(&mut self, _snapshot: &Raster, _delay_ms: u32) -> CapgifResult<()> {
        if self.fail_on_frame == Some(self.seen) {
            return Err(CapgifError::export_failed("synthetic frame failure"));
        }
        self.seen += 1;
        Ok(())
    }

    fn finish(&mut self) -> CapgifResult<Vec<u8>> {
        if self.fail_on_finish {
            return Err(CapgifError::export_failed("synthetic finalize failure"));
        }
        Ok(b"ok".to_vec())
    }
}
