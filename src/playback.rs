//! Playback control: source loading, tick dispatch, caption edits.

use crate::{
    composite,
    core::{CanvasGeometry, CaptionStyle, Frame},
    driver::AnimationDriver,
    error::{CapgifError, CapgifResult},
    export::ExportSession,
    layout,
    surface::SurfaceSlot,
};

/// Owns the live surface, the driver handle, and the current geometry and
/// line set for one loaded source.
///
/// Everything is per-player state; loading a new source tears the previous
/// session down wholesale. The hosting event loop supplies timing by calling
/// [`tick`](Self::tick) once per frame delay.
pub struct CaptionPlayer {
    pub(crate) surface: SurfaceSlot,
    pub(crate) driver: Option<Box<dyn AnimationDriver>>,
    geometry: Option<CanvasGeometry>,
    caption: String,
    style: CaptionStyle,
    lines: Vec<String>,
    pub(crate) last_frame: Option<Frame>,
    pub(crate) session: Option<ExportSession>,
}

impl CaptionPlayer {
    pub fn new(surface: SurfaceSlot) -> Self {
        Self::with_style(surface, CaptionStyle::default())
    }

    pub fn with_style(surface: SurfaceSlot, style: CaptionStyle) -> Self {
        Self {
            surface,
            driver: None,
            geometry: None,
            caption: String::new(),
            style,
            lines: Vec::new(),
            last_frame: None,
            session: None,
        }
    }

    /// Swap in a new source and start playback.
    ///
    /// The old surface is discarded first (see [`SurfaceSlot::reset`]),
    /// geometry comes from the source's natural size capped at
    /// [`crate::core::MAX_CONTENT_HEIGHT`], and caption state is cleared.
    ///
    /// Rejected with [`CapgifError::SessionBusy`] while an export session is
    /// active: replacing the driver mid-capture would orphan the session
    /// against a torn-down source.
    pub fn load_source(&mut self, mut driver: Box<dyn AnimationDriver>) -> CapgifResult<()> {
        if self.export_in_progress() {
            return Err(CapgifError::SessionBusy);
        }

        let (natural_w, natural_h) = driver.natural_size();
        let geometry = CanvasGeometry::from_natural_size(natural_w, natural_h)?;
        tracing::debug!(
            natural_w,
            natural_h,
            content_w = geometry.content_width,
            content_h = geometry.content_height,
            "loading source"
        );

        let canvas = self.surface.reset();
        canvas.resize(geometry.content_width, geometry.surface_height());

        self.caption.clear();
        self.lines.clear();
        self.last_frame = None;
        self.geometry = Some(geometry);

        driver.reset();
        driver.start();
        self.driver = Some(driver);
        Ok(())
    }

    /// Pull the next due frame from the driver and dispatch it.
    ///
    /// A no-op when no source is loaded or the driver is stopped.
    pub fn tick(&mut self) -> CapgifResult<()> {
        let Some(frame) = self.driver.as_mut().and_then(|d| d.next_frame()) else {
            return Ok(());
        };
        self.dispatch(frame)
    }

    fn dispatch(&mut self, frame: Frame) -> CapgifResult<()> {
        self.paint(&frame);
        let delay_ms = frame.delay_or_default();
        self.last_frame = Some(frame);
        if self.capture_active() {
            self.capture_tick(delay_ms)?;
        }
        Ok(())
    }

    fn paint(&mut self, frame: &Frame) {
        let Some(geometry) = self.geometry else {
            return;
        };
        composite::paint(
            self.surface.canvas(),
            frame,
            &geometry,
            &self.lines,
            &self.style,
        );
    }

    /// Re-wrap the caption and refresh the surface.
    ///
    /// Order matters: wrap first, detect the line-count change, apply the
    /// surface resize (height only — width is immutable post-load), then
    /// repaint the most recent frame. Resizing before repainting avoids a
    /// stale band. Before any source is loaded the layout is still computed,
    /// but resize and repaint are a benign no-op.
    pub fn set_caption_text(&mut self, text: &str) {
        self.caption = text.to_string();
        self.relayout_and_repaint();
    }

    /// Restyle the caption. Runs the same re-wrap path as a text edit, since
    /// the font affects the measurement oracle and therefore the wrap width.
    pub fn set_style(&mut self, style: CaptionStyle) {
        self.style = style;
        self.relayout_and_repaint();
    }

    fn relayout_and_repaint(&mut self) {
        let width = self.surface.canvas_ref().width();
        let lines = {
            let canvas = self.surface.canvas_ref();
            let style = &self.style;
            layout::wrap(
                &self.caption,
                |s| canvas.measure_text(style, s),
                width as f32,
            )
        };
        let count_changed = lines.len() != self.lines.len();
        self.lines = lines;

        let Some(geometry) = self.geometry else {
            return;
        };
        if count_changed {
            let geometry = geometry.with_line_count(self.lines.len());
            self.geometry = Some(geometry);
            self.surface
                .canvas()
                .resize(geometry.content_width, geometry.surface_height());
        }
        if let Some(frame) = self.last_frame.take() {
            self.paint(&frame);
            self.last_frame = Some(frame);
        }
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn style(&self) -> &CaptionStyle {
        &self.style
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn geometry(&self) -> Option<CanvasGeometry> {
        self.geometry
    }

    pub fn surface_size(&self) -> (u32, u32) {
        let canvas = self.surface.canvas_ref();
        (canvas.width(), canvas.height())
    }
}
