//! One-cycle capture and re-encode.
//!
//! Export takes over the player's tick dispatch for exactly one full
//! animation cycle: every tick still runs the normal paint path, then the
//! composited surface is snapshotted and forwarded to the sink together with
//! the tick's delay. When the cycle completes the driver stops, the normal
//! dispatch is restored, and the sink is finalized into the artifact.
//!
//! The lifecycle is an explicit state machine rather than a set of flags;
//! transitions are guarded so the capture dispatch is installed and restored
//! exactly once per session, on every exit path including encoder errors.

use crate::{
    core::Raster,
    encode_gif::FrameSink,
    error::{CapgifError, CapgifResult},
    playback::CaptionPlayer,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Capturing,
    Encoding,
    Finished,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportProgress {
    pub captured: usize,
    pub total: usize,
}

pub type ProgressFn = Box<dyn FnMut(ExportProgress)>;

/// The bounded lifetime of one export: reset-to-first-frame through encoder
/// completion. At most one exists per player.
pub struct ExportSession {
    state: ExportState,
    total_frames: usize,
    captured: usize,
    sink: Box<dyn FrameSink>,
    on_progress: Option<ProgressFn>,
    artifact: Option<Vec<u8>>,
}

impl ExportSession {
    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn captured(&self) -> usize {
        self.captured
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }
}

impl CaptionPlayer {
    /// Begin capturing one full cycle into `sink`. Idle → Capturing.
    ///
    /// The frame total is read from the same driver instance being captured,
    /// after rewinding it to the first frame, so count and capture can never
    /// disagree about the source. A session already in flight is rejected
    /// with [`CapgifError::SessionBusy`] without touching it.
    #[tracing::instrument(skip(self, sink, on_progress))]
    pub fn begin_export(
        &mut self,
        sink: Box<dyn FrameSink>,
        on_progress: Option<ProgressFn>,
    ) -> CapgifResult<()> {
        if self.export_in_progress() {
            return Err(CapgifError::SessionBusy);
        }
        let Some(driver) = self.driver.as_mut() else {
            return Err(CapgifError::validation(
                "export requested with no source loaded",
            ));
        };
        let total_frames = driver.frame_count();
        if total_frames == 0 {
            return Err(CapgifError::validation("source reports zero frames"));
        }

        driver.reset();
        driver.start();
        tracing::debug!(total_frames, "export capture started");
        self.session = Some(ExportSession {
            state: ExportState::Capturing,
            total_frames,
            captured: 0,
            sink,
            on_progress,
            artifact: None,
        });
        Ok(())
    }

    pub fn export_state(&self) -> ExportState {
        self.session
            .as_ref()
            .map(ExportSession::state)
            .unwrap_or(ExportState::Idle)
    }

    pub fn export_session(&self) -> Option<&ExportSession> {
        self.session.as_ref()
    }

    pub(crate) fn export_in_progress(&self) -> bool {
        matches!(
            self.export_state(),
            ExportState::Capturing | ExportState::Encoding
        )
    }

    pub(crate) fn capture_active(&self) -> bool {
        self.export_state() == ExportState::Capturing
    }

    /// Capture the tick that was just painted. Runs after the normal paint
    /// path; only meaningful while Capturing.
    pub(crate) fn capture_tick(&mut self, delay_ms: u32) -> CapgifResult<()> {
        let snapshot: Raster = self.surface.canvas_ref().snapshot();
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.state != ExportState::Capturing || session.captured >= session.total_frames {
            return Ok(());
        }

        if let Err(e) = session.sink.add_frame(&snapshot, delay_ms) {
            session.state = ExportState::Failed;
            if let Some(driver) = self.driver.as_mut() {
                driver.stop();
            }
            return Err(CapgifError::export_failed(format!(
                "encoder rejected frame {}: {e}",
                session.captured
            )));
        }

        session.captured += 1;
        if let Some(notify) = session.on_progress.as_mut() {
            notify(ExportProgress {
                captured: session.captured,
                total: session.total_frames,
            });
        }

        if session.captured >= session.total_frames {
            // One full cycle captured: stop the driver and hand dispatch
            // back to normal playback before finalizing.
            if let Some(driver) = self.driver.as_mut() {
                driver.stop();
            }
            session.state = ExportState::Encoding;
            match session.sink.finish() {
                Ok(bytes) => {
                    tracing::debug!(
                        frames = session.total_frames,
                        bytes = bytes.len(),
                        "export finished"
                    );
                    session.artifact = Some(bytes);
                    session.state = ExportState::Finished;
                }
                Err(e) => {
                    session.state = ExportState::Failed;
                    return Err(CapgifError::export_failed(format!(
                        "encoder finalize failed: {e}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Take the finished artifact, clearing the session back to Idle.
    /// Also clears a failed session; returns `None` for it.
    pub fn take_artifact(&mut self) -> Option<Vec<u8>> {
        match self.export_state() {
            ExportState::Finished => self.session.take().and_then(|s| s.artifact),
            ExportState::Failed => {
                self.session = None;
                None
            }
            _ => None,
        }
    }

    /// Blocking convenience: begin an export and pump ticks to completion.
    pub fn export_to_sink(
        &mut self,
        sink: Box<dyn FrameSink>,
        on_progress: Option<ProgressFn>,
    ) -> CapgifResult<Vec<u8>> {
        self.begin_export(sink, on_progress)?;
        loop {
            if let Err(e) = self.tick() {
                self.take_artifact();
                return Err(e);
            }
            match self.export_state() {
                ExportState::Finished => {
                    return self.take_artifact().ok_or_else(|| {
                        CapgifError::export_failed("finished session lost its artifact (bug)")
                    });
                }
                ExportState::Failed => {
                    self.take_artifact();
                    return Err(CapgifError::export_failed("export failed"));
                }
                _ => {}
            }
            if self.capture_active() && !self.driver.as_ref().is_some_and(|d| d.is_playing()) {
                self.session = None;
                return Err(CapgifError::export_failed(
                    "driver stopped before the capture cycle completed",
                ));
            }
        }
    }
}
