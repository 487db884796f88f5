//! Surface lifecycle.
//!
//! Some animation decoders keep internal compositing buffers keyed to the
//! destination surface; reusing a surface across sources bleeds stale pixels
//! from the previous animation into the new one ("ghost frames"). Clearing
//! the surface is not enough to flush those buffers, so the slot throws the
//! surface away and builds a fresh one instead. [`SurfaceSlot::reset`] runs
//! before every source load and never during playback.

use crate::canvas::{Canvas2d, FontBank, PixelCanvas};

pub type CanvasFactory = Box<dyn Fn() -> Box<dyn Canvas2d>>;

/// Owns the live drawing surface and knows how to replace it.
pub struct SurfaceSlot {
    make: CanvasFactory,
    current: Box<dyn Canvas2d>,
}

impl SurfaceSlot {
    pub fn new(make: CanvasFactory) -> Self {
        let current = make();
        Self { make, current }
    }

    /// A slot producing [`PixelCanvas`] surfaces over the given fonts.
    pub fn with_fonts(fonts: FontBank) -> Self {
        Self::new(Box::new(move || Box::new(PixelCanvas::new(fonts.clone()))))
    }

    /// Discard the current surface and install a fresh zero-sized one.
    pub fn reset(&mut self) -> &mut dyn Canvas2d {
        self.current = (self.make)();
        self.current.as_mut()
    }

    pub fn canvas(&mut self) -> &mut dyn Canvas2d {
        self.current.as_mut()
    }

    pub fn canvas_ref(&self) -> &dyn Canvas2d {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingCanvas;

    #[test]
    fn reset_replaces_the_surface_with_a_zero_sized_one() {
        let mut slot = SurfaceSlot::new(Box::new(|| Box::new(RecordingCanvas::new(10.0))));
        slot.canvas().resize(100, 50);
        assert_eq!(slot.canvas_ref().width(), 100);

        slot.reset();
        assert_eq!(slot.canvas_ref().width(), 0);
        assert_eq!(slot.canvas_ref().height(), 0);
    }

    #[test]
    fn factory_runs_once_per_reset() {
        use std::cell::Cell;
        use std::rc::Rc;

        let made = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&made);
        let mut slot = SurfaceSlot::new(Box::new(move || {
            counter.set(counter.get() + 1);
            Box::new(RecordingCanvas::new(10.0))
        }));
        assert_eq!(made.get(), 1);
        slot.reset();
        slot.reset();
        assert_eq!(made.get(), 3);
    }
}
