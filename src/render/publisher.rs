//! Buffer publishing.
//!
//! The [`BufferPublisher`] owns the binding between the shared render buffer
//! and the display surface, and performs the commit: the moment a freshly
//! rendered slot becomes visible.
//!
//! Reallocation and display binding are split on purpose. A new buffer is
//! adopted as soon as the renderer has allocated it, but the surface keeps
//! showing the old memory until the first frame of the new buffer is
//! committed. A failed render after a reallocation therefore never blanks the
//! last committed frame.

use std::thread::{self, ThreadId};

use crate::errors::CanvasError;
use crate::render::port::{ColorModel, NativeRenderPort, Rect, RenderBuffer};
use crate::render::surface::DisplaySurface;
use crate::render::Viewport;

/// Identity of the thread allowed to touch the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OwningThread(ThreadId);

impl OwningThread {
    pub(crate) fn current() -> Self {
        Self(thread::current().id())
    }

    pub(crate) fn check(&self, operation: &'static str) -> Result<(), CanvasError> {
        if thread::current().id() != self.0 {
            log::error!(
                "{operation} called from {:?}, owning thread is {:?}",
                thread::current().name().unwrap_or("<unnamed>"),
                self.0
            );
            return Err(CanvasError::ThreadingViolation { operation });
        }
        Ok(())
    }
}

/// The frame currently visible on the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedFrame {
    /// Slot of the filmstrip the frame was rendered into.
    pub slot: usize,
    /// Viewport the frame was rendered for.
    pub viewport: Viewport,
    /// Visible sub-rectangle of the filmstrip.
    pub window: Rect,
    /// Generation of the buffer holding the frame.
    pub generation: u64,
}

pub struct BufferPublisher<S: DisplaySurface> {
    surface: S,
    owner: OwningThread,
    num_buffers: u32,
    color_model: ColorModel,
    /// Latest allocation; the renderer writes here.
    buffer: Option<RenderBuffer>,
    /// Memory the surface is bound to; may lag behind `buffer` until the next commit.
    bound: Option<RenderBuffer>,
    committed: Option<CommittedFrame>,
}

impl<S: DisplaySurface> BufferPublisher<S> {
    /// Creates a publisher for a filmstrip of `num_buffers` slots. The calling
    /// thread becomes the owning thread.
    pub fn new(surface: S, num_buffers: u32, color_model: ColorModel) -> Self {
        Self {
            surface,
            owner: OwningThread::current(),
            num_buffers: num_buffers.max(1),
            color_model,
            buffer: None,
            bound: None,
            committed: None,
        }
    }

    /// Creates a single-buffer publisher around memory painted in-process.
    pub fn with_buffer(surface: S, buffer: RenderBuffer) -> Self {
        let mut publisher = Self::new(surface, buffer.num_buffers(), buffer.color_model());
        publisher.buffer = Some(buffer);
        publisher
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Latest allocated buffer, if any.
    pub fn buffer(&self) -> Option<&RenderBuffer> {
        self.buffer.as_ref()
    }

    pub fn committed(&self) -> Option<&CommittedFrame> {
        self.committed.as_ref()
    }

    /// Makes sure the render buffer matches the size of `viewport`, allocating a
    /// new one through `port` when it does not. Returns whether a reallocation
    /// happened.
    pub fn ensure_capacity(
        &mut self,
        port: &mut dyn NativeRenderPort,
        viewport: &Viewport,
    ) -> Result<bool, CanvasError> {
        self.owner.check("ensure_capacity")?;

        if viewport.is_empty() {
            return Err(CanvasError::InvalidViewport { width: 0, height: 0 });
        }
        if self.buffer.as_ref().is_some_and(|b| b.slot_size() == viewport.as_size()) {
            return Ok(false);
        }

        let buffer = port
            .allocate(viewport.width(), viewport.height(), self.num_buffers, self.color_model)
            .map_err(CanvasError::AllocationFailure)?;
        log::debug!(
            "{} allocated {}x{} x{} (generation {})",
            port.name(),
            buffer.width(),
            buffer.height(),
            buffer.num_buffers(),
            buffer.generation()
        );
        self.rebind(buffer)?;
        Ok(true)
    }

    /// Adopts a buffer allocated elsewhere (on the render worker). The display
    /// switches over to it with the next commit. Returns whether the buffer is new.
    pub fn rebind(&mut self, buffer: RenderBuffer) -> Result<bool, CanvasError> {
        self.owner.check("rebind")?;

        if self.buffer.as_ref().is_some_and(|b| b.same_memory(&buffer)) {
            return Ok(false);
        }
        if buffer.num_buffers() != self.num_buffers {
            log::warn!(
                "renderer allocated {} slot(s), {} requested",
                buffer.num_buffers(),
                self.num_buffers
            );
            self.num_buffers = buffer.num_buffers();
        }
        self.buffer = Some(buffer);
        Ok(true)
    }

    /// Makes `slot` of the current buffer visible.
    ///
    /// The window is `(0, slot * height, min(visible_width, width), min(visible_height, height))`
    /// and is set and announced to the surface in one step.
    pub fn commit(
        &mut self,
        slot: usize,
        viewport: &Viewport,
        visible_width: u32,
        visible_height: u32,
    ) -> Result<CommittedFrame, CanvasError> {
        self.owner.check("commit")?;

        let buffer = self.buffer.clone().ok_or(CanvasError::NotBound)?;
        if slot >= buffer.num_buffers() as usize {
            return Err(CanvasError::SlotOutOfRange {
                slot,
                num_buffers: buffer.num_buffers(),
            });
        }
        if buffer.slot_size() != viewport.as_size() {
            return Err(CanvasError::StaleFrame);
        }

        self.bind_if_needed(&buffer);

        let window = Rect {
            x: 0,
            y: slot as u32 * viewport.height(),
            width: visible_width.min(viewport.width()),
            height: visible_height.min(viewport.height()),
        };
        self.surface.set_window(window);
        self.surface.invalidate(window);

        let frame = CommittedFrame {
            slot,
            viewport: *viewport,
            window,
            generation: buffer.generation(),
        };
        self.committed = Some(frame);
        Ok(frame)
    }

    /// Single-buffer commit for in-process painting.
    ///
    /// `None` means the whole surface changed, an empty region means nothing
    /// visibly changed. Returns the region that was announced to the surface.
    pub fn publish_region(&mut self, region: Option<Rect>) -> Result<Option<Rect>, CanvasError> {
        self.owner.check("publish_region")?;

        let buffer = self.buffer.clone().ok_or(CanvasError::NotBound)?;
        let full = Rect::new(0, 0, buffer.width(), buffer.height());
        if self.bind_if_needed(&buffer) {
            self.surface.set_window(full);
        }

        let changed = match region {
            None => full,
            Some(r) => r.clipped_to(full.width, full.height),
        };
        if changed.is_empty() {
            return Ok(None);
        }

        self.surface.invalidate(changed);
        self.committed = Some(CommittedFrame {
            slot: 0,
            viewport: Viewport::new(0, 0, buffer.width(), buffer.height()).unwrap_or(Viewport::EMPTY),
            window: full,
            generation: buffer.generation(),
        });
        Ok(Some(changed))
    }

    /// Unbinds the surface and forgets all buffers.
    pub fn release(&mut self) -> Result<(), CanvasError> {
        self.owner.check("release")?;

        self.surface.release();
        self.buffer = None;
        self.bound = None;
        self.committed = None;
        Ok(())
    }

    fn bind_if_needed(&mut self, buffer: &RenderBuffer) -> bool {
        if self.bound.as_ref().is_some_and(|b| b.same_memory(buffer)) {
            return false;
        }
        self.surface.bind(buffer);
        self.bound = Some(buffer.clone());
        true
    }
}
