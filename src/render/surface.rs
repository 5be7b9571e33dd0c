use crate::render::port::{Rect, RenderBuffer};

/// Display side of the pipeline: whatever shows the shared pixel memory on screen.
///
/// All calls happen on the owning thread. Implementations bind the memory
/// directly (no copy) and show the `window` sub-rectangle of it.
pub trait DisplaySurface {
    /// Binds the surface to new pixel memory. The surface shows nothing of it
    /// until the next `set_window`.
    fn bind(&mut self, buffer: &RenderBuffer);

    /// Selects the sub-rectangle of the bound memory that is visible.
    fn set_window(&mut self, window: Rect);

    /// Tells the surface that `region` (in buffer coordinates) has changed.
    fn invalidate(&mut self, region: Rect);

    /// Drops the binding.
    fn release(&mut self);
}

/// Headless [`DisplaySurface`] that keeps the binding in memory.
///
/// Useful for offscreen hosts, and as the surface tests observe commits through.
#[derive(Debug, Default)]
pub struct MemorySurface {
    bound: Option<RenderBuffer>,
    window: Rect,
    last_invalidated: Option<Rect>,
    binds: u64,
    invalidations: u64,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self) -> Option<&RenderBuffer> {
        self.bound.as_ref()
    }

    pub fn window(&self) -> Rect {
        self.window
    }

    pub fn last_invalidated(&self) -> Option<Rect> {
        self.last_invalidated
    }

    /// Number of times the surface was bound to memory.
    pub fn binds(&self) -> u64 {
        self.binds
    }

    /// Number of change notifications received.
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    /// Copies the pixels inside the current window, row by row. Only the
    /// slots the window covers are locked, one at a time.
    pub fn visible_pixels(&self) -> Option<Vec<u32>> {
        let buffer = self.bound.as_ref()?;
        let window = self.window.clipped_to(buffer.width(), buffer.total_height());
        let (stride, slot_height) = (buffer.width() as usize, buffer.height());
        let bottom = window.y + window.height;

        let mut out = Vec::with_capacity(window.width as usize * window.height as usize);
        let mut row = window.y;
        while row < bottom {
            let slot = row / slot_height;
            let slot_bottom = ((slot + 1) * slot_height).min(bottom);
            let first = row % slot_height;
            buffer.read_slot(slot as usize, |pixels| {
                for r in first..first + (slot_bottom - row) {
                    let start = r as usize * stride + window.x as usize;
                    out.extend_from_slice(&pixels[start..start + window.width as usize]);
                }
            });
            row = slot_bottom;
        }
        Some(out)
    }

    /// Pixel at `(x, y)` relative to the window origin.
    pub fn visible_pixel(&self, x: u32, y: u32) -> Option<u32> {
        let buffer = self.bound.as_ref()?;
        if x >= self.window.width || y >= self.window.height {
            return None;
        }
        let row = self.window.y + y;
        let index = (row % buffer.height()) as usize * buffer.width() as usize + (self.window.x + x) as usize;
        buffer
            .read_slot((row / buffer.height()) as usize, |pixels| pixels.get(index).copied())
            .flatten()
    }
}

impl DisplaySurface for MemorySurface {
    fn bind(&mut self, buffer: &RenderBuffer) {
        self.bound = Some(buffer.clone());
        self.window = Rect::EMPTY;
        self.binds += 1;
    }

    fn set_window(&mut self, window: Rect) {
        self.window = window;
    }

    fn invalidate(&mut self, region: Rect) {
        self.last_invalidated = Some(region);
        self.invalidations += 1;
    }

    fn release(&mut self) {
        self.bound = None;
        self.window = Rect::EMPTY;
        self.last_invalidated = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::port::ColorModel;

    #[test]
    fn visible_pixels_follow_the_window() {
        let buffer = RenderBuffer::allocate(2, 2, 2, ColorModel::IntArgbPre).unwrap();
        buffer.write_slot(0, |px| px.copy_from_slice(&[1, 2, 3, 4])).unwrap();
        buffer.write_slot(1, |px| px.copy_from_slice(&[5, 6, 7, 8])).unwrap();

        let mut surface = MemorySurface::new();
        surface.bind(&buffer);
        surface.set_window(Rect::new(0, 2, 1, 2));

        assert_eq!(surface.visible_pixels(), Some(vec![5, 7]));
        assert_eq!(surface.visible_pixel(0, 1), Some(7));
        assert_eq!(surface.visible_pixel(1, 0), None);
    }

    #[test]
    fn window_spanning_slots_is_read_slot_by_slot() {
        let buffer = RenderBuffer::allocate(2, 2, 2, ColorModel::IntArgbPre).unwrap();
        buffer.write_slot(0, |px| px.copy_from_slice(&[1, 2, 3, 4])).unwrap();
        buffer.write_slot(1, |px| px.copy_from_slice(&[5, 6, 7, 8])).unwrap();

        let mut surface = MemorySurface::new();
        surface.bind(&buffer);
        surface.set_window(Rect::new(1, 1, 1, 2));

        assert_eq!(surface.visible_pixels(), Some(vec![4, 6]));
        assert_eq!(surface.visible_pixel(0, 1), Some(6));
    }

    #[test]
    fn release_drops_binding() {
        let buffer = RenderBuffer::allocate(2, 2, 1, ColorModel::IntArgbPre).unwrap();
        let mut surface = MemorySurface::new();
        surface.bind(&buffer);
        surface.release();
        assert!(surface.bound().is_none());
        assert_eq!(surface.visible_pixels(), None);
        assert_eq!(surface.binds(), 1);
    }
}
