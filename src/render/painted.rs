//! In-process painted image.
//!
//! [`PaintedImage`] is the single-buffer sibling of the native canvas: one
//! pixel surface shared with the display, painted by a [`Painter`] instead of
//! an external renderer. Whatever the painter draws shows up without a copy
//! once the update returns.

use crate::errors::CanvasError;
use crate::render::port::{ColorModel, Rect, RenderBuffer};
use crate::render::publisher::BufferPublisher;
use crate::render::surface::DisplaySurface;

/// Write access to the pixels of a [`PaintedImage`] during a paint call.
pub struct PixelSurface<'a> {
    pixels: &'a mut [u32],
    width: u32,
    height: u32,
}

impl PixelSurface<'_> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw premultiplied ARGB pixels, row major.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut *self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = argb;
        }
    }

    /// Fills `rect`, clipped to the surface.
    pub fn fill_rect(&mut self, rect: Rect, argb: u32) {
        let r = rect.clipped_to(self.width, self.height);
        for y in r.y..r.y + r.height {
            let start = (y * self.width + r.x) as usize;
            self.pixels[start..start + r.width as usize].fill(argb);
        }
    }

    pub fn clear(&mut self, argb: u32) {
        self.pixels.fill(argb);
    }
}

/// Drawing logic for a [`PaintedImage`].
///
/// The returned region is a refresh hint: `None` means the whole surface may
/// have changed, an empty rectangle means nothing visible changed.
pub trait Painter {
    fn paint(&mut self, surface: &mut PixelSurface<'_>) -> Option<Rect>;
}

impl<F> Painter for F
where
    F: FnMut(&mut PixelSurface<'_>) -> Option<Rect>,
{
    fn paint(&mut self, surface: &mut PixelSurface<'_>) -> Option<Rect> {
        self(surface)
    }
}

pub struct PaintedImage<S: DisplaySurface> {
    buffer: RenderBuffer,
    publisher: BufferPublisher<S>,
    on_update: Option<Box<dyn Painter>>,
}

impl<S: DisplaySurface> PaintedImage<S> {
    /// Allocates a `width` x `height` image and binds `surface` to it.
    pub fn new(width: u32, height: u32, surface: S) -> Result<Self, CanvasError> {
        let buffer = RenderBuffer::allocate(width, height, 1, ColorModel::IntArgbPre)
            .map_err(CanvasError::AllocationFailure)?;
        Self::wrap(buffer, surface)
    }

    /// Wraps existing memory. Only single-slot buffers can be painted.
    pub fn wrap(buffer: RenderBuffer, surface: S) -> Result<Self, CanvasError> {
        if buffer.num_buffers() != 1 {
            return Err(CanvasError::SlotOutOfRange {
                slot: 1,
                num_buffers: buffer.num_buffers(),
            });
        }
        let mut publisher = BufferPublisher::with_buffer(surface, buffer.clone());
        // Bind the surface right away with nothing changed yet.
        publisher.publish_region(Some(Rect::EMPTY))?;

        Ok(Self {
            buffer,
            publisher,
            on_update: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// The shared memory, for hosts that need direct access.
    pub fn buffer(&self) -> &RenderBuffer {
        &self.buffer
    }

    pub fn surface(&self) -> &S {
        self.publisher.surface()
    }

    /// Paints once with `painter` and publishes the changed region. Returns the
    /// region announced to the display, `None` if nothing changed.
    pub fn update_with(&mut self, painter: &mut dyn Painter) -> Result<Option<Rect>, CanvasError> {
        let (width, height) = (self.buffer.width(), self.buffer.height());
        let region = self
            .buffer
            .write_slot(0, |pixels| {
                let mut surface = PixelSurface { pixels, width, height };
                painter.paint(&mut surface)
            })
            .ok_or(CanvasError::NotBound)?;

        self.publisher.publish_region(region)
    }

    /// Registers the painter used by [`update`](Self::update).
    pub fn set_on_update(&mut self, painter: impl Painter + 'static) {
        self.on_update = Some(Box::new(painter));
    }

    pub fn clear_on_update(&mut self) {
        self.on_update = None;
    }

    /// Paints with the registered painter. Does nothing if none is registered.
    pub fn update(&mut self) -> Result<Option<Rect>, CanvasError> {
        let Some(mut painter) = self.on_update.take() else {
            return Ok(None);
        };
        let result = self.update_with(&mut *painter);
        self.on_update = Some(painter);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::MemorySurface;

    const RED: u32 = 0xFFFF_0000;

    #[test]
    fn one_shot_update_paints_and_publishes_region() {
        let mut image = PaintedImage::new(10, 10, MemorySurface::new()).unwrap();
        assert_eq!(image.surface().binds(), 1);
        assert_eq!(image.surface().invalidations(), 0);

        let region = image
            .update_with(&mut |s: &mut PixelSurface<'_>| {
                s.fill_rect(Rect::new(2, 2, 3, 3), RED);
                Some(Rect::new(2, 2, 3, 3))
            })
            .unwrap();

        assert_eq!(region, Some(Rect::new(2, 2, 3, 3)));
        assert_eq!(image.surface().visible_pixel(3, 3), Some(RED));
        assert_eq!(image.surface().visible_pixel(0, 0), Some(0));
        assert_eq!(image.surface().last_invalidated(), Some(Rect::new(2, 2, 3, 3)));
    }

    #[test]
    fn absent_region_means_whole_surface() {
        let mut image = PaintedImage::new(4, 3, MemorySurface::new()).unwrap();
        let region = image
            .update_with(&mut |s: &mut PixelSurface<'_>| {
                s.clear(RED);
                None
            })
            .unwrap();
        assert_eq!(region, Some(Rect::new(0, 0, 4, 3)));
    }

    #[test]
    fn empty_region_skips_the_refresh() {
        let mut image = PaintedImage::new(4, 4, MemorySurface::new()).unwrap();
        let region = image
            .update_with(&mut |_: &mut PixelSurface<'_>| Some(Rect::EMPTY))
            .unwrap();
        assert_eq!(region, None);
        assert_eq!(image.surface().invalidations(), 0);
    }

    #[test]
    fn registered_painter_runs_on_every_update() {
        let mut image = PaintedImage::new(4, 1, MemorySurface::new()).unwrap();
        assert_eq!(image.update().unwrap(), None);

        let mut column = 0;
        image.set_on_update(move |s: &mut PixelSurface<'_>| {
            s.set_pixel(column, 0, RED);
            column += 1;
            Some(Rect::new(column - 1, 0, 1, 1))
        });
        image.update().unwrap();
        image.update().unwrap();

        assert_eq!(image.surface().visible_pixels(), Some(vec![RED, RED, 0, 0]));
        assert_eq!(image.surface().invalidations(), 2);
    }

    #[test]
    fn wrap_rejects_filmstrips() {
        let buffer = RenderBuffer::allocate(4, 4, 2, ColorModel::IntArgbPre).unwrap();
        assert!(PaintedImage::wrap(buffer, MemorySurface::new()).is_err());
    }
}
