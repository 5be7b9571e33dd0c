use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// Integer rectangle in pixels, used for display windows and dirty regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// A rectangle that covers nothing.
    pub const EMPTY: Rect = Rect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the part of this rectangle that lies within `width` x `height`.
    pub fn clipped_to(&self, width: u32, height: u32) -> Rect {
        if self.x >= width || self.y >= height {
            return Rect::EMPTY;
        }
        Rect {
            x: self.x,
            y: self.y,
            width: self.width.min(width - self.x),
            height: self.height.min(height - self.y),
        }
    }
}

/// Pixel layouts a native renderer can be asked to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorModel {
    /// 32 bit ARGB packed in a native-endian `u32`, alpha premultiplied.
    #[default]
    IntArgbPre,
}

impl ColorModel {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorModel::IntArgbPre => 4,
        }
    }
}

/// Errors reported by a [`NativeRenderPort`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    #[error("unsupported buffer layout: {num_buffers} buffer(s) of {width}x{height} as {color_model:?}")]
    UnsupportedLayout {
        width: u32,
        height: u32,
        num_buffers: u32,
        color_model: ColorModel,
    },

    #[error("buffer of {num_buffers} x {width}x{height} pixels exceeds addressable memory")]
    TooLarge { width: u32, height: u32, num_buffers: u32 },

    #[error("no render buffer has been allocated")]
    NotAllocated,

    #[error("native renderer fault: {0}")]
    Native(String),
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

struct BufferMemory {
    width: u32,
    height: u32,
    num_buffers: u32,
    color_model: ColorModel,
    generation: u64,
    /// One lock per slot, so the display can read the committed slot while the
    /// renderer writes the next one.
    slots: Box<[RwLock<Vec<u32>>]>,
}

/// Shared pixel memory holding `num_buffers` frame slots stacked vertically.
///
/// Cloning the handle shares the memory; pixels are never copied between the
/// renderer and the display. Each allocation gets a fresh generation number, and
/// slot indices of one generation mean nothing for another.
#[derive(Clone)]
pub struct RenderBuffer {
    inner: Arc<BufferMemory>,
}

impl std::fmt::Debug for RenderBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderBuffer")
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("num_buffers", &self.inner.num_buffers)
            .field("generation", &self.inner.generation)
            .finish()
    }
}

impl RenderBuffer {
    /// Allocates zeroed memory for `num_buffers` slots of `width` x `height` pixels.
    pub fn allocate(width: u32, height: u32, num_buffers: u32, color_model: ColorModel) -> Result<Self, PortError> {
        if width == 0 || height == 0 || num_buffers == 0 {
            return Err(PortError::UnsupportedLayout {
                width,
                height,
                num_buffers,
                color_model,
            });
        }

        let slot_len = (width as usize)
            .checked_mul(height as usize)
            .filter(|n| {
                n.checked_mul(num_buffers as usize)
                    .and_then(|total| total.checked_mul(color_model.bytes_per_pixel()))
                    .is_some()
            })
            .ok_or(PortError::TooLarge {
                width,
                height,
                num_buffers,
            })?;

        Ok(Self {
            inner: Arc::new(BufferMemory {
                width,
                height,
                num_buffers,
                color_model,
                generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
                slots: (0..num_buffers).map(|_| RwLock::new(vec![0; slot_len])).collect(),
            }),
        })
    }

    /// Width of one slot (and of the whole filmstrip) in pixels.
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Height of one slot in pixels.
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn num_buffers(&self) -> u32 {
        self.inner.num_buffers
    }

    /// Height of the whole filmstrip: `num_buffers * height`.
    pub fn total_height(&self) -> u32 {
        self.inner.num_buffers * self.inner.height
    }

    pub fn color_model(&self) -> ColorModel {
        self.inner.color_model
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.inner.width as usize * self.inner.color_model.bytes_per_pixel()
    }

    /// Size of the whole memory region in bytes.
    pub fn byte_len(&self) -> usize {
        self.stride() * self.total_height() as usize
    }

    pub fn slot_size(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.inner.width,
            height: self.inner.height,
        }
    }

    /// Whether both handles share the same memory.
    pub fn same_memory(&self, other: &RenderBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Gives write access to the pixels of one slot. Returns `None` for an
    /// out-of-range slot. Only that slot is locked.
    pub fn write_slot<R>(&self, slot: usize, f: impl FnOnce(&mut [u32]) -> R) -> Option<R> {
        let mut pixels = self.inner.slots.get(slot)?.write().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut pixels))
    }

    /// Gives read access to the pixels of one slot. Returns `None` for an
    /// out-of-range slot. Never waits on writes to other slots.
    pub fn read_slot<R>(&self, slot: usize, f: impl FnOnce(&[u32]) -> R) -> Option<R> {
        let pixels = self.inner.slots.get(slot)?.read().unwrap_or_else(PoisonError::into_inner);
        Some(f(&pixels))
    }
}

/// Boundary to an external, stateful native renderer.
///
/// A port is driven by exactly one thread at a time: the canvas either calls it
/// inline on the owning thread or moves it onto its single worker thread.
pub trait NativeRenderPort: Send {
    /// Name of the renderer, used in log messages.
    fn name(&self) -> &str;

    /// Creates the filmstrip buffer the renderer draws into. Any buffer returned
    /// earlier is invalidated. Rendering restarts at slot 0.
    fn allocate(
        &mut self,
        width: u32,
        height: u32,
        num_buffers: u32,
        color_model: ColorModel,
    ) -> Result<RenderBuffer, PortError>;

    /// Sets the renderer's read origin.
    fn move_to(&mut self, x: i32, y: i32);

    /// Renders one frame into the next slot and returns its index.
    fn render_frame(&mut self) -> Result<usize, PortError>;

    /// Releases all native resources. `allocate` must be called again before reuse.
    fn dispose(&mut self);
}
