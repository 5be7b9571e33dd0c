//! Viewport definition for native rendering.
//!
//! A [`Viewport`] describes the rectangle of native-renderer space that is
//! currently materialized into a render buffer. It is defined by its top-left
//! corner `(x, y)` and its `width`/`height` in pixels.
//!
//! Viewports are immutable values: panning or resizing produces a new value.
//! The scheduler compares old and new values to decide whether the native
//! buffer must be reallocated, so nothing ever mutates one in place.
//!
//! # Examples
//!
//! ```
//! use native_canvas::render::Viewport;
//!
//! let vp = Viewport::EMPTY.quantized_resize(70, 70, 64);
//! assert_eq!((vp.width(), vp.height()), (128, 128));
//!
//! let moved = vp.translated_by(10, -20);
//! assert_eq!((moved.x(), moved.y()), (10, -20));
//! assert!(moved.same_size(&vp));
//! ```

use crate::errors::CanvasError;
use crate::render::port::SurfaceSize;

/// Rectangle of native-renderer space backed by a render buffer.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct Viewport {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl std::fmt::Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "Viewport {{ empty }}");
        }
        write!(
            f,
            "Viewport {{ x: {}, y: {}, width: {}, height: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl Viewport {
    /// The canonical empty viewport. It is the only viewport with a zero size.
    pub const EMPTY: Viewport = Viewport {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    /// Creates a new non-empty [`Viewport`].
    ///
    /// Returns [`CanvasError::InvalidViewport`] if either dimension is zero; use
    /// [`Viewport::EMPTY`] for the empty viewport.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidViewport { width, height });
        }
        Ok(Self { x, y, width, height })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns true iff this is [`Viewport::EMPTY`].
    pub fn is_empty(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Returns a viewport whose size is the given pane size rounded up to the next
    /// multiple of `increment`, keeping the origin.
    ///
    /// Rounding in coarse steps keeps the native buffer from being reallocated on
    /// every one pixel change of the pane. An `increment` of zero is treated as one.
    /// If either rounded dimension is zero the result is [`Viewport::EMPTY`].
    pub fn quantized_resize(&self, pane_width: u32, pane_height: u32, increment: u32) -> Viewport {
        let width = round_up(pane_width, increment);
        let height = round_up(pane_height, increment);
        if width == 0 || height == 0 {
            return Viewport::EMPTY;
        }

        Viewport {
            x: self.x,
            y: self.y,
            width,
            height,
        }
    }

    /// Returns this viewport moved by `(dx, dy)`. The empty viewport stays empty.
    pub fn translated_by(&self, dx: i32, dy: i32) -> Viewport {
        if self.is_empty() {
            return Viewport::EMPTY;
        }

        Viewport {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }

    /// Whether both viewports have the same dimensions, regardless of origin.
    pub fn same_size(&self, other: &Viewport) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Converts this viewport to a [`SurfaceSize`].
    pub fn as_size(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.width,
            height: self.height,
        }
    }
}

fn round_up(n: u32, increment: u32) -> u32 {
    let k = increment.max(1);
    let rounded = (u64::from(n) + u64::from(k) - 1) / u64::from(k) * u64::from(k);
    // Clamp to the largest representable multiple.
    u32::try_from(rounded).unwrap_or(u32::MAX / k * k)
}
