//! Native rendering pipeline: viewport model, render port boundary, shared
//! buffers and their publication to a display surface.

pub mod port;
pub mod publisher;
pub mod surface;
pub mod painted;

/// Reference render ports.
pub mod backends;

mod viewport;

pub use painted::{PaintedImage, Painter, PixelSurface};
pub use port::{ColorModel, NativeRenderPort, PortError, Rect, RenderBuffer, SurfaceSize};
pub use publisher::{BufferPublisher, CommittedFrame};
pub use surface::{DisplaySurface, MemorySurface};
pub use viewport::Viewport;
