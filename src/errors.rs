use crate::config::CanvasConfigError;
use crate::render::port::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("Native buffer allocation failed: {0}")]
    AllocationFailure(#[source] PortError),

    #[error("Native render failed: {0}")]
    RenderFailure(#[source] PortError),

    #[error("Invalid viewport size {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("{operation} must run on the owning thread")]
    ThreadingViolation { operation: &'static str },

    #[error("Invalid canvas configuration: {0}")]
    InvalidConfig(#[from] CanvasConfigError),

    #[error("Slot {slot} is out of range for {num_buffers} buffer(s)")]
    SlotOutOfRange { slot: usize, num_buffers: u32 },

    #[error("Frame does not belong to the bound render buffer")]
    StaleFrame,

    #[error("No render buffer is bound")]
    NotBound,

    #[error("Canvas has been disposed")]
    Disposed,

    #[error("Canvas is faulted after an allocation failure")]
    Faulted,

    #[error("{operation} would block a thread that drives an async runtime; poll tick() instead")]
    BlockingInRuntime { operation: &'static str },

    #[error("Render worker is gone")]
    WorkerGone,
}
