//! Native rendering canvas.
//!
//! Lets a native renderer paint directly into pixel memory shared with a
//! display surface, with panning, resizing and coalesced asynchronous
//! rendering. See [`canvas::NativeCanvas`] for the entry point.

pub mod canvas;
pub mod config;
pub mod errors;
pub mod event;
pub mod render;

pub use canvas::{CanvasId, NativeCanvas};
pub use config::CanvasConfig;
pub use errors::CanvasError;
pub use event::InputEvent;
pub use render::Viewport;
