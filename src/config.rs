//! Canvas configuration.
//!
//! `CanvasConfig` holds the per-canvas knobs of the rendering pipeline: how many
//! frame slots the native buffer has, the step in which the buffer grows or
//! shrinks, and whether rendering runs on a dedicated worker thread.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use native_canvas::config::CanvasConfig;
//! let cfg = CanvasConfig::default();
//! assert_eq!(cfg.num_buffers, 2);
//! assert_eq!(cfg.view_increment, 64);
//! assert!(!cfg.asynchronous);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use native_canvas::config::CanvasConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = CanvasConfig::builder()
//!     .num_buffers(1)
//!     .view_increment(32)
//!     .asynchronous(true)
//!     .worker_name("map-renderer")
//!     .build()?; // returns Result<CanvasConfig, CanvasConfigError>
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `num_buffers`: Frame slots in the render buffer, 2 for double buffering (default: 2).
//! - `view_increment`: Quantization step of the viewport size in pixels (default: 64).
//! - `asynchronous`: Render on a dedicated worker thread instead of the owning thread (default: false).
//! - `color_model`: Pixel layout requested from the renderer (default: `IntArgbPre`).
//! - `worker_name`: Name of the worker thread (default: `NativeRenderer`).
//!
//! # Errors
//!
//! Builder validation returns [`CanvasConfigError`] when `num_buffers == 0`,
//! `view_increment == 0` or the worker name is blank.

use crate::render::port::ColorModel;
use std::fmt;

const DEFAULT_WORKER_NAME: &str = "NativeRenderer";

#[derive(Debug, Clone)]
pub struct CanvasConfig {
    pub num_buffers: u32,
    pub view_increment: u32,
    pub asynchronous: bool,
    pub color_model: ColorModel,
    pub worker_name: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            num_buffers: 2,
            view_increment: 64,
            asynchronous: false,
            color_model: ColorModel::IntArgbPre,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}

impl CanvasConfig {
    pub fn builder() -> CanvasConfigBuilder {
        CanvasConfigBuilder::default()
    }

    /// Checks a config that was assembled by hand instead of through the builder.
    pub fn validate(&self) -> Result<(), CanvasConfigError> {
        validate(self)
    }
}

/// Builder for [`CanvasConfig`].
#[derive(Debug, Clone, Default)]
pub struct CanvasConfigBuilder {
    inner: CanvasConfig,
}

impl CanvasConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut CanvasConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn num_buffers(self, n: u32) -> Self { self.map(|c| c.num_buffers = n) }
    pub fn view_increment(self, px: u32) -> Self { self.map(|c| c.view_increment = px) }
    pub fn asynchronous(self, on: bool) -> Self { self.map(|c| c.asynchronous = on) }
    pub fn color_model(self, model: ColorModel) -> Self { self.map(|c| c.color_model = model) }
    pub fn worker_name<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.worker_name = name.into()) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut CanvasConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<CanvasConfig, CanvasConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasConfigError {
    ZeroBuffers,
    ZeroIncrement,
    BlankWorkerName,
}

impl fmt::Display for CanvasConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasConfigError::ZeroBuffers =>
                write!(f, "num_buffers must be at least 1"),
            CanvasConfigError::ZeroIncrement =>
                write!(f, "view_increment must be at least 1"),
            CanvasConfigError::BlankWorkerName =>
                write!(f, "worker_name must not be blank"),
        }
    }
}
impl std::error::Error for CanvasConfigError {}

fn validate(c: &CanvasConfig) -> Result<(), CanvasConfigError> {
    if c.num_buffers == 0 {
        return Err(CanvasConfigError::ZeroBuffers);
    }
    if c.view_increment == 0 {
        return Err(CanvasConfigError::ZeroIncrement);
    }
    if c.worker_name.trim().is_empty() {
        return Err(CanvasConfigError::BlankWorkerName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(CanvasConfig::default().validate().is_ok());
        assert_eq!(CanvasConfig::default().worker_name, "NativeRenderer");
    }

    #[test]
    fn builder_rejects_zero_buffers_and_increment() {
        assert_eq!(
            CanvasConfig::builder().num_buffers(0).build().unwrap_err(),
            CanvasConfigError::ZeroBuffers
        );
        assert_eq!(
            CanvasConfig::builder().view_increment(0).build().unwrap_err(),
            CanvasConfigError::ZeroIncrement
        );
        assert_eq!(
            CanvasConfig::builder().worker_name("  ").build().unwrap_err(),
            CanvasConfigError::BlankWorkerName
        );
    }

    #[test]
    fn builder_with_applies_all_changes() {
        let cfg = CanvasConfig::builder()
            .with(|c| {
                c.num_buffers = 3;
                c.asynchronous = true;
            })
            .build()
            .unwrap();
        assert_eq!(cfg.num_buffers, 3);
        assert!(cfg.asynchronous);
    }
}
