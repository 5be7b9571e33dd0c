//! Input event types.
//!
//! Raw pointer and gesture input is delivered to a canvas as a single
//! [`InputEvent`] enum and dispatched through one function, instead of one
//! handler slot per event kind.

use std::fmt::Display;

/// Represents a mouse button that can be pressed or released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Left mouse button pressed (or depressed)
    Left,
    /// Middle mouse button pressed (or depressed)
    Middle,
    /// Right mouse button pressed (or depressed)
    Right,
}

impl Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MouseButton::Left => write!(f, "Left"),
            MouseButton::Middle => write!(f, "Middle"),
            MouseButton::Right => write!(f, "Right"),
        }
    }
}

/// One scroll sample as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollEvent {
    pub delta_x: f64,
    pub delta_y: f64,
    /// Accumulated deltas of the current gesture, including this sample.
    pub total_delta_x: f64,
    pub total_delta_y: f64,
    /// Momentum continuation after the fingers left the device.
    pub inertia: bool,
}

impl ScrollEvent {
    /// A single sample that is also the whole gesture.
    pub fn single(delta_x: f64, delta_y: f64) -> Self {
        Self {
            delta_x,
            delta_y,
            total_delta_x: delta_x,
            total_delta_y: delta_y,
            inertia: false,
        }
    }
}

/// Pointer and gesture input in canvas coordinates.
///
/// `synthesized` marks pointer events the platform derived from touch input;
/// those are ignored because the touch gesture itself is delivered as well.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Press { button: MouseButton, x: f64, y: f64, synthesized: bool },
    Release { button: MouseButton, x: f64, y: f64, synthesized: bool },
    Drag { x: f64, y: f64, synthesized: bool },
    /// Start of a touch scroll gesture.
    ScrollStarted,
    /// End of a touch scroll gesture.
    ScrollFinished,
    Scroll(ScrollEvent),
    Zoom { factor: f64 },
    Rotate { angle: f64 },
}

impl InputEvent {
    pub fn press(x: f64, y: f64) -> Self {
        InputEvent::Press { button: MouseButton::Left, x, y, synthesized: false }
    }

    pub fn release(x: f64, y: f64) -> Self {
        InputEvent::Release { button: MouseButton::Left, x, y, synthesized: false }
    }

    pub fn drag(x: f64, y: f64) -> Self {
        InputEvent::Drag { x, y, synthesized: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mousebutton_display() {
        assert_eq!(MouseButton::Left.to_string(), "Left");
        assert_eq!(MouseButton::Middle.to_string(), "Middle");
        assert_eq!(MouseButton::Right.to_string(), "Right");
    }

    #[test]
    fn single_scroll_has_matching_totals() {
        let e = ScrollEvent::single(0.0, 5.0);
        assert_eq!(e.total_delta_y, 5.0);
        assert_eq!(e.total_delta_x, 0.0);
        assert!(!e.inertia);
    }

    #[test]
    fn pointer_helpers_are_not_synthesized() {
        match InputEvent::drag(1.0, 2.0) {
            InputEvent::Drag { x, y, synthesized } => {
                assert_eq!((x, y), (1.0, 2.0));
                assert!(!synthesized);
            }
            _ => panic!("Unexpected variant"),
        }
        assert!(format!("{:?}", InputEvent::press(0.0, 0.0)).contains("Press"));
    }
}
