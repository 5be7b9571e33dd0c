//! Input coalescing: turns pointer and gesture input into viewport requests.

use crate::event::{InputEvent, ScrollEvent};
use crate::render::Viewport;

/// Where a scroll event most likely came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOrigin {
    /// A mouse wheel notch.
    Wheel,
    /// A touch screen or trackpad gesture.
    Touch,
}

/// Policy deciding the origin of a scroll event.
pub trait ScrollClassifier: Send {
    fn classify(&self, event: &ScrollEvent, in_gesture: bool) -> ScrollOrigin;
}

/// Default scroll classification.
///
/// Platforms do not reliably bracket touch scrolling with gesture start/end
/// events, and report non-zero totals for wheels too, so a wheel notch is
/// recognized by its shape: outside any gesture, no inertia, purely vertical,
/// the first and only sample of its gesture, and larger than one unit. This
/// is a best-effort guess; swap it out where it misfires.
#[derive(Debug, Clone, Copy, Default)]
pub struct WheelHeuristic;

const WHEEL_EPSILON: f64 = 1.000_000_1;

impl ScrollClassifier for WheelHeuristic {
    fn classify(&self, event: &ScrollEvent, in_gesture: bool) -> ScrollOrigin {
        if !in_gesture
            && !event.inertia
            && event.delta_x.abs() == 0.0
            && event.delta_y == event.total_delta_y
            && event.delta_y.abs() > WHEEL_EPSILON
        {
            ScrollOrigin::Wheel
        } else {
            ScrollOrigin::Touch
        }
    }
}

/// Wheel notches are zoom intent. Zoom is not implemented, so a notch pans
/// vertically by its delta; any horizontal component is dropped.
fn wheel_zoom(scroll: &ScrollEvent, current: Viewport) -> Viewport {
    current.translated_by(0, -scroll.delta_y as i32)
}

pub struct InputCoalescer {
    anchor: Option<(f64, f64)>,
    in_gesture: bool,
    classifier: Box<dyn ScrollClassifier>,
}

impl Default for InputCoalescer {
    fn default() -> Self {
        Self::new(Box::new(WheelHeuristic))
    }
}

impl std::fmt::Debug for InputCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputCoalescer")
            .field("anchor", &self.anchor)
            .field("in_gesture", &self.in_gesture)
            .finish()
    }
}

impl InputCoalescer {
    pub fn new(classifier: Box<dyn ScrollClassifier>) -> Self {
        Self {
            anchor: None,
            in_gesture: false,
            classifier,
        }
    }

    pub fn set_classifier(&mut self, classifier: Box<dyn ScrollClassifier>) {
        self.classifier = classifier;
    }

    pub fn in_gesture(&self) -> bool {
        self.in_gesture
    }

    /// Forgets the pointer anchor and gesture brackets.
    pub fn reset(&mut self) {
        self.anchor = None;
        self.in_gesture = false;
    }

    /// Maps `event` to the viewport that should be rendered next, if any.
    pub fn handle(&mut self, event: &InputEvent, current: Viewport) -> Option<Viewport> {
        match *event {
            InputEvent::Press { x, y, synthesized: false, .. } => {
                self.anchor = Some((x, y));
                None
            }
            InputEvent::Release { synthesized: false, .. } => {
                self.anchor = None;
                None
            }
            InputEvent::Drag { x, y, synthesized: false } => {
                let previous = self.anchor.replace((x, y))?;
                Some(current.translated_by((previous.0 - x) as i32, (previous.1 - y) as i32))
            }
            InputEvent::Press { .. } | InputEvent::Release { .. } | InputEvent::Drag { .. } => None,
            InputEvent::ScrollStarted => {
                self.in_gesture = true;
                None
            }
            InputEvent::ScrollFinished => {
                self.in_gesture = false;
                None
            }
            InputEvent::Scroll(scroll) => {
                let origin = self.classifier.classify(&scroll, self.in_gesture);
                log::trace!("scroll {scroll:?} classified as {origin:?}");
                match origin {
                    ScrollOrigin::Wheel => Some(wheel_zoom(&scroll, current)),
                    ScrollOrigin::Touch => {
                        Some(current.translated_by(-scroll.delta_x as i32, -scroll.delta_y as i32))
                    }
                }
            }
            InputEvent::Zoom { .. } | InputEvent::Rotate { .. } => Some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(100, 100, 128, 128).unwrap()
    }

    #[test]
    fn single_vertical_notch_is_a_wheel() {
        let h = WheelHeuristic;
        assert_eq!(h.classify(&ScrollEvent::single(0.0, 5.0), false), ScrollOrigin::Wheel);
        assert_eq!(h.classify(&ScrollEvent::single(0.0, -3.0), false), ScrollOrigin::Wheel);
    }

    #[test]
    fn anything_else_is_touch() {
        let h = WheelHeuristic;
        assert_eq!(h.classify(&ScrollEvent::single(0.0, 5.0), true), ScrollOrigin::Touch);
        assert_eq!(h.classify(&ScrollEvent::single(1.0, 5.0), false), ScrollOrigin::Touch);
        assert_eq!(h.classify(&ScrollEvent::single(0.0, 1.0), false), ScrollOrigin::Touch);

        let mut inertial = ScrollEvent::single(0.0, 5.0);
        inertial.inertia = true;
        assert_eq!(h.classify(&inertial, false), ScrollOrigin::Touch);

        let continued = ScrollEvent { total_delta_y: 12.0, ..ScrollEvent::single(0.0, 5.0) };
        assert_eq!(h.classify(&continued, false), ScrollOrigin::Touch);
    }

    #[test]
    fn wheel_scroll_pans_against_delta() {
        let mut input = InputCoalescer::default();
        let next = input.handle(&InputEvent::Scroll(ScrollEvent::single(0.0, 5.0)), vp());
        assert_eq!(next, Some(vp().translated_by(0, -5)));
    }

    #[test]
    fn touch_scroll_pans_both_axes() {
        let mut input = InputCoalescer::default();
        input.handle(&InputEvent::ScrollStarted, vp());
        assert!(input.in_gesture());
        let next = input.handle(&InputEvent::Scroll(ScrollEvent::single(-2.7, 4.2)), vp());
        assert_eq!(next, Some(vp().translated_by(2, -4)));
        input.handle(&InputEvent::ScrollFinished, vp());
        assert!(!input.in_gesture());
    }

    #[test]
    fn drag_pans_by_pointer_movement() {
        let mut input = InputCoalescer::default();
        assert_eq!(input.handle(&InputEvent::press(50.0, 50.0), vp()), None);

        let first = input.handle(&InputEvent::drag(40.0, 55.0), vp()).unwrap();
        assert_eq!((first.x(), first.y()), (110, 95));

        let second = input.handle(&InputEvent::drag(30.0, 55.0), first).unwrap();
        assert_eq!((second.x(), second.y()), (120, 95));

        input.handle(&InputEvent::release(30.0, 55.0), second);
        assert_eq!(input.handle(&InputEvent::drag(0.0, 0.0), second), None);
    }

    #[test]
    fn synthesized_pointer_events_are_ignored() {
        let mut input = InputCoalescer::default();
        let press = InputEvent::Press { button: crate::event::MouseButton::Left, x: 0.0, y: 0.0, synthesized: true };
        assert_eq!(input.handle(&press, vp()), None);
        let drag = InputEvent::Drag { x: 10.0, y: 10.0, synthesized: true };
        assert_eq!(input.handle(&drag, vp()), None);
    }

    #[test]
    fn zoom_and_rotate_rerender_current_viewport() {
        let mut input = InputCoalescer::default();
        assert_eq!(input.handle(&InputEvent::Zoom { factor: 2.0 }, vp()), Some(vp()));
        assert_eq!(input.handle(&InputEvent::Rotate { angle: 45.0 }, vp()), Some(vp()));
    }

    #[test]
    fn classifier_is_replaceable() {
        struct AlwaysWheel;
        impl ScrollClassifier for AlwaysWheel {
            fn classify(&self, _: &ScrollEvent, _: bool) -> ScrollOrigin {
                ScrollOrigin::Wheel
            }
        }

        let diagonal = InputEvent::Scroll(ScrollEvent::single(3.0, 5.0));

        // By default a diagonal sample is touch scrolling and pans both axes.
        let mut input = InputCoalescer::default();
        assert_eq!(input.handle(&diagonal, vp()), Some(vp().translated_by(-3, -5)));

        // Classified as a wheel it goes through the zoom path, which only pans vertically.
        input.set_classifier(Box::new(AlwaysWheel));
        assert_eq!(input.handle(&diagonal, vp()), Some(vp().translated_by(0, -5)));
    }
}
