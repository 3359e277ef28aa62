use crate::geom::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 3.0;

/// Double-click reset animates back to identity over this duration.
pub const RESET_ANIMATION: Duration = Duration::from_millis(250);

/// Affine pan/zoom of a diagram view: `screen = translate + k * graph`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn clamped(self) -> Self {
        Self {
            k: self.k.clamp(MIN_SCALE, MAX_SCALE),
            ..self
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        crate::geom::point(self.x + self.k * p.x, self.y + self.k * p.y)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Interacting,
}

/// Descriptor of the double-click reset animation the presentation runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResetAnimation {
    pub from: Transform,
    pub to: Transform,
    pub duration: Duration,
}

/// Pan/zoom state machine for one presentation of the diagram.
///
/// The same logical transform is shared between the normal and fullscreen
/// presentations through their owner, so there are two write paths with
/// asymmetric notification rules:
///
/// - interaction-path updates (drag, wheel, double-click reset) return the
///   new transform as an outward change notification for the owner to push
///   to the sibling presentation;
/// - externally applied values ([`ViewportController::set_external`]) update
///   internal state and deliberately return nothing. Re-emitting here would
///   bounce the same value back and forth between the two presentations.
#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: Transform,
    phase: Phase,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportController {
    pub fn new() -> Self {
        Self {
            transform: Transform::IDENTITY,
            phase: Phase::Idle,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn begin_gesture(&mut self) {
        self.phase = Phase::Interacting;
    }

    pub fn end_gesture(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Pointer drag. Only emits while a gesture is in progress; a stray move
    /// event outside begin/end is ignored.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Option<Transform> {
        if self.phase != Phase::Interacting {
            return None;
        }
        self.transform.x += dx;
        self.transform.y += dy;
        Some(self.transform)
    }

    /// Wheel zoom about an anchor point in screen coordinates. The graph
    /// point under the anchor stays put; scale is clamped to
    /// `[MIN_SCALE, MAX_SCALE]`. Wheel steps are discrete events and emit
    /// regardless of gesture phase.
    pub fn zoom_about(&mut self, anchor: Point, factor: f64) -> Transform {
        let k0 = self.transform.k;
        let k1 = (k0 * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = k1 / k0;
        self.transform = Transform {
            k: k1,
            x: anchor.x - (anchor.x - self.transform.x) * ratio,
            y: anchor.y - (anchor.y - self.transform.y) * ratio,
        };
        self.transform
    }

    /// Double-click reset: snaps internal state to identity, emits it, and
    /// hands the presentation an animation descriptor to play.
    pub fn reset(&mut self) -> ResetAnimation {
        let from = self.transform;
        self.transform = Transform::IDENTITY;
        ResetAnimation {
            from,
            to: Transform::IDENTITY,
            duration: RESET_ANIMATION,
        }
    }

    /// External write path: the owner pushing the transform produced by the
    /// other presentation. Applies directly, clamped, and does not emit.
    pub fn set_external(&mut self, transform: Transform) {
        self.transform = transform.clamped();
    }
}
