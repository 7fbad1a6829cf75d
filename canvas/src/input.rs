//! Input model: modifier keys, mouse buttons, and the gesture state machine.
//!
//! `InputState` is the gesture being tracked between pointer-down and
//! pointer-up. Every active variant carries what the engine needs to rebuild
//! the group transform from the current pointer position alone, so a dropped
//! move event never accumulates error. Returning to `Idle` is the only
//! transition that commits history.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::geom::{GroupTransform, Point};

/// Keyboard modifier keys held during a pointer event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift: snap rotation, keep aspect while scaling, move the whole group
    /// when pressing on a keypoint.
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A corner of a skeleton's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Self::TopLeft, Self::TopRight, Self::BottomRight, Self::BottomLeft];

    /// Position in [`GroupTransform::corners`] order.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomRight => 2,
            Self::BottomLeft => 3,
        }
    }

    /// The diagonally opposite corner, which stays fixed while scaling.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomRight => Self::TopLeft,
            Self::BottomLeft => Self::TopRight,
        }
    }

    /// Direction from the opposite corner to this one, in the unrotated frame.
    #[must_use]
    pub fn signs(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (-1.0, -1.0),
            Self::TopRight => (1.0, -1.0),
            Self::BottomRight => (1.0, 1.0),
            Self::BottomLeft => (-1.0, 1.0),
        }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone)]
pub struct UiState {
    /// Index of the active skeleton, if any.
    pub selected: Option<usize>,
    /// User-level eye visibility, before mirror inversion.
    pub visible_eyes: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self { selected: None, visible_eyes: true }
    }
}

/// The gesture state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Translating a whole skeleton.
    MovingSkeleton {
        index: usize,
        /// Canvas position of the pointer at the previous event.
        last: Point,
    },
    /// Scaling a skeleton from a corner handle; the opposite corner is pinned.
    ScalingSkeleton {
        index: usize,
        corner: Corner,
        /// Canvas position of the pinned opposite corner.
        anchor: Point,
        /// Transform at gesture start.
        orig: GroupTransform,
    },
    /// Rotating a skeleton around its center from the rotate handle.
    RotatingSkeleton {
        index: usize,
        center: Point,
        /// Pointer bearing from the center at gesture start, in degrees.
        start_bearing: f64,
        /// Group angle at gesture start.
        orig_angle: f64,
    },
    /// Dragging one keypoint on its own.
    DraggingKeypoint {
        skeleton: usize,
        keypoint: usize,
        /// Keypoint position minus pointer position at pointer-down.
        grab_offset: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Skeleton affected by the active gesture.
    #[must_use]
    pub fn skeleton(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::MovingSkeleton { index, .. }
            | Self::ScalingSkeleton { index, .. }
            | Self::RotatingSkeleton { index, .. } => Some(*index),
            Self::DraggingKeypoint { skeleton, .. } => Some(*skeleton),
        }
    }
}
