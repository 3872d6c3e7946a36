//! Pointer-drag state machine for panning.

use crate::zoom_math::Point;

/// Drag state for panning the view.
///
/// `Idle -> Panning` on [`PanState::begin`], back to `Idle` on
/// [`PanState::end`]. While panning the offset is always computed from the
/// drag anchor, never accumulated from per-move deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanState {
    #[default]
    Idle,
    Panning {
        /// Pointer position when the drag started
        start_pointer: Point,
        /// View offset when the drag started
        start_offset: Point,
    },
}

impl PanState {
    pub fn is_panning(&self) -> bool {
        matches!(self, PanState::Panning { .. })
    }

    /// Start a drag. Ignored while already panning so the existing anchor
    /// is kept.
    pub fn begin(self, pointer: Point, current_offset: Point) -> PanState {
        match self {
            PanState::Idle => PanState::Panning {
                start_pointer: pointer,
                start_offset: current_offset,
            },
            panning @ PanState::Panning { .. } => panning,
        }
    }

    /// Offset for a pointer move, or `None` when idle.
    pub fn offset_for(&self, pointer: Point) -> Option<Point> {
        match self {
            PanState::Idle => None,
            PanState::Panning {
                start_pointer,
                start_offset,
            } => Some(pointer - *start_pointer + *start_offset),
        }
    }

    /// Finish the drag.
    pub fn end(self) -> PanState {
        PanState::Idle
    }
}
