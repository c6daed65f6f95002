//! Drag-to-reorder state machine.
//!
//! ```text
//!            pointer_down              moved ≥ ACTIVATION_DISTANCE
//!   Idle ───────────────▶ Pressed ─────────────────────────────▶ Dragging
//!    ▲  ◀──────────────────  │                                   │  │
//!    │      pointer_up /     │            start(key)             │  │ pointer_move:
//!    │      cancel           └──────────────────────┐            │  │ closest_center
//!    │                                              ▼            │  ▼ picks `over`
//!    └──────────────────────────── end (reorder if over ≠ active) / cancel
//! ```
//!
//! The list is never touched while dragging; only [`DragController::end`]
//! applies a reorder.

use crate::collection::ImageCollection;
use crate::models::EntryKey;

/// Pointer travel (px) required before a press turns into a drag.
pub const ACTIVATION_DISTANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// The droppable whose center is nearest to the center of `dragged`.
pub fn closest_center(dragged: &Rect, droppables: &[(EntryKey, Rect)]) -> Option<EntryKey> {
    let center = dragged.center();
    droppables
        .iter()
        .map(|(key, rect)| (*key, rect.center().distance(&center)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer is down on an entry but has not moved far enough yet.
    Pressed { key: EntryKey, origin: Point, rect: Rect },
    Dragging {
        active: EntryKey,
        origin: Point,
        rect: Rect,
        over: Option<EntryKey>,
    },
}

/// Drives [`DragState`] from pointer or keyboard events.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Entry being dragged, if any.
    pub fn active(&self) -> Option<EntryKey> {
        match &self.state {
            DragState::Dragging { active, .. } => Some(*active),
            _ => None,
        }
    }

    /// Current drop candidate, if any.
    pub fn over(&self) -> Option<EntryKey> {
        match &self.state {
            DragState::Dragging { over, .. } => *over,
            _ => None,
        }
    }

    /// Begin dragging `key` immediately. Ignored while another drag is active.
    pub fn start(&mut self, key: EntryKey) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.state = DragState::Dragging {
            active: key,
            origin: Point::default(),
            rect: Rect::default(),
            over: None,
        };
        true
    }

    /// Pointer pressed on `key`, whose rendered bounds are `rect`.
    pub fn pointer_down(&mut self, key: EntryKey, origin: Point, rect: Rect) -> bool {
        if !matches!(self.state, DragState::Idle) {
            return false;
        }
        self.state = DragState::Pressed { key, origin, rect };
        true
    }

    /// Pointer moved. Activates a pending press or updates the drop candidate.
    pub fn pointer_move(&mut self, point: Point, droppables: &[(EntryKey, Rect)]) -> Option<EntryKey> {
        if let DragState::Pressed { key, origin, rect } = self.state.clone() {
            if point.distance(&origin) < ACTIVATION_DISTANCE {
                return None;
            }
            self.state = DragState::Dragging {
                active: key,
                origin,
                rect,
                over: None,
            };
        }

        match &mut self.state {
            DragState::Dragging {
                origin, rect, over, ..
            } => {
                let moved = rect.translate(point.x - origin.x, point.y - origin.y);
                *over = closest_center(&moved, droppables);
                *over
            }
            _ => None,
        }
    }

    /// Set the drop candidate directly (e.g. from a `dragover` event).
    pub fn set_over(&mut self, key: Option<EntryKey>) {
        if let DragState::Dragging { over, .. } = &mut self.state {
            *over = key;
        }
    }

    /// Drop. Applies the reorder when a different target was resolved.
    ///
    /// Returns `(active, target)` when the list changed.
    pub fn end(&mut self, collection: &mut ImageCollection) -> Option<(EntryKey, EntryKey)> {
        let state = std::mem::take(&mut self.state);
        let DragState::Dragging {
            active,
            over: Some(target),
            ..
        } = state
        else {
            return None;
        };

        if collection.reorder(active, target) {
            Some((active, target))
        } else {
            None
        }
    }

    /// Abort without touching the list.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}
