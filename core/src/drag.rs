//! Per-gesture drag state machine.
//!
//! `Idle -> Dragging -> {Placed | Idle}`. Entering `Dragging` hands the
//! controller an owned resource `R` (in the browser, the window-level
//! move/up listeners for this gesture). The resource lives inside the
//! gesture and is dropped on every way out of `Dragging`: a release that
//! snaps, a release that misses, an eviction by a newer gesture, or a cancel.
//! Detaching listeners therefore cannot be forgotten.

use crate::element_id::PieceId;
use crate::geometry::{distance, Point};

/// A release snaps only when strictly closer than the threshold.
pub fn is_snap(distance: f32, threshold: f32) -> bool {
    distance < threshold
}

#[derive(Debug)]
pub struct DragGesture<N, R> {
    pub piece: PieceId,
    pub ghost: N,
    /// Center of the hit zone before the drag, where a miss springs back to.
    pub tray_origin: Point,
    /// Assembled-position centroid of the part.
    pub anchor: Point,
    pub cursor: Point,
    resource: R,
}

impl<N, R> DragGesture<N, R> {
    pub fn new(piece: PieceId, ghost: N, tray_origin: Point, anchor: Point, cursor: Point, resource: R) -> Self {
        Self {
            piece,
            ghost,
            tray_origin,
            anchor,
            cursor,
            resource,
        }
    }

    /// Offset that moves the ghost's centroid onto the cursor.
    pub fn ghost_offset(&self) -> Point {
        self.anchor.offset_to(self.cursor)
    }
}

#[derive(Debug)]
pub enum DragPhase<N, R> {
    Idle,
    Dragging(DragGesture<N, R>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Release<N> {
    Snapped {
        piece: PieceId,
        ghost: N,
        distance: f32,
    },
    Missed {
        piece: PieceId,
        ghost: N,
        from: Point,
        tray_origin: Point,
        anchor: Point,
        distance: f32,
    },
}

#[derive(Debug)]
pub struct DragController<N, R> {
    phase: DragPhase<N, R>,
    snap_threshold: f32,
}

impl<N: Clone, R> DragController<N, R> {
    pub fn new(snap_threshold: f32) -> Self {
        Self {
            phase: DragPhase::Idle,
            snap_threshold,
        }
    }

    pub fn snap_threshold(&self) -> f32 {
        self.snap_threshold
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging(_))
    }

    pub fn active(&self) -> Option<&DragGesture<N, R>> {
        match &self.phase {
            DragPhase::Dragging(gesture) => Some(gesture),
            DragPhase::Idle => None,
        }
    }

    /// Enters `Dragging`. A gesture that never saw its release is returned so
    /// the caller can discard its ghost; its resource is dropped here.
    pub fn begin(&mut self, gesture: DragGesture<N, R>) -> Option<N> {
        let previous = std::mem::replace(&mut self.phase, DragPhase::Dragging(gesture));
        match previous {
            DragPhase::Dragging(stale) => Some(stale.ghost),
            DragPhase::Idle => None,
        }
    }

    /// Moves the cursor and returns the ghost with its new offset.
    pub fn track(&mut self, cursor: Point) -> Option<(N, Point)> {
        let DragPhase::Dragging(gesture) = &mut self.phase else {
            return None;
        };
        if !cursor.is_finite() {
            return None;
        }
        gesture.cursor = cursor;
        Some((gesture.ghost.clone(), gesture.ghost_offset()))
    }

    pub fn release(&mut self, cursor: Point) -> Option<Release<N>> {
        let DragPhase::Dragging(mut gesture) = std::mem::replace(&mut self.phase, DragPhase::Idle)
        else {
            return None;
        };
        if cursor.is_finite() {
            gesture.cursor = cursor;
        }
        let DragGesture {
            piece,
            ghost,
            tray_origin,
            anchor,
            cursor,
            resource,
        } = gesture;
        drop(resource);
        let gap = distance(cursor, anchor);
        if is_snap(gap, self.snap_threshold) {
            Some(Release::Snapped {
                piece,
                ghost,
                distance: gap,
            })
        } else {
            Some(Release::Missed {
                piece,
                ghost,
                from: cursor,
                tray_origin,
                anchor,
                distance: gap,
            })
        }
    }

    /// Leaves `Dragging` without a verdict, returning the orphaned ghost.
    pub fn cancel(&mut self) -> Option<N> {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Dragging(gesture) => Some(gesture.ghost),
            DragPhase::Idle => None,
        }
    }
}
