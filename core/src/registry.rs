//! Indexed lookup of every piece in a loaded document.
//!
//! Built by a single pass over the document's element ids. Each piece id maps
//! to the handles of its part, its target and (after synthesis) its hit zone,
//! with absent members kept as `None` so later stages never rescan.

use std::collections::BTreeMap;

use crate::element_id::{ElementRole, PieceId};
use crate::geometry::Point;
use crate::surface::PuzzleSurface;

#[derive(Clone, Debug)]
pub struct PieceSlots<N> {
    pub id: PieceId,
    pub part: Option<N>,
    pub target: Option<N>,
    pub hit_zone: Option<N>,
    /// Bounding-box center of the part in its assembled position.
    pub centroid: Option<Point>,
}

impl<N> PieceSlots<N> {
    fn empty(id: PieceId) -> Self {
        Self {
            id,
            part: None,
            target: None,
            hit_zone: None,
            centroid: None,
        }
    }

    /// A piece can be dragged only when every member is present.
    pub fn is_armed(&self) -> bool {
        self.part.is_some()
            && self.target.is_some()
            && self.hit_zone.is_some()
            && self.centroid.is_some()
    }

    fn skip_reason(&self) -> Option<SkipReason> {
        if self.part.is_none() {
            Some(SkipReason::MissingPart)
        } else if self.target.is_none() {
            Some(SkipReason::MissingTarget)
        } else if self.centroid.is_none() {
            Some(SkipReason::MissingBounds)
        } else if self.hit_zone.is_none() {
            Some(SkipReason::MissingHitZone)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingPart,
    MissingTarget,
    MissingBounds,
    MissingHitZone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkippedPiece {
    pub id: PieceId,
    pub reason: SkipReason,
}

#[derive(Clone, Debug)]
pub struct PieceIndex<N> {
    pieces: BTreeMap<PieceId, PieceSlots<N>>,
    max_id: Option<PieceId>,
}

impl<N: Clone> PieceIndex<N> {
    pub fn scan<S>(surface: &S) -> Self
    where
        S: PuzzleSurface<Node = N>,
    {
        let mut part_ids: BTreeMap<PieceId, String> = BTreeMap::new();
        let mut target_ids: BTreeMap<PieceId, String> = BTreeMap::new();
        for element_id in surface.element_ids() {
            let Ok(role) = ElementRole::parse(&element_id) else {
                continue;
            };
            match role {
                ElementRole::Part(id) => {
                    part_ids.entry(id).or_insert(element_id);
                }
                ElementRole::Target(id) => {
                    target_ids.entry(id).or_insert(element_id);
                }
                ElementRole::HitZone(_) => {}
            }
        }

        // The largest part id bounds every later lookup.
        let max_id = part_ids.keys().next_back().copied();
        let mut pieces = BTreeMap::new();
        let Some(bound) = max_id else {
            return Self { pieces, max_id };
        };

        for (id, element_id) in &part_ids {
            let slots = pieces
                .entry(*id)
                .or_insert_with(|| PieceSlots::empty(*id));
            slots.part = surface.find(element_id);
            slots.centroid = slots
                .part
                .as_ref()
                .and_then(|part| surface.bounding_box(part))
                .map(|bbox| bbox.center())
                .filter(|center| center.is_finite());
        }
        for (id, element_id) in target_ids.range(..=bound) {
            let slots = pieces
                .entry(*id)
                .or_insert_with(|| PieceSlots::empty(*id));
            slots.target = surface.find(element_id);
        }
        Self { pieces, max_id }
    }

    pub fn max_id(&self) -> Option<PieceId> {
        self.max_id
    }

    /// Ids with a part group, ascending.
    pub fn part_ids(&self) -> Vec<PieceId> {
        self.pieces
            .values()
            .filter(|slots| slots.part.is_some())
            .map(|slots| slots.id)
            .collect()
    }

    pub fn get(&self, id: PieceId) -> Option<&PieceSlots<N>> {
        self.pieces.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PieceSlots<N>> {
        self.pieces.values()
    }

    pub fn armed(&self) -> impl Iterator<Item = &PieceSlots<N>> {
        self.pieces.values().filter(|slots| slots.is_armed())
    }

    pub fn armed_count(&self) -> usize {
        self.armed().count()
    }

    pub fn skipped(&self) -> Vec<SkippedPiece> {
        self.pieces
            .values()
            .filter_map(|slots| {
                slots.skip_reason().map(|reason| SkippedPiece {
                    id: slots.id,
                    reason,
                })
            })
            .collect()
    }

    pub(crate) fn set_hit_zone(&mut self, id: PieceId, node: N) {
        if let Some(slots) = self.pieces.get_mut(&id) {
            slots.hit_zone = Some(node);
        }
    }
}
