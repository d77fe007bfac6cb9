use crate::geometry::{BBox, Point};

/// One frame of the completion pulse applied to the puzzle root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseFrame {
    pub scale: f32,
    pub opacity: f32,
}

impl PulseFrame {
    pub const REST: PulseFrame = PulseFrame {
        scale: 1.0,
        opacity: 1.0,
    };
}

/// The engine's view of a loaded puzzle document.
///
/// Implementations own the rendered markup; the engine only ever holds
/// `Node` handles it obtained from `find` or from the insert/spawn calls.
/// Every bounding box is expressed in the root document's user space, the
/// same space pointer positions are mapped into.
pub trait PuzzleSurface {
    type Node: Clone;

    /// Ids of every element in the document, in document order.
    fn element_ids(&self) -> Vec<String>;

    fn find(&self, id: &str) -> Option<Self::Node>;

    fn bounding_box(&self, node: &Self::Node) -> Option<BBox>;

    fn is_visible(&self, node: &Self::Node) -> bool;

    fn set_visible(&mut self, node: &Self::Node, visible: bool);

    /// Inserts a transparent pointer-capture rectangle as the lowest-stacked
    /// child of `target`.
    fn insert_hit_zone(
        &mut self,
        target: &Self::Node,
        id: &str,
        rect: BBox,
        opacity: f32,
    ) -> Option<Self::Node>;

    /// Clones `part` into a floating, id-less ghost drawn above everything.
    fn spawn_ghost(&mut self, part: &Self::Node, opacity: f32) -> Option<Self::Node>;

    /// Moves a ghost by `offset` relative to where its source part is drawn.
    fn translate_ghost(&mut self, ghost: &Self::Node, offset: Point);

    fn remove(&mut self, node: &Self::Node);

    /// Applies a pulse frame to the puzzle root, `None` clears it. Returns
    /// `false` when the root element is missing.
    fn apply_root_pulse(&mut self, frame: Option<PulseFrame>) -> bool;

    /// Shows (or with `None` hides) the celebration message at `opacity`.
    fn present_message(&mut self, message: Option<&str>, opacity: f32);
}
