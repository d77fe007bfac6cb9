//! In-memory puzzle document.
//!
//! `SvgScene` mirrors the subset of an SVG DOM the engine touches: a tree of
//! identified groups with document-space bounds and a visibility flag. It is
//! built either from SVG text through `usvg` or by hand in tests, and it keeps
//! enough bookkeeping (ghosts, pulse frames, the presented message) for
//! assertions about what the engine did to the document.

use crate::error::{PuzzleError, PuzzleResult};
use crate::geometry::{BBox, Point};
use crate::surface::{PulseFrame, PuzzleSurface};

pub type SceneNode = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneElementKind {
    Root,
    Group,
    Shape,
    HitZone,
    Ghost { source: SceneNode },
}

#[derive(Clone, Debug)]
struct SceneElement {
    id: Option<String>,
    kind: SceneElementKind,
    parent: Option<SceneNode>,
    children: Vec<SceneNode>,
    bbox: Option<BBox>,
    visible: bool,
    opacity: f32,
    offset: Point,
    removed: bool,
}

impl SceneElement {
    fn new(id: Option<String>, kind: SceneElementKind, parent: Option<SceneNode>, bbox: Option<BBox>) -> Self {
        Self {
            id,
            kind,
            parent,
            children: Vec::new(),
            bbox,
            visible: true,
            opacity: 1.0,
            offset: Point::ORIGIN,
            removed: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SvgScene {
    elements: Vec<SceneElement>,
    root: Option<SceneNode>,
    pulse: Option<PulseFrame>,
    pulse_history: Vec<PulseFrame>,
    message: Option<(String, f32)>,
}

impl Default for SvgScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgScene {
    pub fn new() -> Self {
        let root = SceneElement::new(None, SceneElementKind::Root, None, None);
        Self {
            elements: vec![root],
            root: Some(0),
            pulse: None,
            pulse_history: Vec::new(),
            message: None,
        }
    }

    /// Parses SVG text and keeps every identified element with its absolute
    /// bounding box.
    pub fn parse(text: &str) -> PuzzleResult<Self> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_str(text, &options)
            .map_err(|err| PuzzleError::Document(err.to_string()))?;
        let mut scene = SvgScene::new();
        let root_bounds = tree.root().abs_bounding_box();
        scene.elements[0].bbox = Some(rect_to_bbox(&root_bounds));
        scene.collect_group(tree.root(), 0);
        Ok(scene)
    }

    fn collect_group(&mut self, group: &usvg::Group, parent: SceneNode) {
        for node in group.children() {
            let id = node.id();
            let bbox = rect_to_bbox(&node.abs_bounding_box());
            match node {
                usvg::Node::Group(child) => {
                    let next_parent = if id.is_empty() {
                        parent
                    } else {
                        self.push(Some(id.to_string()), SceneElementKind::Group, parent, Some(bbox))
                    };
                    self.collect_group(child, next_parent);
                }
                _ => {
                    if !id.is_empty() {
                        self.push(Some(id.to_string()), SceneElementKind::Shape, parent, Some(bbox));
                    }
                }
            }
        }
    }

    fn push(
        &mut self,
        id: Option<String>,
        kind: SceneElementKind,
        parent: SceneNode,
        bbox: Option<BBox>,
    ) -> SceneNode {
        let node = self.elements.len();
        self.elements
            .push(SceneElement::new(id, kind, Some(parent), bbox));
        if let Some(parent) = self.elements.get_mut(parent) {
            parent.children.push(node);
        }
        node
    }

    /// Adds an identified group under the root.
    pub fn add_group(&mut self, id: &str, bbox: BBox) -> SceneNode {
        let parent = self.root.unwrap_or(0);
        self.push(Some(id.to_string()), SceneElementKind::Group, parent, Some(bbox))
    }

    pub fn add_child(&mut self, parent: SceneNode, id: Option<&str>, bbox: BBox) -> SceneNode {
        self.push(id.map(str::to_string), SceneElementKind::Shape, parent, Some(bbox))
    }

    /// Simulates a document whose root element cannot be found.
    pub fn detach_root(&mut self) {
        self.root = None;
    }

    pub fn node_by_id(&self, id: &str) -> Option<SceneNode> {
        self.live().find(|(_, element)| element.id.as_deref() == Some(id)).map(|(node, _)| node)
    }

    pub fn kind(&self, node: SceneNode) -> Option<SceneElementKind> {
        self.elements.get(node).filter(|element| !element.removed).map(|element| element.kind)
    }

    pub fn children_of(&self, node: SceneNode) -> Vec<SceneNode> {
        self.elements
            .get(node)
            .map(|element| element.children.clone())
            .unwrap_or_default()
    }

    pub fn is_id_visible(&self, id: &str) -> bool {
        self.node_by_id(id)
            .map(|node| self.is_visible(&node))
            .unwrap_or(false)
    }

    pub fn ghosts(&self) -> Vec<SceneNode> {
        self.live()
            .filter(|(_, element)| matches!(element.kind, SceneElementKind::Ghost { .. }))
            .map(|(node, _)| node)
            .collect()
    }

    pub fn ghost_offset(&self, node: SceneNode) -> Option<Point> {
        self.elements
            .get(node)
            .filter(|element| !element.removed)
            .map(|element| element.offset)
    }

    pub fn opacity(&self, node: SceneNode) -> Option<f32> {
        self.elements.get(node).map(|element| element.opacity)
    }

    pub fn hit_zone_count(&self) -> usize {
        self.live()
            .filter(|(_, element)| element.kind == SceneElementKind::HitZone)
            .count()
    }

    pub fn pulse(&self) -> Option<PulseFrame> {
        self.pulse
    }

    pub fn pulse_history(&self) -> &[PulseFrame] {
        &self.pulse_history
    }

    pub fn message(&self) -> Option<(&str, f32)> {
        self.message
            .as_ref()
            .map(|(message, opacity)| (message.as_str(), *opacity))
    }

    fn live(&self) -> impl Iterator<Item = (SceneNode, &SceneElement)> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| !element.removed)
    }
}

impl PuzzleSurface for SvgScene {
    type Node = SceneNode;

    fn element_ids(&self) -> Vec<String> {
        self.live()
            .filter_map(|(_, element)| element.id.clone())
            .collect()
    }

    fn find(&self, id: &str) -> Option<SceneNode> {
        self.node_by_id(id)
    }

    fn bounding_box(&self, node: &SceneNode) -> Option<BBox> {
        let element = self.elements.get(*node).filter(|element| !element.removed)?;
        match element.kind {
            SceneElementKind::Ghost { source } => {
                let bbox = self.elements.get(source)?.bbox?;
                Some(BBox {
                    min_x: bbox.min_x + element.offset.x,
                    min_y: bbox.min_y + element.offset.y,
                    max_x: bbox.max_x + element.offset.x,
                    max_y: bbox.max_y + element.offset.y,
                })
            }
            _ => element.bbox,
        }
    }

    fn is_visible(&self, node: &SceneNode) -> bool {
        let mut cursor = Some(*node);
        while let Some(current) = cursor {
            let Some(element) = self.elements.get(current) else {
                return false;
            };
            if element.removed || !element.visible {
                return false;
            }
            cursor = element.parent;
        }
        true
    }

    fn set_visible(&mut self, node: &SceneNode, visible: bool) {
        if let Some(element) = self.elements.get_mut(*node) {
            element.visible = visible;
        }
    }

    fn insert_hit_zone(
        &mut self,
        target: &SceneNode,
        id: &str,
        rect: BBox,
        opacity: f32,
    ) -> Option<SceneNode> {
        if self.kind(*target).is_none() {
            return None;
        }
        let node = self.elements.len();
        let mut element =
            SceneElement::new(Some(id.to_string()), SceneElementKind::HitZone, Some(*target), Some(rect));
        element.opacity = opacity;
        self.elements.push(element);
        self.elements[*target].children.insert(0, node);
        Some(node)
    }

    fn spawn_ghost(&mut self, part: &SceneNode, opacity: f32) -> Option<SceneNode> {
        self.kind(*part)?;
        let parent = self.root.unwrap_or(0);
        let node = self.push(None, SceneElementKind::Ghost { source: *part }, parent, None);
        self.elements[node].opacity = opacity;
        Some(node)
    }

    fn translate_ghost(&mut self, ghost: &SceneNode, offset: Point) {
        if let Some(element) = self.elements.get_mut(*ghost) {
            element.offset = offset;
        }
    }

    fn remove(&mut self, node: &SceneNode) {
        let Some(parent) = self.elements.get(*node).and_then(|element| element.parent) else {
            return;
        };
        if let Some(parent) = self.elements.get_mut(parent) {
            parent.children.retain(|child| child != node);
        }
        if let Some(element) = self.elements.get_mut(*node) {
            element.removed = true;
        }
    }

    fn apply_root_pulse(&mut self, frame: Option<PulseFrame>) -> bool {
        if self.root.is_none() {
            return false;
        }
        self.pulse = frame;
        if let Some(frame) = frame {
            self.pulse_history.push(frame);
        }
        true
    }

    fn present_message(&mut self, message: Option<&str>, opacity: f32) {
        self.message = message.map(|message| (message.to_string(), opacity));
    }
}

fn rect_to_bbox(rect: &usvg::Rect) -> BBox {
    BBox::new(rect.x(), rect.y(), rect.width(), rect.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PIECES: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100" viewBox="0 0 200 100">
        <g id="g1"><rect x="10" y="10" width="20" height="20" fill="#f00"/></g>
        <g id="t1"><rect x="110" y="60" width="10" height="30" fill="#00f"/></g>
        <g id="g2" transform="translate(40 0)"><rect x="10" y="10" width="20" height="20" fill="#0f0"/></g>
    </svg>"##;

    #[test]
    fn parse_keeps_identified_groups_with_absolute_bounds() {
        let scene = SvgScene::parse(TWO_PIECES).expect("valid svg");
        let ids = scene.element_ids();
        assert!(ids.contains(&"g1".to_string()));
        assert!(ids.contains(&"t1".to_string()));
        let g2 = scene.find("g2").expect("g2");
        let bbox = scene.bounding_box(&g2).expect("bbox");
        assert_eq!(bbox.center(), Point::new(60.0, 20.0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            SvgScene::parse("not svg at all"),
            Err(PuzzleError::Document(_))
        ));
    }

    #[test]
    fn hidden_parent_hides_children() {
        let mut scene = SvgScene::new();
        let target = scene.add_group("t1", BBox::new(0.0, 0.0, 10.0, 10.0));
        let zone = scene
            .insert_hit_zone(&target, "rt1", BBox::new(-5.0, -5.0, 20.0, 20.0), 0.01)
            .expect("zone");
        assert!(scene.is_visible(&zone));
        scene.set_visible(&target, false);
        assert!(!scene.is_visible(&zone));
        assert_eq!(scene.children_of(target).first(), Some(&zone));
    }
}
