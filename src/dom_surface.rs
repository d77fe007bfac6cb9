use wasm_bindgen::JsCast;
use web_sys::{
    Document, DocumentFragment, Element, HtmlElement, HtmlTemplateElement, SvgElement,
    SvgGraphicsElement,
};

use puzzlebox_core::{Affine, BBox, Point, PulseFrame, PuzzleSurface};

use crate::input::screen_ctm;

pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";
const GHOST_CLASS: &str = "puzzle-ghost";
const GHOST_BASE_ATTR: &str = "data-ghost-base";

pub(crate) fn create_svg_element(document: &Document, tag: &str) -> Element {
    document
        .create_element_ns(Some(SVG_NS), tag)
        .expect("create svg element")
}

fn format_matrix(matrix: &Affine) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        matrix.a, matrix.b, matrix.c, matrix.d, matrix.e, matrix.f
    )
}

fn parse_matrix(value: &str) -> Option<Affine> {
    let mut numbers = value.split_whitespace().map(str::parse::<f32>);
    let mut next = || numbers.next()?.ok();
    Some(Affine::new(next()?, next()?, next()?, next()?, next()?, next()?))
}

fn is_script_url(value: &str) -> bool {
    value.trim_start().to_ascii_lowercase().starts_with("javascript:")
}

fn strip_active_content(fragment: &DocumentFragment) {
    if let Ok(scripts) = fragment.query_selector_all("script") {
        for index in 0..scripts.length() {
            if let Some(script) = scripts.item(index).and_then(|node| node.dyn_into::<Element>().ok()) {
                script.remove();
            }
        }
    }
    let Ok(elements) = fragment.query_selector_all("*") else {
        return;
    };
    for index in 0..elements.length() {
        let Some(element) = elements.item(index).and_then(|node| node.dyn_into::<Element>().ok()) else {
            continue;
        };
        let names: Vec<String> = element
            .get_attribute_names()
            .iter()
            .filter_map(|name| name.as_string())
            .collect();
        for name in names {
            let lower = name.to_ascii_lowercase();
            let handler = lower.starts_with("on");
            let link = (lower == "href" || lower.ends_with(":href"))
                && element.get_attribute(&name).is_some_and(|value| is_script_url(&value));
            if handler || link {
                let _ = element.remove_attribute(&name);
            }
        }
    }
}

/// Replaces the children of `stage` with fetched puzzle markup. The markup is
/// parsed into an inert template and cleaned of scripts, `on*` handlers and
/// `javascript:` links before it reaches the live document.
pub(crate) fn inject_markup(document: &Document, stage: &Element, markup: &str) -> bool {
    let Some(template) = document
        .create_element("template")
        .ok()
        .and_then(|element| element.dyn_into::<HtmlTemplateElement>().ok())
    else {
        return false;
    };
    template.set_inner_html(markup);
    let content = template.content();
    strip_active_content(&content);
    stage.set_inner_html("");
    stage.append_child(&content).is_ok()
}

/// The live puzzle document injected into the page.
///
/// Bounding boxes are reported in the root `<svg>` user space by composing
/// each element's screen matrix with the inverse of the root's, so nested
/// transforms and CSS zoom cancel out.
pub(crate) struct DomSurface {
    document: Document,
    root: Option<Element>,
    message: HtmlElement,
}

impl DomSurface {
    /// Wraps the first `<svg>` under `stage`. The root stays `None` when the
    /// markup has none, which the engine treats as a missing puzzle root.
    pub(crate) fn attach(document: &Document, stage: &Element, message: HtmlElement) -> Self {
        let root = stage.query_selector("svg").ok().flatten();
        Self {
            document: document.clone(),
            root,
            message,
        }
    }

    pub(crate) fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    fn contains(&self, element: &Element) -> bool {
        self.root
            .as_ref()
            .is_some_and(|root| root.contains(Some(element.unchecked_ref())))
    }

    /// Transform from `element`'s user space into the root's user space.
    fn to_root(&self, element: &Element) -> Option<Affine> {
        let root = self.root.as_ref()?;
        let root_inverse = screen_ctm(root)?.invert()?;
        Some(screen_ctm(element)?.then(&root_inverse))
    }

    fn parent_to_root(&self, element: &Element) -> Affine {
        match element.parent_element() {
            Some(parent) if self.root.as_ref() != Some(&parent) => {
                self.to_root(&parent).unwrap_or(Affine::IDENTITY)
            }
            _ => Affine::IDENTITY,
        }
    }

    /// Empties the stage the document was injected into.
    pub(crate) fn clear(self) {
        if let Some(root) = &self.root {
            root.remove();
        }
        self.hide_message();
    }

    fn hide_message(&self) {
        let style = self.message.style();
        let _ = style.set_property("display", "none");
        self.message.set_text_content(None);
    }
}

impl PuzzleSurface for DomSurface {
    type Node = Element;

    fn element_ids(&self) -> Vec<String> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        let Ok(nodes) = root.query_selector_all("[id]") else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| element.id())
            .filter(|id| !id.is_empty())
            .collect()
    }

    fn find(&self, id: &str) -> Option<Element> {
        let element = self.document.get_element_by_id(id)?;
        self.contains(&element).then_some(element)
    }

    fn bounding_box(&self, node: &Element) -> Option<BBox> {
        let graphics = node.dyn_ref::<SvgGraphicsElement>()?;
        let local = graphics.get_b_box().ok()?;
        let bbox = BBox::new(local.x(), local.y(), local.width(), local.height());
        let to_root = self.to_root(node).unwrap_or(Affine::IDENTITY);
        Some(bbox.transformed(&to_root))
    }

    fn is_visible(&self, node: &Element) -> bool {
        if !self.contains(node) {
            return false;
        }
        let mut cursor = Some(node.clone());
        while let Some(element) = cursor {
            if element.get_attribute("display").as_deref() == Some("none") {
                return false;
            }
            if self.root.as_ref() == Some(&element) {
                break;
            }
            cursor = element.parent_element();
        }
        true
    }

    fn set_visible(&mut self, node: &Element, visible: bool) {
        if visible {
            let _ = node.remove_attribute("display");
        } else {
            let _ = node.set_attribute("display", "none");
        }
    }

    fn insert_hit_zone(&mut self, target: &Element, id: &str, rect: BBox, opacity: f32) -> Option<Element> {
        let local = match self.to_root(target).and_then(|matrix| matrix.invert()) {
            Some(from_root) => rect.transformed(&from_root),
            None => rect,
        };
        let zone = create_svg_element(&self.document, "rect");
        zone.set_id(id);
        let _ = zone.set_attribute("x", &local.min_x.to_string());
        let _ = zone.set_attribute("y", &local.min_y.to_string());
        let _ = zone.set_attribute("width", &local.width().to_string());
        let _ = zone.set_attribute("height", &local.height().to_string());
        let _ = zone.set_attribute("fill", "#000");
        let _ = zone.set_attribute("opacity", &opacity.to_string());
        let _ = zone.set_attribute("class", "puzzle-hit-zone");
        target
            .insert_before(&zone, target.first_child().as_ref())
            .ok()?;
        Some(zone)
    }

    fn spawn_ghost(&mut self, part: &Element, opacity: f32) -> Option<Element> {
        let root = self.root.as_ref()?;
        let clone = part.clone_node_with_deep(true).ok()?.dyn_into::<Element>().ok()?;
        clone.remove_attribute("id").ok()?;
        let _ = clone.remove_attribute("display");
        if let Ok(named) = clone.query_selector_all("[id]") {
            for index in 0..named.length() {
                if let Some(element) = named.item(index).and_then(|node| node.dyn_into::<Element>().ok()) {
                    let _ = element.remove_attribute("id");
                }
            }
        }

        let base = self.parent_to_root(part);
        let ghost = create_svg_element(&self.document, "g");
        let _ = ghost.set_attribute("class", GHOST_CLASS);
        let _ = ghost.set_attribute("opacity", &opacity.to_string());
        let _ = ghost.set_attribute("pointer-events", "none");
        let _ = ghost.set_attribute(
            GHOST_BASE_ATTR,
            &format!("{} {} {} {} {} {}", base.a, base.b, base.c, base.d, base.e, base.f),
        );
        let _ = ghost.set_attribute("transform", &format_matrix(&base));
        ghost.append_child(&clone).ok()?;
        root.append_child(&ghost).ok()?;
        Some(ghost)
    }

    fn translate_ghost(&mut self, ghost: &Element, offset: Point) {
        let base = ghost
            .get_attribute(GHOST_BASE_ATTR)
            .and_then(|value| parse_matrix(&value))
            .unwrap_or(Affine::IDENTITY);
        let placed = base.then(&Affine::translate(offset.x, offset.y));
        let _ = ghost.set_attribute("transform", &format_matrix(&placed));
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn apply_root_pulse(&mut self, frame: Option<PulseFrame>) -> bool {
        let Some(root) = self.root.as_ref().and_then(|root| root.dyn_ref::<SvgElement>()) else {
            return false;
        };
        let style = root.style();
        match frame {
            Some(frame) => {
                let _ = style.set_property("transform-origin", "center");
                let _ = style.set_property("transform", &format!("scale({})", frame.scale));
                let _ = style.set_property("opacity", &frame.opacity.to_string());
            }
            None => {
                let _ = style.remove_property("transform");
                let _ = style.remove_property("transform-origin");
                let _ = style.remove_property("opacity");
            }
        }
        true
    }

    fn present_message(&mut self, message: Option<&str>, opacity: f32) {
        let Some(message) = message else {
            self.hide_message();
            return;
        };
        self.message.set_text_content(Some(message));
        let style = self.message.style();
        let _ = style.set_property("display", "block");
        let _ = style.set_property("opacity", &opacity.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzlebox_core::PieceIndex;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const TWO_PIECES: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 400" width="400" height="400">
        <g id="g1"><rect x="0" y="0" width="40" height="40" fill="#e33"/></g>
        <g id="g2" transform="translate(100 0)"><rect x="0" y="0" width="40" height="40" fill="#3a3"/></g>
        <g id="t1"><rect x="0" y="300" width="40" height="40" fill="#ccc"/></g>
    </svg>"##;

    fn mount(markup: &str) -> (Element, DomSurface) {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .expect("document available");
        let body = document.body().expect("body");
        let stage = document.create_element("div").expect("stage");
        stage.set_inner_html(markup);
        let _ = body.append_child(&stage);
        let message = document
            .create_element("div")
            .expect("message")
            .dyn_into::<HtmlElement>()
            .expect("html element");
        let surface = DomSurface::attach(&document, &stage, message);
        (stage, surface)
    }

    #[wasm_bindgen_test]
    fn ids_and_bounds_are_in_root_space() {
        let (stage, surface) = mount(TWO_PIECES);
        let ids = surface.element_ids();
        assert!(ids.iter().any(|id| id == "g2"));
        let g2 = surface.find("g2").expect("g2");
        let bbox = surface.bounding_box(&g2).expect("bbox");
        assert!((bbox.center().x - 120.0).abs() < 0.5);
        assert!((bbox.center().y - 20.0).abs() < 0.5);
        stage.remove();
    }

    #[wasm_bindgen_test]
    fn hit_zone_goes_first_and_ghost_loses_ids() {
        let (stage, mut surface) = mount(TWO_PIECES);
        let target = surface.find("t1").expect("t1");
        let zone = surface
            .insert_hit_zone(&target, "rt1", BBox::new(-10.0, 290.0, 60.0, 60.0), 0.01)
            .expect("zone");
        assert_eq!(target.first_element_child(), Some(zone.clone()));
        assert_eq!(zone.get_attribute("opacity").as_deref(), Some("0.01"));

        let part = surface.find("g1").expect("g1");
        surface.set_visible(&part, false);
        assert!(!surface.is_visible(&part));
        let ghost = surface.spawn_ghost(&part, 0.7).expect("ghost");
        assert_eq!(surface.find("g1"), Some(part));
        assert!(ghost.query_selector("[id]").ok().flatten().is_none());
        surface.translate_ghost(&ghost, Point::new(5.0, 6.0));
        assert_eq!(
            ghost.get_attribute("transform").as_deref(),
            Some("matrix(1 0 0 1 5 6)")
        );
        surface.remove(&ghost);
        assert!(!surface.contains(&ghost));
        stage.remove();
    }

    #[wasm_bindgen_test]
    fn index_scans_live_markup() {
        let (stage, surface) = mount(TWO_PIECES);
        let index = PieceIndex::scan(&surface);
        assert_eq!(index.max_id(), Some(2));
        assert_eq!(index.part_ids(), vec![1, 2]);
        assert!(index.get(2).is_some_and(|slots| slots.target.is_none()));
        stage.remove();
    }

    #[wasm_bindgen_test]
    fn injected_markup_loses_scripts_and_handlers() {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .expect("document available");
        let stage = document.create_element("div").expect("stage");
        let markup = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10" onload="window.pbInjected = 1">
            <g id="g1" onclick="window.pbInjected = 2" ONMOUSEOVER="x()"><rect width="4" height="4" fill="#e33"/></g>
            <a href=" JavaScript:alert(1)"><rect id="t1" width="4" height="4"/></a>
            <a href="#g1"><circle r="1"/></a>
            <script>window.pbInjected = 3</script>
        </svg>"##;
        assert!(inject_markup(&document, &stage, markup));

        let svg = stage.query_selector("svg").ok().flatten().expect("svg kept");
        assert!(svg.get_attribute("onload").is_none());
        assert_eq!(svg.get_attribute("viewBox").as_deref(), Some("0 0 10 10"));
        let g1 = stage.query_selector("#g1").ok().flatten().expect("g1 kept");
        assert_eq!(g1.get_attribute_names().length(), 1);
        assert!(stage.query_selector("script").ok().flatten().is_none());
        let links = stage.query_selector_all("a").expect("links");
        assert_eq!(links.length(), 2);
        let first = links.item(0).and_then(|node| node.dyn_into::<Element>().ok()).expect("a");
        assert!(first.get_attribute("href").is_none());
        let second = links.item(1).and_then(|node| node.dyn_into::<Element>().ok()).expect("a");
        assert_eq!(second.get_attribute("href").as_deref(), Some("#g1"));
    }

    #[wasm_bindgen_test]
    fn missing_root_refuses_pulse() {
        let (stage, mut surface) = mount("<p>no puzzle here</p>");
        assert!(!surface.apply_root_pulse(Some(PulseFrame::REST)));
        assert!(surface.element_ids().is_empty());
        stage.remove();
    }
}
