use wasm_bindgen::JsCast;
use web_sys::{Element, Event, MouseEvent, PointerEvent, SvgGraphicsElement, SvgMatrix, Touch, TouchEvent};

use puzzlebox_core::geometry::screen_to_document;
use puzzlebox_core::{Affine, ClientRect, Point, ViewBox, ViewportMapping};

/// Which family of DOM events drives a gesture. Touch input is handled through
/// touch events so pointer events from the same finger are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GestureSource {
    Pointer,
    Touch,
}

impl GestureSource {
    pub(crate) fn move_event(self) -> &'static str {
        match self {
            GestureSource::Pointer => "pointermove",
            GestureSource::Touch => "touchmove",
        }
    }

    pub(crate) fn up_event(self) -> &'static str {
        match self {
            GestureSource::Pointer => "pointerup",
            GestureSource::Touch => "touchend",
        }
    }

    pub(crate) fn cancel_event(self) -> &'static str {
        match self {
            GestureSource::Pointer => "pointercancel",
            GestureSource::Touch => "touchcancel",
        }
    }
}

pub(crate) fn is_touch_pointer(event: &Event) -> bool {
    event
        .dyn_ref::<PointerEvent>()
        .is_some_and(|event| event.pointer_type() == "touch")
}

fn first_touch(event: &TouchEvent) -> Option<Touch> {
    let changed = event.changed_touches();
    changed.item(0).or_else(|| event.touches().item(0))
}

/// Client-space position of a pointer, mouse or touch event.
pub(crate) fn client_point(event: &Event) -> Option<Point> {
    if let Some(touch_event) = event.dyn_ref::<TouchEvent>() {
        let touch = first_touch(touch_event)?;
        return Some(Point::new(touch.client_x() as f32, touch.client_y() as f32));
    }
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(Point::new(mouse.client_x() as f32, mouse.client_y() as f32))
}

pub(crate) fn affine_from_matrix(matrix: &SvgMatrix) -> Affine {
    Affine::new(
        matrix.a(),
        matrix.b(),
        matrix.c(),
        matrix.d(),
        matrix.e(),
        matrix.f(),
    )
}

pub(crate) fn screen_ctm(element: &Element) -> Option<Affine> {
    let graphics = element.dyn_ref::<SvgGraphicsElement>()?;
    graphics.get_screen_ctm().map(|matrix| affine_from_matrix(&matrix))
}

fn viewport_mapping(svg: &Element) -> Option<ViewportMapping> {
    let view_box = svg
        .get_attribute("viewBox")
        .and_then(|value| ViewBox::parse(&value))?;
    let rect = svg.get_bounding_client_rect();
    Some(ViewportMapping {
        rect: ClientRect {
            left: rect.left() as f32,
            top: rect.top() as f32,
            width: rect.width() as f32,
            height: rect.height() as f32,
        },
        view_box,
    })
}

/// Maps a client position into the puzzle root's user space. The screen CTM
/// already folds in pan, zoom and the viewBox; the client rect mapping is only
/// used when the browser cannot provide one.
pub(crate) fn client_to_document(svg: &Element, client: Point) -> Option<Point> {
    if let Some(ctm) = screen_ctm(svg) {
        if let Some(point) = screen_to_document(client, &ctm) {
            return Some(point);
        }
    }
    viewport_mapping(svg)?.screen_to_document(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn gesture_sources_listen_to_matching_events() {
        assert_eq!(GestureSource::Pointer.move_event(), "pointermove");
        assert_eq!(GestureSource::Touch.up_event(), "touchend");
        assert_eq!(GestureSource::Touch.cancel_event(), "touchcancel");
    }

    #[wasm_bindgen_test]
    fn client_point_reads_mouse_coordinates() {
        let init = web_sys::MouseEventInit::new();
        init.set_client_x(42);
        init.set_client_y(17);
        let event = MouseEvent::new_with_mouse_event_init_dict("pointerdown", &init)
            .expect("mouse event");
        assert_eq!(client_point(&event), Some(Point::new(42.0, 17.0)));
    }
}
