use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{request_animation_frame, AnimationFrame};
use gloo::timers::callback::Interval;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlElement, MouseEvent};

use puzzlebox_core::catalog::emoji_for_index;
use puzzlebox_core::{
    format_clock, CompletionSummary, DropOutcome, PieceId, Point, PuzzleSession,
    PuzzleSummary, SessionEvent, SvgScene,
};

use crate::app_router::{self, PageSettings};
use crate::boot::{self, BootPhase};
use crate::catalog_fetch;
use crate::dom_surface::{inject_markup, DomSurface};
use crate::input::{client_point, client_to_document, is_touch_pointer, GestureSource};
use crate::local_store;

type GestureListeners = Vec<EventListener>;
type Session = PuzzleSession<DomSurface, GestureListeners>;

const ZOOM_STEP: f32 = 1.25;
const ZOOM_MIN: f32 = 0.5;
const ZOOM_MAX: f32 = 3.0;
const COMPLETE_CLASS: &str = "play-board complete";
const BOARD_CLASS: &str = "play-board";
const ACTIVE_OPTIONS: EventListenerOptions = EventListenerOptions {
    phase: EventListenerPhase::Bubble,
    passive: false,
};

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn session_seed() -> u64 {
    (js_sys::Math::random() * 9_007_199_254_740_991.0) as u64
}

fn append_element(document: &Document, parent: &Element, tag: &str, class: &str) -> Element {
    let element = document.create_element(tag).expect("create element");
    element.set_class_name(class);
    let _ = parent.append_child(&element);
    element
}

fn append_button(document: &Document, parent: &Element, class: &str, label: &str) -> Element {
    let button = append_element(document, parent, "button", class);
    let _ = button.set_attribute("type", "button");
    button.set_text_content(Some(label));
    button
}

fn set_hidden(element: &Element, hidden: bool) {
    if hidden {
        let _ = element.set_attribute("hidden", "");
    } else {
        let _ = element.remove_attribute("hidden");
    }
}

struct PlayElements {
    title: Element,
    details: Element,
    badge: Element,
    clock: Element,
    best: Element,
    reset: Element,
    zoom_out: Element,
    zoom_in: Element,
    board: Element,
    stage: HtmlElement,
    message: HtmlElement,
    fallback: Element,
    fallback_emoji: Element,
    fallback_text: Element,
    retry: Element,
}

impl PlayElements {
    fn build(document: &Document, root: &Element) -> Self {
        root.set_class_name("puzzlebox");
        let header = append_element(document, root, "header", "play-header");
        let title = append_element(document, &header, "h1", "play-title");
        let details = append_element(document, &header, "span", "play-details");
        let badge = append_element(document, &header, "span", "play-badge");
        let clock = append_element(document, &header, "span", "play-clock");
        clock.set_text_content(Some(&format_clock(0)));
        let best = append_element(document, &header, "span", "play-best");

        let controls = append_element(document, root, "div", "play-controls");
        let reset = append_button(document, &controls, "play-reset", "Start over");
        let zoom_out = append_button(document, &controls, "play-zoom-out", "−");
        let zoom_in = append_button(document, &controls, "play-zoom-in", "+");

        let board = append_element(document, root, "div", BOARD_CLASS);
        let stage = append_element(document, &board, "div", "play-stage")
            .dyn_into::<HtmlElement>()
            .expect("stage is an html element");
        let message = append_element(document, &board, "div", "play-message")
            .dyn_into::<HtmlElement>()
            .expect("message is an html element");
        let _ = message.style().set_property("display", "none");

        let fallback = append_element(document, root, "div", "play-fallback");
        let fallback_emoji = append_element(document, &fallback, "div", "play-fallback-emoji");
        let fallback_text = append_element(document, &fallback, "p", "play-fallback-text");
        let retry = append_button(document, &fallback, "play-retry", "Try again");
        set_hidden(&fallback, true);

        Self {
            title,
            details,
            badge,
            clock,
            best,
            reset,
            zoom_out,
            zoom_in,
            board,
            stage,
            message,
            fallback,
            fallback_emoji,
            fallback_text,
            retry,
        }
    }
}

struct PlayView {
    document: Document,
    elements: PlayElements,
    settings: PageSettings,
    session: RefCell<Option<Session>>,
    puzzle: RefCell<Option<PuzzleSummary>>,
    zoom: Cell<f32>,
    loading: Cell<bool>,
    listeners: RefCell<Vec<EventListener>>,
    zone_listeners: RefCell<Vec<EventListener>>,
    wired_zones: RefCell<BTreeSet<PieceId>>,
    frame: RefCell<Option<AnimationFrame>>,
    ticker: RefCell<Option<Interval>>,
}

thread_local! {
    static PLAY_VIEW: RefCell<Option<Rc<PlayView>>> = const { RefCell::new(None) };
}

pub(crate) fn run() {
    #[cfg(target_arch = "wasm32")]
    {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .expect("document available");
        let root = document.get_element_by_id("app").expect("app root exists");
        let elements = PlayElements::build(&document, &root);
        let settings = app_router::load_page_settings();
        let view = Rc::new(PlayView::new(document, elements, settings));
        view.install_listeners();
        view.load(false);
        PLAY_VIEW.with(|slot| {
            *slot.borrow_mut() = Some(view);
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("puzzlebox only runs on wasm32 targets");
    }
}

impl PlayView {
    fn new(document: Document, elements: PlayElements, settings: PageSettings) -> Self {
        let zoom = if settings.initial_zoom.is_finite() {
            settings.initial_zoom.clamp(ZOOM_MIN, ZOOM_MAX)
        } else {
            1.0
        };
        Self {
            document,
            elements,
            settings,
            session: RefCell::new(None),
            puzzle: RefCell::new(None),
            zoom: Cell::new(zoom),
            loading: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
            zone_listeners: RefCell::new(Vec::new()),
            wired_zones: RefCell::new(BTreeSet::new()),
            frame: RefCell::new(None),
            ticker: RefCell::new(None),
        }
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = Vec::new();

        let view = Rc::clone(self);
        listeners.push(EventListener::new(&self.elements.reset, "click", move |_event: &Event| {
            view.reset();
        }));
        let view = Rc::clone(self);
        listeners.push(EventListener::new(&self.elements.zoom_in, "click", move |_event: &Event| {
            view.zoom_by(ZOOM_STEP);
        }));
        let view = Rc::clone(self);
        listeners.push(EventListener::new(&self.elements.zoom_out, "click", move |_event: &Event| {
            view.zoom_by(1.0 / ZOOM_STEP);
        }));
        let view = Rc::clone(self);
        listeners.push(EventListener::new(&self.elements.retry, "click", move |_event: &Event| {
            view.load(true);
        }));

        *self.listeners.borrow_mut() = listeners;
    }

    fn load(self: &Rc<Self>, force_refresh: bool) {
        if self.loading.replace(true) {
            return;
        }
        self.teardown();
        let view = Rc::clone(self);
        spawn_local(async move {
            view.load_puzzle(force_refresh).await;
            view.loading.set(false);
        });
    }

    async fn load_puzzle(self: &Rc<Self>, force_refresh: bool) {
        boot::phase(BootPhase::Catalog, "loading puzzles");
        let puzzles = catalog_fetch::load_catalog(force_refresh).await;
        let requested = app_router::requested_puzzle_id();
        let Some(puzzle) = app_router::select_puzzle(&puzzles, requested.as_deref()).cloned()
        else {
            self.show_fallback(emoji_for_index(0), "No puzzles are available right now.");
            boot::fail("the puzzle list is empty", "check the catalog configuration");
            return;
        };
        if let Some(requested) = requested.as_deref().filter(|id| *id != puzzle.id) {
            gloo::console::warn!("play: unknown puzzle, showing the first one", requested);
        }
        self.show_header(&puzzle);
        *self.puzzle.borrow_mut() = Some(puzzle.clone());

        let Some(url) = puzzle.image_url.clone() else {
            gloo::console::warn!("play: puzzle has no document", puzzle.id.as_str());
            self.show_fallback(puzzle.emoji, "This puzzle has no picture yet.");
            boot::ready();
            return;
        };
        boot::phase(BootPhase::Document, &puzzle.title);
        let markup = match catalog_fetch::fetch_document(&url).await {
            Ok(markup) => markup,
            Err(err) => {
                gloo::console::error!("play: puzzle fetch failed", err.to_string());
                self.show_fallback(puzzle.emoji, "We couldn't load this puzzle.");
                boot::ready();
                return;
            }
        };
        if let Err(err) = SvgScene::parse(&markup) {
            gloo::console::error!("play: puzzle document is not valid svg", err.to_string());
            self.show_fallback(puzzle.emoji, "This puzzle picture is broken.");
            boot::ready();
            return;
        }
        self.mount(&markup);
        boot::ready();
    }

    fn mount(self: &Rc<Self>, markup: &str) {
        set_hidden(&self.elements.fallback, true);
        set_hidden(&self.elements.board, false);
        self.elements.board.set_class_name(BOARD_CLASS);
        if !inject_markup(&self.document, &self.elements.stage, markup) {
            gloo::console::warn!("play: could not inject the puzzle markup");
        }
        let surface = DomSurface::attach(
            &self.document,
            &self.elements.stage,
            self.elements.message.clone(),
        );
        let session = Session::start(surface, self.settings.engine, now_ms(), session_seed());
        let report = session.report();
        gloo::console::log!("play: armed pieces", report.armed.len());
        for skipped in &report.skipped {
            gloo::console::warn!(
                "play: skipping piece",
                skipped.id,
                format!("{:?}", skipped.reason)
            );
        }
        *self.session.borrow_mut() = Some(session);
        self.wire_hit_zones();
        self.apply_zoom();
        self.update_badge();
        self.set_clock(0);
        self.start_ticker();
    }

    /// Removes the current puzzle, its listeners and any running effects.
    fn teardown(&self) {
        self.ticker.borrow_mut().take();
        self.frame.borrow_mut().take();
        self.zone_listeners.borrow_mut().clear();
        self.wired_zones.borrow_mut().clear();
        let session = self.session.borrow_mut().take();
        if let Some(session) = session {
            session.into_surface().clear();
        }
        self.elements.stage.set_inner_html("");
        self.elements.board.set_class_name(BOARD_CLASS);
    }

    fn show_header(&self, puzzle: &PuzzleSummary) {
        self.elements.title.set_text_content(Some(&puzzle.title));
        let details = format!("{} · {} pieces", puzzle.difficulty, puzzle.pieces);
        self.elements.details.set_text_content(Some(&details));
        self.show_best_time(&puzzle.id);
    }

    fn show_best_time(&self, puzzle_id: &str) {
        let best = local_store::stats_store()
            .puzzle_best_time(puzzle_id)
            .map(|best| format!("Best {best}"));
        self.elements.best.set_text_content(best.as_deref());
    }

    fn show_fallback(&self, emoji: &str, reason: &str) {
        set_hidden(&self.elements.board, true);
        set_hidden(&self.elements.fallback, false);
        self.elements.fallback_emoji.set_text_content(Some(emoji));
        self.elements.fallback_text.set_text_content(Some(reason));
        self.elements.badge.set_text_content(None);
    }

    fn wire_hit_zones(self: &Rc<Self>) {
        let zones = match self.session.borrow().as_ref() {
            Some(session) => session.hit_zones(),
            None => return,
        };
        let mut wired = self.wired_zones.borrow_mut();
        let mut listeners = self.zone_listeners.borrow_mut();
        for (piece, zone) in zones {
            if !wired.insert(piece) {
                continue;
            }
            // The hit zone is the lowest child of its target, so listening on
            // the target also catches presses on the target's artwork.
            let container = zone.parent_element().unwrap_or(zone);

            let view = Rc::clone(self);
            listeners.push(EventListener::new_with_options(
                &container,
                "pointerdown",
                ACTIVE_OPTIONS,
                move |event: &Event| {
                    if is_touch_pointer(event) {
                        return;
                    }
                    if event.dyn_ref::<MouseEvent>().is_some_and(|mouse| mouse.button() != 0) {
                        return;
                    }
                    view.begin_drag(piece, event, GestureSource::Pointer);
                },
            ));

            let view = Rc::clone(self);
            listeners.push(EventListener::new_with_options(
                &container,
                "touchstart",
                ACTIVE_OPTIONS,
                move |event: &Event| {
                    view.begin_drag(piece, event, GestureSource::Touch);
                },
            ));
        }
    }

    fn document_point(&self, event: &Event) -> Option<Point> {
        let client = client_point(event)?;
        let session = self.session.borrow();
        let root = session.as_ref()?.surface().root()?;
        client_to_document(root, client)
    }

    /// Window-level listeners for one gesture. The session drops them on
    /// every way the gesture ends.
    fn gesture_listeners(self: &Rc<Self>, source: GestureSource) -> GestureListeners {
        let Some(window) = web_sys::window() else {
            return Vec::new();
        };
        let mut listeners = Vec::with_capacity(3);
        let view = Rc::clone(self);
        listeners.push(EventListener::new_with_options(
            &window,
            source.move_event(),
            ACTIVE_OPTIONS,
            move |event: &Event| view.drag_move(event),
        ));
        let view = Rc::clone(self);
        listeners.push(EventListener::new_with_options(
            &window,
            source.up_event(),
            ACTIVE_OPTIONS,
            move |event: &Event| view.drag_end(event),
        ));
        let view = Rc::clone(self);
        listeners.push(EventListener::new(
            &window,
            source.cancel_event(),
            move |_event: &Event| view.drag_cancel(),
        ));
        listeners
    }

    fn begin_drag(self: &Rc<Self>, piece: PieceId, event: &Event, source: GestureSource) {
        let Some(point) = self.document_point(event) else {
            return;
        };
        let listeners = self.gesture_listeners(source);
        let started = match self.session.borrow_mut().as_mut() {
            Some(session) => session.pointer_down(piece, point, listeners),
            None => return,
        };
        match started {
            Ok(_) => {
                event.prevent_default();
                self.ensure_frame();
            }
            Err(reason) => {
                gloo::console::debug!("play: drag refused", piece, format!("{reason:?}"));
            }
        }
    }

    fn drag_move(&self, event: &Event) {
        let Some(point) = self.document_point(event) else {
            return;
        };
        let moved = self
            .session
            .borrow_mut()
            .as_mut()
            .is_some_and(|session| session.pointer_move(point));
        if moved {
            event.prevent_default();
        }
    }

    fn drag_end(self: &Rc<Self>, event: &Event) {
        let Some(point) = self.document_point(event) else {
            self.drag_cancel();
            return;
        };
        let outcome = self
            .session
            .borrow_mut()
            .as_mut()
            .and_then(|session| session.pointer_up(point, now_ms()));
        match outcome {
            Some(DropOutcome::Placed { completion, .. }) => {
                self.update_badge();
                if let Some(summary) = completion {
                    self.finish(summary);
                }
            }
            Some(DropOutcome::SprungBack { .. }) => self.ensure_frame(),
            None => {}
        }
    }

    fn drag_cancel(&self) {
        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.abandon_drag();
        }
    }

    fn finish(self: &Rc<Self>, summary: CompletionSummary) {
        self.ticker.borrow_mut().take();
        self.set_clock(summary.elapsed_seconds);
        self.elements.board.set_class_name(COMPLETE_CLASS);
        if !summary.pulse_applied {
            gloo::console::warn!("play: puzzle root missing, skipped the pulse");
        }
        self.ensure_frame();

        let Some(puzzle_id) = self.puzzle.borrow().as_ref().map(|puzzle| puzzle.id.clone()) else {
            return;
        };
        let view = Rc::clone(self);
        spawn_local(async move {
            local_store::record_completion(&puzzle_id, &summary);
            view.show_best_time(&puzzle_id);
        });
    }

    fn ensure_frame(self: &Rc<Self>) {
        if self.frame.borrow().is_some() {
            return;
        }
        let view = Rc::clone(self);
        let handle = request_animation_frame(move |_| {
            view.frame.borrow_mut().take();
            view.step_effects();
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn step_effects(self: &Rc<Self>) {
        let (events, pending) = {
            let mut session = self.session.borrow_mut();
            let Some(session) = session.as_mut() else {
                return;
            };
            let events = session.advance(now_ms());
            (events, session.has_pending_effects())
        };
        for event in events {
            match event {
                SessionEvent::MessageShown(message) => {
                    gloo::console::log!("play: celebration", message);
                }
                SessionEvent::CelebrationFinished => {
                    gloo::console::log!("play: celebration finished");
                }
                SessionEvent::SpringBackSettled(_) => {}
            }
        }
        if pending {
            self.ensure_frame();
        }
    }

    fn start_ticker(self: &Rc<Self>) {
        let Some(tick_ms) = self
            .session
            .borrow()
            .as_ref()
            .map(|session| session.config().timer_tick_ms)
        else {
            return;
        };
        let view = Rc::clone(self);
        let interval = Interval::new(tick_ms, move || {
            let changed = view
                .session
                .borrow_mut()
                .as_mut()
                .and_then(|session| session.tick_timer(now_ms()));
            if let Some(seconds) = changed {
                view.set_clock(seconds);
            }
        });
        *self.ticker.borrow_mut() = Some(interval);
    }

    fn reset(self: &Rc<Self>) {
        let reset = match self.session.borrow_mut().as_mut() {
            Some(session) => {
                session.reset(now_ms());
                true
            }
            None => false,
        };
        if !reset {
            return;
        }
        self.elements.board.set_class_name(BOARD_CLASS);
        self.update_badge();
        self.set_clock(0);
        self.start_ticker();
    }

    fn zoom_by(&self, factor: f32) {
        let zoom = (self.zoom.get() * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        self.zoom.set(zoom);
        self.apply_zoom();
    }

    fn apply_zoom(&self) {
        let style = self.elements.stage.style();
        let _ = style.set_property("transform-origin", "center top");
        let _ = style.set_property("transform", &format!("scale({})", self.zoom.get()));
    }

    fn update_badge(&self) {
        let progress = self
            .session
            .borrow()
            .as_ref()
            .map(|session| format!("{}/{}", session.placed_count(), session.armed_count()));
        self.elements.badge.set_text_content(progress.as_deref());
    }

    fn set_clock(&self, seconds: u64) {
        self.elements.clock.set_text_content(Some(&format_clock(seconds)));
    }
}
