//! One play-through of a loaded puzzle document.
//!
//! `PuzzleSession` owns the surface, the piece index, the drag controller,
//! the timer and every scheduled effect. The browser layer forwards pointer
//! input and animation frames to it and never touches the document behind its
//! back, so reset and teardown always see the whole picture.

use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::animation::{TaskQueue, Tween};
use crate::celebration::{pick_message, Celebration, CelebrationEvent};
use crate::completion::{remaining_hit_zones, CompletionDetector};
use crate::config::EngineConfig;
use crate::drag::{DragController, DragGesture, Release};
use crate::element_id::PieceId;
use crate::geometry::Point;
use crate::hit_zone::synthesize_hit_zones;
use crate::registry::{PieceIndex, SkippedPiece};
use crate::surface::PuzzleSurface;
use crate::timer::{format_clock, SessionTimer};

/// What the load pass found. Skipped pieces are never draggable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub armed: Vec<PieceId>,
    pub skipped: Vec<SkippedPiece>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionSummary {
    pub elapsed_seconds: u64,
    pub formatted: String,
    pub message: &'static str,
    pub pieces: usize,
    pub pulse_applied: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DropOutcome {
    Placed {
        piece: PieceId,
        completion: Option<CompletionSummary>,
    },
    SprungBack {
        piece: PieceId,
        distance: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragRejected {
    Completed,
    UnknownPiece,
    AlreadyPlaced,
    InvalidPoint,
    GhostUnavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    SpringBackSettled(PieceId),
    MessageShown(&'static str),
    CelebrationFinished,
}

#[derive(Debug)]
enum SessionTask<N> {
    SpringBack {
        piece: PieceId,
        ghost: N,
        anchor: Point,
        tween: Tween,
    },
    Celebrate(Celebration),
}

pub struct PuzzleSession<S: PuzzleSurface, R> {
    surface: S,
    config: EngineConfig,
    index: PieceIndex<S::Node>,
    drag: DragController<S::Node, R>,
    tasks: TaskQueue<SessionTask<S::Node>>,
    placed: BTreeSet<PieceId>,
    timer: SessionTimer,
    completion: CompletionDetector,
    rng: SmallRng,
    report: LoadReport,
}

impl<S: PuzzleSurface, R> PuzzleSession<S, R> {
    /// Indexes the document, synthesizes hit zones, hides every paired part
    /// and starts the timer.
    pub fn start(mut surface: S, config: EngineConfig, now_ms: f64, seed: u64) -> Self {
        let config = config.validated();
        let mut index = PieceIndex::scan(&surface);
        synthesize_hit_zones(
            &mut surface,
            &mut index,
            config.hit_zone_padding,
            config.hit_zone_opacity,
        );
        let report = LoadReport {
            armed: index.armed().map(|slots| slots.id).collect(),
            skipped: index.skipped(),
        };
        let mut timer = SessionTimer::new();
        timer.start(now_ms);
        let mut session = Self {
            surface,
            drag: DragController::new(config.snap_threshold),
            config,
            index,
            tasks: TaskQueue::new(),
            placed: BTreeSet::new(),
            timer,
            completion: CompletionDetector::new(),
            rng: SmallRng::seed_from_u64(seed),
            report,
        };
        session.arm_pieces();
        session
    }

    fn arm_pieces(&mut self) {
        for slots in self.index.armed() {
            if let Some(part) = &slots.part {
                self.surface.set_visible(part, false);
            }
            if let Some(target) = &slots.target {
                self.surface.set_visible(target, true);
            }
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn armed_count(&self) -> usize {
        self.report.armed.len()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn is_placed(&self, piece: PieceId) -> bool {
        self.placed.contains(&piece)
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_complete()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn active_piece(&self) -> Option<PieceId> {
        self.drag.active().map(|gesture| gesture.piece)
    }

    /// Hit zones of every armed piece, for listener wiring.
    pub fn hit_zones(&self) -> Vec<(PieceId, S::Node)> {
        self.index
            .armed()
            .filter_map(|slots| slots.hit_zone.clone().map(|zone| (slots.id, zone)))
            .collect()
    }

    pub fn elapsed_seconds(&self, now_ms: f64) -> u64 {
        self.timer.elapsed_seconds(now_ms)
    }

    pub fn displayed_seconds(&self) -> u64 {
        self.timer.displayed()
    }

    pub fn has_pending_effects(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Advances the display counter. Display only.
    pub fn tick_timer(&mut self, now_ms: f64) -> Option<u64> {
        self.timer.tick(now_ms)
    }

    /// Starts dragging `piece`. `listeners` is held for the lifetime of the
    /// gesture and dropped on every way out of it, including rejection here.
    pub fn pointer_down(
        &mut self,
        piece: PieceId,
        point: Point,
        listeners: R,
    ) -> Result<PieceId, DragRejected> {
        if self.completion.is_complete() {
            return Err(DragRejected::Completed);
        }
        if !point.is_finite() {
            return Err(DragRejected::InvalidPoint);
        }
        let slots = self
            .index
            .get(piece)
            .filter(|slots| slots.is_armed())
            .ok_or(DragRejected::UnknownPiece)?;
        let (Some(part), Some(target), Some(zone), Some(anchor)) = (
            slots.part.clone(),
            slots.target.clone(),
            slots.hit_zone.clone(),
            slots.centroid,
        ) else {
            return Err(DragRejected::UnknownPiece);
        };
        if self.placed.contains(&piece) || !self.surface.is_visible(&target) {
            return Err(DragRejected::AlreadyPlaced);
        }

        self.evict_ghosts();

        let tray_origin = self
            .surface
            .bounding_box(&zone)
            .or_else(|| self.surface.bounding_box(&target))
            .map(|bbox| bbox.center())
            .unwrap_or(point);
        let ghost = self
            .surface
            .spawn_ghost(&part, self.config.ghost_opacity)
            .ok_or(DragRejected::GhostUnavailable)?;
        let gesture = DragGesture::new(piece, ghost.clone(), tray_origin, anchor, point, listeners);
        self.surface.translate_ghost(&ghost, gesture.ghost_offset());
        if let Some(stale) = self.drag.begin(gesture) {
            self.surface.remove(&stale);
        }
        Ok(piece)
    }

    /// Removes the in-flight ghost and any ghost still springing back.
    fn evict_ghosts(&mut self) {
        if let Some(stale) = self.drag.cancel() {
            self.surface.remove(&stale);
        }
        let springing = self
            .tasks
            .cancel_matching(|task| matches!(task, SessionTask::SpringBack { .. }));
        for task in springing {
            discard_task(&mut self.surface, task);
        }
    }

    pub fn pointer_move(&mut self, point: Point) -> bool {
        match self.drag.track(point) {
            Some((ghost, offset)) => {
                self.surface.translate_ghost(&ghost, offset);
                true
            }
            None => false,
        }
    }

    pub fn pointer_up(&mut self, point: Point, now_ms: f64) -> Option<DropOutcome> {
        match self.drag.release(point)? {
            Release::Snapped { piece, ghost, .. } => {
                self.surface.remove(&ghost);
                self.place(piece);
                let completion = self.check_completion(now_ms);
                Some(DropOutcome::Placed { piece, completion })
            }
            Release::Missed {
                piece,
                ghost,
                from,
                tray_origin,
                anchor,
                distance,
            } => {
                self.tasks.schedule(SessionTask::SpringBack {
                    piece,
                    ghost,
                    anchor,
                    tween: Tween::new(from, tray_origin, now_ms, self.config.spring_back_ms),
                });
                Some(DropOutcome::SprungBack { piece, distance })
            }
        }
    }

    /// Drops the current gesture without a verdict, removing its ghost.
    pub fn abandon_drag(&mut self) -> bool {
        match self.drag.cancel() {
            Some(ghost) => {
                self.surface.remove(&ghost);
                true
            }
            None => false,
        }
    }

    fn place(&mut self, piece: PieceId) {
        let Some(slots) = self.index.get(piece) else {
            return;
        };
        if let Some(part) = &slots.part {
            self.surface.set_visible(part, true);
        }
        if let Some(target) = &slots.target {
            self.surface.set_visible(target, false);
        }
        self.placed.insert(piece);
    }

    fn check_completion(&mut self, now_ms: f64) -> Option<CompletionSummary> {
        let remaining = remaining_hit_zones(&self.surface, &self.index).len();
        if !self.completion.check(self.armed_count(), remaining) {
            return None;
        }
        let elapsed_seconds = self.timer.freeze(now_ms);
        let message = pick_message(&mut self.rng);
        let celebration = Celebration::start(&mut self.surface, &self.config, message, now_ms);
        let pulse_applied = celebration.pulse_applied();
        self.tasks.schedule(SessionTask::Celebrate(celebration));
        Some(CompletionSummary {
            elapsed_seconds,
            formatted: format_clock(elapsed_seconds),
            message,
            pieces: self.armed_count(),
            pulse_applied,
        })
    }

    /// Steps spring-backs and the celebration. Call once per animation frame.
    pub fn advance(&mut self, now_ms: f64) -> Vec<SessionEvent> {
        let Self { surface, tasks, .. } = self;
        let mut events = Vec::new();
        let finished = tasks.advance(|task| match task {
            SessionTask::SpringBack {
                ghost,
                anchor,
                tween,
                ..
            } => {
                let (position, done) = tween.sample(now_ms);
                surface.translate_ghost(ghost, anchor.offset_to(position));
                done
            }
            SessionTask::Celebrate(celebration) => {
                match celebration.advance(surface, now_ms) {
                    Some(CelebrationEvent::MessageShown) => {
                        events.push(SessionEvent::MessageShown(celebration.message()));
                    }
                    Some(CelebrationEvent::Finished) => {
                        events.push(SessionEvent::CelebrationFinished);
                    }
                    None => {}
                }
                celebration.is_done()
            }
        });
        for task in finished {
            if let SessionTask::SpringBack { piece, ghost, .. } = task {
                surface.remove(&ghost);
                events.push(SessionEvent::SpringBackSettled(piece));
            }
        }
        events
    }

    /// Back to the pre-play state: no ghost, every paired part hidden, every
    /// hit zone active, timer at zero, completion cleared.
    pub fn reset(&mut self, now_ms: f64) {
        if let Some(ghost) = self.drag.cancel() {
            self.surface.remove(&ghost);
        }
        for task in self.tasks.cancel_all() {
            discard_task(&mut self.surface, task);
        }
        self.surface.apply_root_pulse(None);
        self.surface.present_message(None, 0.0);
        self.placed.clear();
        self.completion.reset();
        self.arm_pieces();
        self.timer.reset(now_ms);
    }

    /// Tears the session down, detaching any in-flight gesture first.
    pub fn into_surface(mut self) -> S {
        self.abandon_drag();
        for task in self.tasks.cancel_all() {
            discard_task(&mut self.surface, task);
        }
        self.surface
    }
}

fn discard_task<S: PuzzleSurface>(surface: &mut S, task: SessionTask<S::Node>) {
    match task {
        SessionTask::SpringBack { ghost, .. } => surface.remove(&ghost),
        SessionTask::Celebrate(mut celebration) => celebration.cancel(surface),
    }
}
