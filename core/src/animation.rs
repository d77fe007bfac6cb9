//! Time-driven effects and the cancellable task queue that runs them.
//!
//! Effects are pure functions of a start instant and `now`, so the browser's
//! animation frame loop and native tests drive them identically.

use crate::geometry::Point;
use crate::surface::PulseFrame;

fn progress(now_ms: f64, start_ms: f64, duration_ms: f64) -> f32 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    ((now_ms - start_ms) / duration_ms).clamp(0.0, 1.0) as f32
}

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Eased point-to-point movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: Point,
    pub to: Point,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl Tween {
    pub fn new(from: Point, to: Point, start_ms: f64, duration_ms: f64) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms,
        }
    }

    /// Returns the position at `now_ms` and whether the tween has finished.
    pub fn sample(&self, now_ms: f64) -> (Point, bool) {
        let t = progress(now_ms, self.start_ms, self.duration_ms);
        if t >= 1.0 {
            return (self.to, true);
        }
        (self.from.lerp(self.to, ease_out_cubic(t)), false)
    }
}

/// Finite scale-and-fade pulse. Each iteration dips to the minimum at its
/// midpoint and returns to rest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub start_ms: f64,
    pub period_ms: f64,
    pub iterations: u32,
    pub min_scale: f32,
    pub min_opacity: f32,
}

impl Pulse {
    pub fn total_ms(&self) -> f64 {
        self.period_ms * f64::from(self.iterations)
    }

    /// `None` once every iteration has played.
    pub fn frame_at(&self, now_ms: f64) -> Option<PulseFrame> {
        let elapsed = (now_ms - self.start_ms).max(0.0);
        if self.iterations == 0 || self.period_ms <= 0.0 || elapsed >= self.total_ms() {
            return None;
        }
        let phase = ((elapsed % self.period_ms) / self.period_ms) as f32;
        let depth = 1.0 - (2.0 * phase - 1.0).abs();
        Some(PulseFrame {
            scale: 1.0 - (1.0 - self.min_scale) * depth,
            opacity: 1.0 - (1.0 - self.min_opacity) * depth,
        })
    }
}

/// Linear opacity ramp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    pub from: f32,
    pub to: f32,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl Fade {
    pub fn fade_in(start_ms: f64, duration_ms: f64) -> Self {
        Self {
            from: 0.0,
            to: 1.0,
            start_ms,
            duration_ms,
        }
    }

    pub fn value_at(&self, now_ms: f64) -> (f32, bool) {
        let t = progress(now_ms, self.start_ms, self.duration_ms);
        (self.from + (self.to - self.from) * t, t >= 1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Scheduled<T> {
    id: TaskId,
    task: T,
}

/// Ordered set of in-flight tasks. Cancelling hands the task back so the
/// caller can undo whatever it put on the document.
#[derive(Debug)]
pub struct TaskQueue<T> {
    next_id: u64,
    tasks: Vec<Scheduled<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Scheduled { id, task });
        id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tasks.iter().map(|scheduled| &scheduled.task)
    }

    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let position = self.tasks.iter().position(|scheduled| scheduled.id == id)?;
        Some(self.tasks.remove(position).task)
    }

    pub fn cancel_all(&mut self) -> Vec<T> {
        self.tasks.drain(..).map(|scheduled| scheduled.task).collect()
    }

    pub fn cancel_matching<F>(&mut self, mut predicate: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let (matching, rest): (Vec<_>, Vec<_>) = self
            .tasks
            .drain(..)
            .partition(|scheduled| predicate(&scheduled.task));
        self.tasks = rest;
        matching.into_iter().map(|scheduled| scheduled.task).collect()
    }

    /// Steps every task; tasks for which `step` returns `true` are finished
    /// and handed back in scheduling order.
    pub fn advance<F>(&mut self, mut step: F) -> Vec<T>
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut finished = Vec::new();
        let mut live = Vec::with_capacity(self.tasks.len());
        for mut scheduled in self.tasks.drain(..) {
            if step(&mut scheduled.task) {
                finished.push(scheduled.task);
            } else {
                live.push(scheduled);
            }
        }
        self.tasks = live;
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tween_lands_exactly_on_target() {
        let tween = Tween::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 1000.0, 300.0);
        let (start, done) = tween.sample(1000.0);
        assert_eq!(start, Point::new(0.0, 0.0));
        assert!(!done);
        let (middle, _) = tween.sample(1150.0);
        assert!(middle.x > 50.0 && middle.x < 100.0);
        assert_eq!(tween.sample(1300.0), (Point::new(100.0, 0.0), true));
    }

    #[test]
    fn pulse_plays_a_bounded_number_of_times() {
        let pulse = Pulse {
            start_ms: 0.0,
            period_ms: 600.0,
            iterations: 3,
            min_scale: 0.95,
            min_opacity: 0.6,
        };
        assert_eq!(pulse.frame_at(0.0), Some(PulseFrame::REST));
        let trough = pulse.frame_at(900.0).expect("mid second iteration");
        assert!((trough.scale - 0.95).abs() < 1e-6);
        assert!((trough.opacity - 0.6).abs() < 1e-6);
        assert!(pulse.frame_at(1799.0).is_some());
        assert_eq!(pulse.frame_at(1800.0), None);
    }

    #[test]
    fn cancelled_tasks_are_handed_back() {
        let mut queue = TaskQueue::new();
        let spring = queue.schedule("spring");
        queue.schedule("pulse");
        assert_eq!(queue.cancel(spring), Some("spring"));
        assert_eq!(queue.cancel(spring), None);
        assert_eq!(queue.len(), 1);

        queue.schedule("fade");
        assert_eq!(queue.cancel_matching(|task| *task == "fade"), vec!["fade"]);
        assert_eq!(queue.cancel_all(), vec!["pulse"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn advance_returns_finished_in_order() {
        let mut queue = TaskQueue::new();
        queue.schedule(1u32);
        queue.schedule(2);
        queue.schedule(3);
        let finished = queue.advance(|task| *task != 2);
        assert_eq!(finished, vec![1, 3]);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2]);
    }
}
