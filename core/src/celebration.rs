use rand::Rng;

use crate::animation::{Fade, Pulse};
use crate::config::EngineConfig;
use crate::surface::PuzzleSurface;

pub const PULSE_ITERATIONS: u32 = 3;

pub const CONGRATULATIONS: &[&str] = &[
    "Great job!",
    "Amazing work!",
    "You did it!",
    "Puzzle superstar!",
    "Fantastic!",
    "Well done!",
    "Awesome building!",
    "You're a puzzle master!",
];

pub fn pick_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    CONGRATULATIONS[rng.random_range(0..CONGRATULATIONS.len())]
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Pulsing,
    Revealing(Fade),
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CelebrationEvent {
    MessageShown,
    Finished,
}

/// Completion effect: the root pulses a fixed number of times, then the
/// message fades in. A document without a root skips straight to the message.
#[derive(Clone, Debug, PartialEq)]
pub struct Celebration {
    pulse: Pulse,
    message: &'static str,
    fade_ms: f64,
    phase: Phase,
    pulse_applied: bool,
}

impl Celebration {
    pub fn start<S: PuzzleSurface>(
        surface: &mut S,
        config: &EngineConfig,
        message: &'static str,
        now_ms: f64,
    ) -> Self {
        let pulse = Pulse {
            start_ms: now_ms,
            period_ms: config.pulse_period_ms,
            iterations: PULSE_ITERATIONS,
            min_scale: config.pulse_min_scale,
            min_opacity: config.pulse_min_opacity,
        };
        let first = pulse.frame_at(now_ms);
        let pulse_applied = surface.apply_root_pulse(first);
        let mut celebration = Self {
            pulse,
            message,
            fade_ms: config.message_fade_ms,
            phase: Phase::Pulsing,
            pulse_applied,
        };
        if !pulse_applied || first.is_none() {
            celebration.reveal(surface, now_ms);
        }
        celebration
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    /// `false` when the puzzle root was missing and the pulse was skipped.
    pub fn pulse_applied(&self) -> bool {
        self.pulse_applied
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    fn reveal<S: PuzzleSurface>(&mut self, surface: &mut S, now_ms: f64) {
        surface.present_message(Some(self.message), 0.0);
        self.phase = Phase::Revealing(Fade::fade_in(now_ms, self.fade_ms));
    }

    pub fn advance<S: PuzzleSurface>(&mut self, surface: &mut S, now_ms: f64) -> Option<CelebrationEvent> {
        match self.phase {
            Phase::Pulsing => match self.pulse.frame_at(now_ms) {
                Some(frame) => {
                    surface.apply_root_pulse(Some(frame));
                    None
                }
                None => {
                    surface.apply_root_pulse(None);
                    self.reveal(surface, now_ms);
                    Some(CelebrationEvent::MessageShown)
                }
            },
            Phase::Revealing(fade) => {
                let (opacity, done) = fade.value_at(now_ms);
                surface.present_message(Some(self.message), opacity);
                if done {
                    self.phase = Phase::Done;
                    Some(CelebrationEvent::Finished)
                } else {
                    None
                }
            }
            Phase::Done => None,
        }
    }

    /// Clears every trace of the effect from the surface.
    pub fn cancel<S: PuzzleSurface>(&mut self, surface: &mut S) {
        if self.pulse_applied {
            surface.apply_root_pulse(None);
        }
        surface.present_message(None, 0.0);
        self.phase = Phase::Done;
    }
}
