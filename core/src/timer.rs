/// Wall-clock session timer.
///
/// The authoritative elapsed time is always recomputed from the origin.
/// `tick` only feeds the on-screen counter; skipping or delaying ticks never
/// changes what `elapsed_seconds` reports.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionTimer {
    origin_ms: Option<f64>,
    frozen_ms: Option<f64>,
    displayed: u64,
}

fn whole_seconds(from_ms: f64, to_ms: f64) -> u64 {
    let elapsed = (to_ms - from_ms) / 1000.0;
    if elapsed.is_finite() && elapsed > 0.0 {
        elapsed.floor() as u64
    } else {
        0
    }
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: f64) {
        *self = Self {
            origin_ms: Some(now_ms),
            frozen_ms: None,
            displayed: 0,
        };
    }

    /// New origin, zero elapsed.
    pub fn reset(&mut self, now_ms: f64) {
        self.start(now_ms);
    }

    pub fn is_running(&self) -> bool {
        self.origin_ms.is_some() && self.frozen_ms.is_none()
    }

    pub fn origin_ms(&self) -> Option<f64> {
        self.origin_ms
    }

    /// Display seconds, changed only by `tick`.
    pub fn displayed(&self) -> u64 {
        self.displayed
    }

    /// Updates the display counter. Returns the new value when it changed.
    pub fn tick(&mut self, now_ms: f64) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        let origin = self.origin_ms?;
        let seconds = whole_seconds(origin, now_ms);
        if seconds == self.displayed {
            return None;
        }
        self.displayed = seconds;
        Some(seconds)
    }

    pub fn elapsed_seconds(&self, now_ms: f64) -> u64 {
        match self.origin_ms {
            Some(origin) => whole_seconds(origin, self.frozen_ms.unwrap_or(now_ms)),
            None => 0,
        }
    }

    /// Stops the timer and returns the authoritative elapsed seconds. Freezing
    /// twice keeps the first instant.
    pub fn freeze(&mut self, now_ms: f64) -> u64 {
        if self.origin_ms.is_some() && self.frozen_ms.is_none() {
            self.frozen_ms = Some(now_ms);
        }
        let elapsed = self.elapsed_seconds(now_ms);
        self.displayed = elapsed;
        elapsed
    }
}

/// `MM:SS`, minutes unbounded.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_ignores_missed_ticks() {
        let mut timer = SessionTimer::new();
        timer.start(10_000.0);
        assert_eq!(timer.tick(11_000.0), Some(1));
        assert_eq!(timer.tick(11_500.0), None);
        assert_eq!(timer.displayed(), 1);
        assert_eq!(timer.elapsed_seconds(95_400.0), 85);
        assert_eq!(timer.freeze(95_400.0), 85);
        assert!(!timer.is_running());
        assert_eq!(timer.tick(200_000.0), None);
        assert_eq!(timer.elapsed_seconds(200_000.0), 85);
    }

    #[test]
    fn reset_zeroes_the_clock() {
        let mut timer = SessionTimer::new();
        timer.start(0.0);
        timer.freeze(61_000.0);
        timer.reset(70_000.0);
        assert!(timer.is_running());
        assert_eq!(timer.displayed(), 0);
        assert_eq!(timer.elapsed_seconds(70_999.0), 0);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(85), "01:25");
        assert_eq!(format_clock(6001), "100:01");
    }
}
