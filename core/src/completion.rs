use crate::element_id::PieceId;
use crate::registry::PieceIndex;
use crate::surface::PuzzleSurface;

/// Armed pieces whose tray container is still visible, ascending.
pub fn remaining_hit_zones<S>(surface: &S, index: &PieceIndex<S::Node>) -> Vec<PieceId>
where
    S: PuzzleSurface,
{
    index
        .armed()
        .filter(|slots| {
            slots
                .target
                .as_ref()
                .is_some_and(|target| surface.is_visible(target))
        })
        .map(|slots| slots.id)
        .collect()
}

/// Latches the first time nothing is left to place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompletionDetector {
    fired: bool,
}

impl CompletionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` exactly once per session. A puzzle with no armed pieces
    /// never completes.
    pub fn check(&mut self, armed: usize, remaining: usize) -> bool {
        if self.fired || armed == 0 || remaining > 0 {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.fired
    }

    pub fn reset(&mut self) {
        self.fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once() {
        let mut detector = CompletionDetector::new();
        assert!(!detector.check(3, 1));
        assert!(detector.check(3, 0));
        assert!(!detector.check(3, 0));
        detector.reset();
        assert!(!detector.is_complete());
        assert!(!detector.check(0, 0));
    }
}
