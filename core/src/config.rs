use serde::{Deserialize, Serialize};

pub const SNAP_THRESHOLD_DEFAULT: f32 = 50.0;
pub const HIT_ZONE_PADDING_DEFAULT: f32 = 10.0;
pub const HIT_ZONE_OPACITY_DEFAULT: f32 = 0.01;
pub const GHOST_OPACITY_DEFAULT: f32 = 0.7;
pub const SPRING_BACK_MS_DEFAULT: f64 = 300.0;
pub const PULSE_PERIOD_MS_DEFAULT: f64 = 600.0;
pub const PULSE_MIN_SCALE_DEFAULT: f32 = 0.95;
pub const PULSE_MIN_OPACITY_DEFAULT: f32 = 0.6;
pub const MESSAGE_FADE_MS_DEFAULT: f64 = 400.0;
pub const TIMER_TICK_MS_DEFAULT: u32 = 1000;

/// Tunables for one play session. Distances are in document units and are
/// deliberately not scaled by zoom.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub snap_threshold: f32,
    pub hit_zone_padding: f32,
    pub hit_zone_opacity: f32,
    pub ghost_opacity: f32,
    pub spring_back_ms: f64,
    pub pulse_period_ms: f64,
    pub pulse_min_scale: f32,
    pub pulse_min_opacity: f32,
    pub message_fade_ms: f64,
    pub timer_tick_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_threshold: SNAP_THRESHOLD_DEFAULT,
            hit_zone_padding: HIT_ZONE_PADDING_DEFAULT,
            hit_zone_opacity: HIT_ZONE_OPACITY_DEFAULT,
            ghost_opacity: GHOST_OPACITY_DEFAULT,
            spring_back_ms: SPRING_BACK_MS_DEFAULT,
            pulse_period_ms: PULSE_PERIOD_MS_DEFAULT,
            pulse_min_scale: PULSE_MIN_SCALE_DEFAULT,
            pulse_min_opacity: PULSE_MIN_OPACITY_DEFAULT,
            message_fade_ms: MESSAGE_FADE_MS_DEFAULT,
            timer_tick_ms: TIMER_TICK_MS_DEFAULT,
        }
    }
}

impl EngineConfig {
    /// Replaces out-of-range values with their defaults. Hit-zone opacity is
    /// kept strictly above zero so the rectangle still receives pointer events.
    pub fn validated(mut self) -> Self {
        let defaults = EngineConfig::default();
        if !self.snap_threshold.is_finite() || self.snap_threshold <= 0.0 {
            self.snap_threshold = defaults.snap_threshold;
        }
        if !self.hit_zone_padding.is_finite() || self.hit_zone_padding < 0.0 {
            self.hit_zone_padding = defaults.hit_zone_padding;
        }
        if !self.hit_zone_opacity.is_finite()
            || self.hit_zone_opacity <= 0.0
            || self.hit_zone_opacity > 1.0
        {
            self.hit_zone_opacity = defaults.hit_zone_opacity;
        }
        if !self.ghost_opacity.is_finite() || !(0.0..=1.0).contains(&self.ghost_opacity) {
            self.ghost_opacity = defaults.ghost_opacity;
        }
        if !self.spring_back_ms.is_finite() || self.spring_back_ms < 0.0 {
            self.spring_back_ms = defaults.spring_back_ms;
        }
        if !self.pulse_period_ms.is_finite() || self.pulse_period_ms <= 0.0 {
            self.pulse_period_ms = defaults.pulse_period_ms;
        }
        if !self.pulse_min_scale.is_finite() || self.pulse_min_scale <= 0.0 {
            self.pulse_min_scale = defaults.pulse_min_scale;
        }
        if !self.pulse_min_opacity.is_finite() || !(0.0..=1.0).contains(&self.pulse_min_opacity) {
            self.pulse_min_opacity = defaults.pulse_min_opacity;
        }
        if !self.message_fade_ms.is_finite() || self.message_fade_ms < 0.0 {
            self.message_fade_ms = defaults.message_fade_ms;
        }
        if self.timer_tick_ms == 0 {
            self.timer_tick_ms = defaults.timer_tick_ms;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"snap_threshold": 30.0}"#).expect("valid json");
        assert_eq!(config.snap_threshold, 30.0);
        assert_eq!(config.pulse_period_ms, PULSE_PERIOD_MS_DEFAULT);
    }

    #[test]
    fn pulse_count_is_not_configurable() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"pulse_iterations": 0, "pulse_period_ms": 500.0}"#)
                .expect("unknown keys are ignored");
        assert_eq!(config.pulse_period_ms, 500.0);
        assert_eq!(config, EngineConfig { pulse_period_ms: 500.0, ..EngineConfig::default() });
    }

    #[test]
    fn validated_repairs_zero_opacity_hit_zone() {
        let config = EngineConfig {
            hit_zone_opacity: 0.0,
            snap_threshold: f32::NAN,
            ..EngineConfig::default()
        }
        .validated();
        assert_eq!(config.hit_zone_opacity, HIT_ZONE_OPACITY_DEFAULT);
        assert_eq!(config.snap_threshold, SNAP_THRESHOLD_DEFAULT);
    }
}
