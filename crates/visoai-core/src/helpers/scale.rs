// crates/visoai-core/src/helpers/scale.rs
//
// Linear mapping between seconds on a track and horizontal screen positions.
// Pure arithmetic over plain floats so the timeline widget's geometry can be
// tested without a UI context.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineScale {
    left:     f32,
    width:    f32,
    duration: f64,
}

impl TimelineScale {
    /// `left` / `width` in points; `duration` in seconds.
    pub fn new(left: f32, width: f32, duration: f64) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 { duration } else { 0.0 };
        Self { left, width: width.max(0.0), duration }
    }

    pub fn duration(&self) -> f64 { self.duration }

    pub fn secs_to_x(&self, secs: f64) -> f32 {
        if self.duration <= 0.0 {
            return self.left;
        }
        let frac = (secs / self.duration).clamp(0.0, 1.0);
        self.left + (frac * self.width as f64) as f32
    }

    /// Screen position to seconds, clamped to `[0, duration]`. Returns None
    /// for non-finite input or an empty scale.
    pub fn x_to_secs(&self, x: f32) -> Option<f64> {
        if !x.is_finite() || self.width <= 0.0 || self.duration <= 0.0 {
            return None;
        }
        let frac = ((x - self.left) / self.width).clamp(0.0, 1.0) as f64;
        Some(frac * self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_within_a_pixel() {
        let s = TimelineScale::new(40.0, 600.0, 12.0);
        for t in [0.0, 0.5, 3.3, 6.0, 11.99, 12.0] {
            let back = s.x_to_secs(s.secs_to_x(t)).unwrap();
            assert!((back - t).abs() < 12.0 / 600.0, "{t} → {back}");
        }
    }

    #[test]
    fn positions_outside_the_track_clamp() {
        let s = TimelineScale::new(0.0, 100.0, 10.0);
        assert_eq!(s.x_to_secs(-50.0), Some(0.0));
        assert_eq!(s.x_to_secs(500.0), Some(10.0));
        assert_eq!(s.secs_to_x(99.0), 100.0);
    }

    #[test]
    fn empty_scale_yields_nothing() {
        let s = TimelineScale::new(0.0, 100.0, f64::NAN);
        assert_eq!(s.x_to_secs(10.0), None);
        assert_eq!(s.secs_to_x(3.0), 0.0);
        assert_eq!(TimelineScale::new(0.0, 100.0, 4.0).x_to_secs(f32::NAN), None);
    }
}
