//! Fixed-step simulation clock with an integer time multiplier.

/// Largest supported time multiplier
pub const MAX_TIME_SCALE: u32 = 15;

#[derive(Clone, Debug)]
pub struct SimClock {
    raw_delta: f32,
    time_scale: u32,
    total_raw: f64,
    total_scaled: f64,
    ticks: u64,
}

impl SimClock {
    /// # Panics
    /// If `time_scale` is outside `1..=MAX_TIME_SCALE` or `raw_delta` is not positive.
    pub fn new(raw_delta: f32, time_scale: u32) -> Self {
        assert!(raw_delta > 0.0, "clock step must be positive");
        assert!((1..=MAX_TIME_SCALE).contains(&time_scale), "time scale {time_scale} out of range");
        Self {
            raw_delta,
            time_scale,
            total_raw: 0.0,
            total_scaled: 0.0,
            ticks: 0,
        }
    }

    /// Advance one step
    pub fn tick(&mut self) {
        self.total_raw += self.raw_delta as f64;
        self.total_scaled += self.delta_scaled() as f64;
        self.ticks += 1;
    }

    /// Raw seconds per step
    pub fn delta(&self) -> f32 {
        self.raw_delta
    }

    /// Simulation seconds per step
    pub fn delta_scaled(&self) -> f32 {
        self.raw_delta * self.time_scale as f32
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    pub fn increment_time_scale(&mut self) {
        self.time_scale = (self.time_scale + 1).min(MAX_TIME_SCALE);
    }

    pub fn decrement_time_scale(&mut self) {
        self.time_scale = self.time_scale.saturating_sub(1).max(1);
    }

    pub fn total_raw(&self) -> f64 {
        self.total_raw
    }

    pub fn total_scaled(&self) -> f64 {
        self.total_scaled
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_delta() {
        let mut clock = SimClock::new(0.5, 3);
        assert_eq!(clock.delta_scaled(), 1.5);
        clock.tick();
        clock.tick();
        assert_eq!(clock.total_raw(), 1.0);
        assert_eq!(clock.total_scaled(), 3.0);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn test_time_scale_saturates() {
        let mut clock = SimClock::new(1.0 / 60.0, MAX_TIME_SCALE);
        clock.increment_time_scale();
        assert_eq!(clock.time_scale(), MAX_TIME_SCALE);

        let mut clock = SimClock::new(1.0 / 60.0, 1);
        clock.decrement_time_scale();
        assert_eq!(clock.time_scale(), 1);
        clock.increment_time_scale();
        assert_eq!(clock.time_scale(), 2);
    }

    #[test]
    #[should_panic]
    fn test_zero_scale_rejected() {
        SimClock::new(1.0 / 60.0, 0);
    }
}
