use std::time::{Duration, Instant};

/// Frame-rate estimate refreshed once per `interval`.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    interval: Duration,
    window_start: Option<Instant>,
    frames: u32,
    fps: f64,
}

impl FpsMeter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: None,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count a frame seen at `now`; returns the fresh estimate when one was computed.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.interval && !elapsed.is_zero() {
            self.fps = self.frames as f64 / elapsed.as_secs_f64();
            self.frames = 0;
            self.window_start = Some(now);
            return Some(self.fps);
        }
        None
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_once_per_interval() {
        let mut meter = FpsMeter::default();
        let t0 = Instant::now();
        assert_eq!(meter.tick(t0), None);
        for i in 1..5 {
            assert_eq!(meter.tick(t0 + Duration::from_millis(100 * i)), None);
        }
        let fps = meter.tick(t0 + Duration::from_millis(500)).unwrap();
        assert!((fps - 12.0).abs() < 1e-9);
        assert_eq!(meter.fps(), fps);
    }
}
