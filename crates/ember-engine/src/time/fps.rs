/// Averages frame rate over windows of at least one second.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frames: u32,
    accumulated: f32,
    last_sample: Option<f32>,
}

impl FpsCounter {
    const WINDOW_SECS: f32 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame of duration `dt` seconds.
    ///
    /// Returns a new FPS sample when the current window is complete.
    pub fn record(&mut self, dt: f32) -> Option<f32> {
        self.frames += 1;
        self.accumulated += dt;

        if self.accumulated < Self::WINDOW_SECS {
            return None;
        }

        let fps = self.frames as f32 / self.accumulated;
        self.frames = 0;
        self.accumulated = 0.0;
        self.last_sample = Some(fps);
        Some(fps)
    }

    /// Most recent sample, if a window has completed.
    pub fn fps(&self) -> Option<f32> {
        self.last_sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sample_before_one_second() {
        let mut fps = FpsCounter::new();
        for _ in 0..59 {
            assert_eq!(fps.record(1.0 / 60.0), None);
        }
        assert_eq!(fps.fps(), None);
    }

    #[test]
    fn sample_after_window() {
        let mut fps = FpsCounter::new();
        let mut sample = None;
        for _ in 0..40 {
            if let Some(s) = fps.record(0.05) {
                sample = Some(s);
                break;
            }
        }
        let sample = sample.expect("20 frames of 50ms complete a window");
        assert!((sample - 20.0).abs() < 0.5);
        assert_eq!(fps.fps(), Some(sample));
    }
}
