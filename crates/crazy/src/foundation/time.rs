//! Frame timing driven by the native clock
//!
//! The native layer reports time as seconds since library init. The timer
//! never samples a clock itself; callers feed it timestamps so the same
//! code runs against GLFW and the headless backend.

/// Per-frame delta tracking
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_frame: f64,
    delta_time: f32,
    total_time: f64,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a new timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the timer and take `now` as the reference for the first delta
    pub fn start(&mut self, now: f64) {
        *self = Self {
            last_frame: now,
            ..Self::default()
        };
    }

    /// Advance to `now` and return the elapsed seconds since the previous sample
    ///
    /// A clock that goes backwards yields a zero delta.
    pub fn tick(&mut self, now: f64) -> f32 {
        let elapsed = (now - self.last_frame).max(0.0);
        self.delta_time = elapsed as f32;
        self.total_time += elapsed;
        self.last_frame = now;
        self.frame_count += 1;
        self.delta_time
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since `start`
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Get the number of ticks since `start`
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since `start`
    pub fn average_fps(&self) -> f64 {
        if self.total_time > 0.0 {
            self.frame_count as f64 / self.total_time
        } else {
            0.0
        }
    }

    /// Get the current FPS (based on last frame time)
    pub fn current_fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_tick_uses_start_as_reference() {
        let mut timer = FrameTimer::new();
        timer.start(2.0);
        assert_relative_eq!(timer.tick(2.0), 0.0);
        assert_eq!(timer.frame_count(), 1);
    }

    #[test]
    fn test_tick_accumulates() {
        let mut timer = FrameTimer::new();
        timer.start(0.0);
        assert_relative_eq!(timer.tick(0.25), 0.25);
        assert_relative_eq!(timer.tick(0.75), 0.5);
        assert_relative_eq!(timer.total_time(), 0.75);
        assert_relative_eq!(timer.current_fps(), 2.0);
        assert_relative_eq!(timer.average_fps(), 2.0 / 0.75);
    }

    #[test]
    fn test_backwards_clock_clamps_to_zero() {
        let mut timer = FrameTimer::new();
        timer.start(5.0);
        assert_relative_eq!(timer.tick(4.0), 0.0);
        assert_relative_eq!(timer.current_fps(), 0.0);
    }

    #[test]
    fn test_restart_resets_counters() {
        let mut timer = FrameTimer::new();
        timer.start(0.0);
        timer.tick(1.0);
        timer.start(10.0);
        assert_eq!(timer.frame_count(), 0);
        assert_relative_eq!(timer.total_time(), 0.0);
        assert_relative_eq!(timer.average_fps(), 0.0);
    }
}
