//! Frame clock

use std::time::Instant;

/// Monotonic frame clock
///
/// `update` is called exactly once per frame; the resulting `delta_time` is the
/// single step shared by camera movement and particle simulation.
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Clock starting now
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Sample the clock; call exactly once per frame
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Seconds between the last two `update` calls
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Sum of every `delta_time` so far
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of `update` calls
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second averaged over the whole run
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_starts_at_zero() {
        let timer = Timer::new();
        assert_eq!(timer.delta_time(), 0.0);
        assert_eq!(timer.total_time(), 0.0);
        assert_eq!(timer.frame_count(), 0);
        assert_eq!(timer.average_fps(), 0.0);
    }

    #[test]
    fn test_update_accumulates() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();

        assert_eq!(timer.frame_count(), 2);
        assert!(timer.delta_time() >= 0.0);
        assert!(timer.total_time() >= timer.delta_time());
    }
}
