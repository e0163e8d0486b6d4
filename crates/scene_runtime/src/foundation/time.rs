//! Time management utilities

use std::time::{Duration, Instant};

/// Elapsed time handed to a frame, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Timestep(f32);

impl Timestep {
    /// Create a timestep from seconds
    pub const fn from_seconds(seconds: f32) -> Self {
        Self(seconds)
    }

    /// Elapsed time in seconds
    pub const fn seconds(self) -> f32 {
        self.0
    }

    /// Elapsed time in milliseconds
    pub fn milliseconds(self) -> f32 {
        self.0 * 1000.0
    }
}

impl From<f32> for Timestep {
    fn from(seconds: f32) -> Self {
        Self(seconds)
    }
}

impl From<Duration> for Timestep {
    fn from(duration: Duration) -> Self {
        Self(duration.as_secs_f32())
    }
}

impl From<Timestep> for f32 {
    fn from(step: Timestep) -> Self {
        step.0
    }
}

/// Frame clock feeding [`Timestep`]s to the scene
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
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the clock by one frame and return the elapsed step
    pub fn tick(&mut self) -> Timestep {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
        Timestep(self.delta_time)
    }

    /// Get the time since the last frame in seconds
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub const fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug, Default)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub const fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Get the elapsed time in whole microseconds
    pub fn elapsed_micros(&self) -> u64 {
        u64::try_from(self.elapsed().as_micros()).unwrap_or(u64::MAX)
    }
}
