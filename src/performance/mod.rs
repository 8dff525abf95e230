//! # Frame timing
//!
//! Per-frame delta time for camera movement and the light orbit, plus a
//! rolling frame-time average for the debug panel.
//!
//! ```rust
//! use tabletop::performance::FrameTimer;
//!
//! let mut timer = FrameTimer::new();
//! let dt = timer.tick();
//! assert!(dt >= 0.0);
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of frames the rolling average covers (~2 seconds at 60fps).
pub const FRAME_SAMPLES: usize = 120;
/// Minimum interval between metric refreshes.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Frame statistics as last refreshed
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetrics {
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
        }
    }
}

pub struct FrameTimer {
    start: Instant,
    last_frame: Instant,
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    metrics: FrameMetrics,
    last_update: Instant,
    update_interval: Duration,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_frame: now,
            frame_times: VecDeque::with_capacity(FRAME_SAMPLES),
            max_samples: FRAME_SAMPLES,
            metrics: FrameMetrics::default(),
            last_update: now,
            update_interval: UPDATE_INTERVAL,
        }
    }

    /// Marks the start of a new frame and returns the seconds since the last one.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.add_frame_time(delta);

        if now.saturating_duration_since(self.last_update) >= self.update_interval {
            self.update_metrics();
            self.last_update = now;
        }

        delta.as_secs_f32()
    }

    /// Seconds since the timer was created. Drives the orbiting light and eye.
    pub fn elapsed_secs(&self) -> f32 {
        self.last_frame
            .saturating_duration_since(self.start)
            .as_secs_f32()
    }

    fn add_frame_time(&mut self, frame_time: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
    }

    fn update_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total_time: Duration = self.frame_times.iter().sum();
        let avg_frame_time_ms =
            total_time.as_secs_f32() * 1000.0 / self.frame_times.len() as f32;

        self.metrics.frame_time_ms = avg_frame_time_ms;
        self.metrics.fps = if avg_frame_time_ms > 0.0 {
            1000.0 / avg_frame_time_ms
        } else {
            0.0
        };

        if let (Some(min_time), Some(max_time)) =
            (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.metrics.min_frame_time_ms = min_time.as_secs_f32() * 1000.0;
            self.metrics.max_frame_time_ms = max_time.as_secs_f32() * 1000.0;
        }

        log::trace!(
            "Frame time {:.2}ms ({:.1} fps)",
            self.metrics.frame_time_ms,
            self.metrics.fps
        );
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    /// Recent frame times in milliseconds, oldest first.
    pub fn frame_time_history(&self) -> Vec<f32> {
        self.frame_times
            .iter()
            .map(|duration| duration.as_secs_f32() * 1000.0)
            .collect()
    }

    pub fn sample_count(&self) -> usize {
        self.frame_times.len()
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
