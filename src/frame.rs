use std::thread;
use std::time::{Duration, Instant};

/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    pub time: f32,
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Wall-clock frame source. Infinite unless capped with [`FrameIterator::limit`].
///
/// With a target rate set, `next` sleeps off whatever is left of the frame
/// budget so the loop does not spin faster than the display can show.
pub struct FrameIterator {
    frame_number: u64,
    start_time: Instant,
    last_frame_time: Instant,
    frame_budget: Option<Duration>,
    limit: Option<u64>,
}

impl FrameIterator {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_number: 0,
            start_time: now,
            last_frame_time: now,
            frame_budget: None,
            limit: None,
        }
    }

    /// Pace frames to at most `fps` per second
    pub fn with_target_fps(mut self, fps: f32) -> Self {
        self.frame_budget = (fps > 0.0).then(|| Duration::from_secs_f32(1.0 / fps));
        self
    }

    /// Stop after `frames` frames
    pub fn limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn time(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32()
    }
}

impl Default for FrameIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for FrameIterator {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        if self.limit.is_some_and(|limit| self.frame_number >= limit) {
            return None;
        }

        // the first frame is never delayed
        if let Some(budget) = self.frame_budget.filter(|_| self.frame_number > 0) {
            let spent = self.last_frame_time.elapsed();
            if spent < budget {
                thread::sleep(budget - spent);
            }
        }

        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f32();
        let time = now.duration_since(self.start_time).as_secs_f32();

        let info = FrameInfo::new(self.frame_number, time, delta);

        self.frame_number += 1;
        self.last_frame_time = now;

        Some(info)
    }
}

/// Deterministic frame source: every frame advances time by the same step.
/// Used for headless runs and anywhere wall-clock jitter is unwanted.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    step: f32,
    frame_number: u64,
    limit: Option<u64>,
}

impl FixedStepClock {
    pub fn new(hz: f32) -> Self {
        Self {
            step: 1.0 / hz,
            frame_number: 0,
            limit: None,
        }
    }

    pub fn limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn step(&self) -> f32 {
        self.step
    }
}

impl Iterator for FixedStepClock {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        if self.limit.is_some_and(|limit| self.frame_number >= limit) {
            return None;
        }
        let info = FrameInfo::new(self.frame_number, self.frame_number as f32 * self.step, self.step);
        self.frame_number += 1;
        Some(info)
    }
}

/// Counts frames and reports the average rate once per interval
#[derive(Debug, Clone, Copy)]
pub struct FpsCounter {
    interval: f32,
    elapsed: f32,
    frames: u32,
}

impl FpsCounter {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Record one frame. Returns the rate when an interval has completed.
    pub fn tick(&mut self, delta: f32) -> Option<f32> {
        self.elapsed += delta;
        self.frames += 1;

        if self.elapsed >= self.interval {
            let fps = self.frames as f32 / self.elapsed;
            self.elapsed = 0.0;
            self.frames = 0;
            Some(fps)
        } else {
            None
        }
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(1.0)
    }
}
