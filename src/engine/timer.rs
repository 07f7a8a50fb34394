use std::time::{Duration, Instant};

/// Per-frame time sample, measured from the timer epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerData {
    pub current: Duration,
    pub delta: Duration,
}

pub struct Timer {
    epoch: Instant,
    data: TimerData,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            epoch: Instant::now(),
            data: TimerData {
                current: Duration::ZERO,
                delta: Duration::ZERO,
            },
        }
    }

    /// Moves the epoch to now and zeroes the sample.
    pub fn reset(&mut self) {
        self.epoch = Instant::now();
        self.data.current = Duration::ZERO;
        self.data.delta = Duration::ZERO;
    }

    pub fn update(&mut self) {
        let now = self.epoch.elapsed();
        self.data.delta = now - self.data.current;
        self.data.current = now;
    }

    pub fn data(&self) -> TimerData {
        self.data
    }
}
