use std::collections::VecDeque;
use std::time::Duration;

/// Rolling count of frames presented within a trailing window. Purely
/// informational, nothing else depends on it.
pub struct FrameCounter {
    window: Duration,
    frames: VecDeque<Duration>,
}

impl FrameCounter {
    pub fn new() -> FrameCounter {
        FrameCounter::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> FrameCounter {
        FrameCounter {
            window,
            frames: VecDeque::new(),
        }
    }

    pub fn push(&mut self, timestamp: Duration) {
        self.frames.push_back(timestamp);
        self.prune(timestamp);
    }

    /// Frames recorded within the trailing window ending at `now`.
    pub fn fps(&mut self, now: Duration) -> usize {
        self.prune(now);
        self.frames.len()
    }

    fn prune(&mut self, now: Duration) {
        let cutoff = now.saturating_sub(self.window);
        while self.frames.front().is_some_and(|&t| t < cutoff) {
            self.frames.pop_front();
        }
    }
}
