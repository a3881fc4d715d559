//! Frame clock.
use std::{
    thread,
    time::{Duration, Instant},
};

use chip8_vm::constants::CLOCK_CYCLE_TIME;

/// Paces the driver loop to the 60Hz timer frequency.
///
/// Each call to [`FrameClock::wait`] blocks until the next frame deadline.
/// When the loop falls behind by more than a frame, the clock starts over
/// from the current time instead of trying to catch up.
pub struct FrameClock {
    frame_time: Duration,
    deadline: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let frame_time = Duration::from_nanos(CLOCK_CYCLE_TIME);
        Self {
            frame_time,
            deadline: Instant::now() + frame_time,
        }
    }

    /// Block the current thread until the next frame.
    pub fn wait(&mut self) {
        let now = Instant::now();

        if now < self.deadline {
            thread::sleep(self.deadline - now);
            self.deadline += self.frame_time;
        } else if now - self.deadline > self.frame_time {
            self.deadline = now + self.frame_time;
        } else {
            self.deadline += self.frame_time;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frame_time() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame_time.as_millis(), 16);
    }

    #[test]
    fn test_wait_paces_frames() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.wait();
        clock.wait();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
