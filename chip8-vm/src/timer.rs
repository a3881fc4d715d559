//! Delay and sound timers.

/// Two independent countdowns, decremented by an external 60Hz tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    /// (DT) Delay timer that counts down to 0.
    pub delay: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Default::default()
    }

    /// Count down both timers by one, stopping at zero.
    #[inline]
    pub fn tick(&mut self) {
        // The checked_sub implementation uses `unlikely!()` which degrades performance.
        let (val, underflow) = self.delay.overflowing_sub(1);
        if !underflow {
            self.delay = val;
        }

        let (val, underflow) = self.sound.overflowing_sub(1);
        if !underflow {
            self.sound = val;
        }
    }

    /// Buzzer should be on while the sound timer counts down.
    #[inline]
    pub fn buzzer(&self) -> bool {
        self.sound > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tick_floors_at_zero() {
        let mut timers = Timers { delay: 2, sound: 0 };

        timers.tick();
        assert_eq!(timers, Timers { delay: 1, sound: 0 });
        timers.tick();
        timers.tick();
        assert_eq!(timers, Timers { delay: 0, sound: 0 });
    }

    #[test]
    fn test_independent_countdown() {
        let mut timers = Timers {
            delay: 0xFF,
            sound: 1,
        };
        assert!(timers.buzzer());

        timers.tick();
        assert_eq!(timers.delay, 0xFE);
        assert_eq!(timers.sound, 0);
        assert!(!timers.buzzer());
    }
}
