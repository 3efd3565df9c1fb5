use std::time::Duration;

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Countdown state for the active round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundClock {
    pub total_seconds: u32,
    pub remaining_seconds: u32,
    pub expired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining_seconds: u32 },
    Expired,
}

/// Presentation hint derived from the remaining time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

/// Per-second countdown that fires exactly one expiry.
#[derive(Debug, Clone)]
pub struct RoundTimer {
    clock: RoundClock,
    carry: Duration,
    stopped: bool,
}

impl RoundTimer {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            clock: RoundClock {
                total_seconds: duration_secs,
                remaining_seconds: duration_secs,
                expired: false,
            },
            carry: Duration::ZERO,
            stopped: false,
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self::new(minutes.saturating_mul(60))
    }

    /// Rebinds the countdown to a new duration, discarding the old one
    pub fn reset(&mut self, duration_secs: u32) {
        *self = Self::new(duration_secs);
    }

    pub fn stop(&mut self) {
        self.stopped = true;
        self.carry = Duration::ZERO;
    }

    pub fn clock(&self) -> &RoundClock {
        &self.clock
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.clock.remaining_seconds
    }

    pub fn is_expired(&self) -> bool {
        self.clock.expired
    }

    pub fn is_running(&self) -> bool {
        !self.stopped && !self.clock.expired
    }

    pub fn urgency(&self) -> Urgency {
        match self.clock.remaining_seconds {
            0..=60 => Urgency::Critical,
            61..=300 => Urgency::Warning,
            _ => Urgency::Normal,
        }
    }

    /// Emits one tick per whole elapsed second, then `Expired` once remaining hits zero
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        if !self.is_running() {
            return events;
        }
        if self.clock.remaining_seconds == 0 {
            self.clock.expired = true;
            events.push(TimerEvent::Expired);
            return events;
        }

        self.carry += elapsed;
        while self.carry >= ONE_SECOND {
            self.carry -= ONE_SECOND;
            self.clock.remaining_seconds -= 1;
            events.push(TimerEvent::Tick {
                remaining_seconds: self.clock.remaining_seconds,
            });
            if self.clock.remaining_seconds == 0 {
                self.clock.expired = true;
                self.carry = Duration::ZERO;
                events.push(TimerEvent::Expired);
                break;
            }
        }
        events
    }
}

/// Formats seconds as `MM:SS`, or `H:MM:SS` past an hour
pub fn format_clock(seconds: u32) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_zero_then_expires_once() {
        let mut timer = RoundTimer::new(5);
        let mut ticks = Vec::new();
        let mut expiries = 0;
        for _ in 0..20 {
            for e in timer.advance(ONE_SECOND) {
                match e {
                    TimerEvent::Tick { remaining_seconds } => ticks.push(remaining_seconds),
                    TimerEvent::Expired => expiries += 1,
                }
            }
        }
        assert_eq!(ticks, vec![4, 3, 2, 1, 0]);
        assert_eq!(expiries, 1);
        assert!(timer.is_expired());
    }

    #[test]
    fn large_jumps_never_go_negative() {
        let mut timer = RoundTimer::new(3);
        let events = timer.advance(Duration::from_secs(60));
        assert_eq!(
            events,
            vec![
                TimerEvent::Tick { remaining_seconds: 2 },
                TimerEvent::Tick { remaining_seconds: 1 },
                TimerEvent::Tick { remaining_seconds: 0 },
                TimerEvent::Expired,
            ]
        );
        assert!(timer.advance(Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn sub_second_steps_accumulate() {
        let mut timer = RoundTimer::new(2);
        let mut events = Vec::new();
        for _ in 0..10 {
            events.extend(timer.advance(Duration::from_millis(100)));
        }
        assert_eq!(events, vec![TimerEvent::Tick { remaining_seconds: 1 }]);
    }

    #[test]
    fn zero_duration_expires_without_ticks() {
        let mut timer = RoundTimer::new(0);
        assert_eq!(timer.advance(Duration::ZERO), vec![TimerEvent::Expired]);
        assert!(timer.advance(ONE_SECOND).is_empty());
    }

    #[test]
    fn reset_discards_previous_countdown() {
        let mut timer = RoundTimer::from_minutes(10);
        timer.advance(Duration::from_secs(30));
        assert_eq!(timer.remaining_seconds(), 570);

        timer.reset(90);
        assert_eq!(timer.clock().total_seconds, 90);
        assert_eq!(timer.remaining_seconds(), 90);
        timer.advance(Duration::from_millis(1500));
        assert_eq!(timer.remaining_seconds(), 89);
    }

    #[test]
    fn stopped_timer_does_not_tick() {
        let mut timer = RoundTimer::new(10);
        timer.stop();
        assert!(timer.advance(Duration::from_secs(20)).is_empty());
        assert_eq!(timer.remaining_seconds(), 10);
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(RoundTimer::new(301).urgency(), Urgency::Normal);
        assert_eq!(RoundTimer::new(300).urgency(), Urgency::Warning);
        assert_eq!(RoundTimer::new(60).urgency(), Urgency::Critical);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3725), "1:02:05");
    }
}
