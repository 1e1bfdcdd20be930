use crate::records::MinuteOfDay;
use chrono::Local;
use std::time::{Duration, Instant};
use tracing::debug;

/// Source of the current minute of the day
pub trait TimeSource {
    fn minute_of_day(&self) -> MinuteOfDay;
}

/// Local wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn minute_of_day(&self) -> MinuteOfDay {
        MinuteOfDay::from_time(&Local::now())
    }
}

/// Always reports the same minute
#[derive(Debug, Clone, Copy)]
pub struct FixedTime(pub MinuteOfDay);

impl TimeSource for FixedTime {
    fn minute_of_day(&self) -> MinuteOfDay {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    Live,
    Manual,
}

impl ClockMode {
    pub fn label(&self) -> &'static str {
        match self {
            ClockMode::Live => "Live",
            ClockMode::Manual => "Manual",
        }
    }
}

/// The single owner of the selected query time
pub struct QueryClock {
    source: Box<dyn TimeSource>,
    mode: ClockMode,
    manual: MinuteOfDay,
    step_minutes: u16,
    refresh: Duration,
    live: MinuteOfDay,
    sampled_at: Option<Instant>,
}

impl QueryClock {
    pub fn new(
        source: Box<dyn TimeSource>,
        manual: MinuteOfDay,
        step_minutes: u16,
        refresh: Duration,
    ) -> Self {
        let live = source.minute_of_day();
        Self {
            source,
            mode: ClockMode::Live,
            manual,
            step_minutes: step_minutes.max(1),
            refresh,
            live,
            sampled_at: None,
        }
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn manual(&self) -> MinuteOfDay {
        self.manual
    }

    /// The minute incidents are evaluated at
    pub fn selected(&self) -> MinuteOfDay {
        match self.mode {
            ClockMode::Live => self.live,
            ClockMode::Manual => self.manual,
        }
    }

    /// Advance the clock to `now`. In live mode the source is re-sampled once
    /// per refresh interval. Returns true when the selected minute changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.mode != ClockMode::Live {
            return false;
        }
        let due = self
            .sampled_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.refresh);
        if !due {
            return false;
        }
        self.sample(now)
    }

    fn sample(&mut self, now: Instant) -> bool {
        let previous = self.live;
        self.live = self.source.minute_of_day();
        self.sampled_at = Some(now);
        if previous != self.live {
            debug!("live clock moved {previous} -> {}", self.live);
        }
        previous != self.live
    }

    /// Switch to live mode and sample the source immediately.
    /// Returns true when the selected minute changed.
    pub fn go_live(&mut self, now: Instant) -> bool {
        let before = self.selected();
        self.mode = ClockMode::Live;
        self.sample(now);
        before != self.selected()
    }

    /// Switch to manual mode at the current manual minute
    pub fn go_manual(&mut self) -> bool {
        let before = self.selected();
        self.mode = ClockMode::Manual;
        before != self.selected()
    }

    pub fn toggle(&mut self, now: Instant) -> bool {
        match self.mode {
            ClockMode::Live => self.go_manual(),
            ClockMode::Manual => self.go_live(now),
        }
    }

    /// Set the manual minute and switch to manual mode
    pub fn set_manual(&mut self, at: MinuteOfDay) -> bool {
        let before = self.selected();
        self.manual = at;
        self.mode = ClockMode::Manual;
        before != self.selected()
    }

    /// Move the manual minute by `steps` steps, clamped to the day
    pub fn step_manual(&mut self, steps: i32) -> bool {
        let delta = steps * i32::from(self.step_minutes);
        self.set_manual(self.manual.offset_clamped(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Time source whose minute the test can move
    struct SharedTime(Rc<Cell<u16>>);

    impl TimeSource for SharedTime {
        fn minute_of_day(&self) -> MinuteOfDay {
            MinuteOfDay::new(self.0.get()).unwrap()
        }
    }

    fn clock(start: u16) -> (QueryClock, Rc<Cell<u16>>) {
        let cell = Rc::new(Cell::new(start));
        let clock = QueryClock::new(
            Box::new(SharedTime(cell.clone())),
            MinuteOfDay::from_hm(9, 0).unwrap(),
            5,
            Duration::from_secs(60),
        );
        (clock, cell)
    }

    #[test]
    fn test_live_samples_once_per_interval() {
        let (mut clock, cell) = clock(600);
        let t0 = Instant::now();
        assert_eq!(clock.selected().get(), 600);

        cell.set(601);
        assert!(clock.tick(t0));
        assert_eq!(clock.selected().get(), 601);

        cell.set(602);
        assert!(!clock.tick(t0 + Duration::from_secs(30)));
        assert_eq!(clock.selected().get(), 601);

        assert!(clock.tick(t0 + Duration::from_secs(60)));
        assert_eq!(clock.selected().get(), 602);
    }

    #[test]
    fn test_manual_ignores_source() {
        let (mut clock, cell) = clock(600);
        assert!(clock.go_manual());
        assert_eq!(clock.selected().to_string(), "09:00");
        cell.set(700);
        assert!(!clock.tick(Instant::now()));
        assert_eq!(clock.selected().to_string(), "09:00");
    }

    #[test]
    fn test_step_manual_clamps() {
        let (mut clock, _) = clock(600);
        clock.set_manual(MinuteOfDay::from_hm(23, 57).unwrap());
        clock.step_manual(1);
        assert_eq!(clock.selected(), MinuteOfDay::LAST);
        clock.set_manual(MinuteOfDay::MIDNIGHT);
        assert!(!clock.step_manual(-1));
        clock.step_manual(3);
        assert_eq!(clock.selected().get(), 15);
        assert_eq!(clock.mode(), ClockMode::Manual);
    }

    #[test]
    fn test_go_live_resamples_immediately() {
        let (mut clock, cell) = clock(600);
        let t0 = Instant::now();
        clock.tick(t0);
        clock.go_manual();
        cell.set(1200);
        assert!(clock.toggle(t0 + Duration::from_secs(1)));
        assert_eq!(clock.mode(), ClockMode::Live);
        assert_eq!(clock.selected().get(), 1200);
    }

    #[test]
    fn test_fixed_time() {
        let at = MinuteOfDay::from_hm(19, 30).unwrap();
        assert_eq!(FixedTime(at).minute_of_day(), at);
    }
}
