//! World clock: tick counting, action costs, and calendar labels.
//!
//! The tick counter is the single source of truth for world time. Day,
//! hour, period, and season are derived from it with fixed modular
//! arithmetic and are never stored independently.
//!
//! # Calendar
//!
//! - 144 ticks per day, 6 ticks per hour (one tick is ten minutes).
//! - Periods: morning 6-11, afternoon 12-17, evening 18-23, late night 0-5.
//! - A 120-day year of four 30-day seasons, starting in spring on day 1.

use dao_types::{DayPeriod, IntentKind, Season};

/// Ticks in one in-game day.
pub const TICKS_PER_DAY: u64 = 144;

/// Ticks in one in-game hour.
pub const TICKS_PER_HOUR: u64 = 6;

/// Days in one season.
pub const DAYS_PER_SEASON: u64 = 30;

/// Days in one seasonal cycle.
pub const DAYS_PER_YEAR: u64 = 120;

/// Tick cost of an action whose type is not recognised.
pub const DEFAULT_TICK_COST: u64 = 1;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Summary of one clock advance, handed to the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAdvance {
    /// Ticks consumed by the action.
    pub ticks_passed: u64,
    /// Tick after the advance.
    pub tick: u64,
    /// Human-readable description, e.g. `Day 2, Morning (Spring)`.
    pub label: String,
}

/// Single-writer world clock owned by the turn controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeEngine {
    tick: u64,
}

impl TimeEngine {
    /// A clock starting at tick 0 (day 1, midnight).
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// A clock resumed at a saved tick.
    pub const fn at(tick: u64) -> Self {
        Self { tick }
    }

    /// Current tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Overwrite the tick (used when loading a save).
    pub const fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Advance by `ticks`. Returns the new tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self, ticks: u64) -> Result<u64, ClockError> {
        self.tick = self
            .tick
            .checked_add(ticks)
            .ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Advance by the cost of an action and describe the result.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] on counter overflow.
    pub fn advance_for(&mut self, kind: IntentKind) -> Result<TimeAdvance, ClockError> {
        let ticks_passed = tick_cost(kind);
        let tick = self.advance(ticks_passed)?;
        Ok(TimeAdvance {
            ticks_passed,
            tick,
            label: self.describe(),
        })
    }

    /// Day number, starting at 1.
    pub const fn day(&self) -> u64 {
        (self.tick / TICKS_PER_DAY).saturating_add(1)
    }

    /// Hour of day in `0..24`.
    pub const fn hour(&self) -> u64 {
        (self.tick % TICKS_PER_DAY) / TICKS_PER_HOUR
    }

    /// Coarse period of the day.
    pub const fn period(&self) -> DayPeriod {
        match self.hour() {
            6..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            18..=23 => DayPeriod::Evening,
            _ => DayPeriod::LateNight,
        }
    }

    /// Season of the current day.
    pub const fn season(&self) -> Season {
        let day_of_year = self.day().saturating_sub(1) % DAYS_PER_YEAR;
        match day_of_year / DAYS_PER_SEASON {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    /// Human-readable time label.
    pub fn describe(&self) -> String {
        format!(
            "Day {}, {} ({})",
            self.day(),
            self.period().label(),
            self.season().label()
        )
    }
}

/// Ticks consumed by an action of the given kind.
pub const fn tick_cost(kind: IntentKind) -> u64 {
    match kind {
        IntentKind::Move => 3,
        IntentKind::Cultivate => 10,
        IntentKind::Rest => 5,
        IntentKind::Attack | IntentKind::SkillUse | IntentKind::Trade => 2,
        IntentKind::Talk | IntentKind::Inspect | IntentKind::UseItem | IntentKind::Unknown => {
            DEFAULT_TICK_COST
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn costs_per_action() {
        assert_eq!(tick_cost(IntentKind::Move), 3);
        assert_eq!(tick_cost(IntentKind::Cultivate), 10);
        assert_eq!(tick_cost(IntentKind::Talk), 1);
        assert_eq!(tick_cost(IntentKind::Inspect), 1);
        assert_eq!(tick_cost(IntentKind::UseItem), 1);
        assert_eq!(tick_cost(IntentKind::Rest), 5);
        assert_eq!(tick_cost(IntentKind::Attack), 2);
        assert_eq!(tick_cost(IntentKind::SkillUse), 2);
        assert_eq!(tick_cost(IntentKind::Trade), 2);
    }

    #[test]
    fn unknown_labels_default_to_one_tick() {
        assert_eq!(tick_cost(IntentKind::parse_label("MOVE")), 3);
        assert_eq!(tick_cost(IntentKind::parse_label("DANCE")), 1);
        assert_eq!(tick_cost(IntentKind::parse_label("")), 1);
    }

    #[test]
    fn day_and_hour_derivation() {
        let clock = TimeEngine::at(0);
        assert_eq!(clock.day(), 1);
        assert_eq!(clock.hour(), 0);
        assert_eq!(clock.period(), DayPeriod::LateNight);

        let clock = TimeEngine::at(36);
        assert_eq!(clock.hour(), 6);
        assert_eq!(clock.period(), DayPeriod::Morning);

        let clock = TimeEngine::at(TICKS_PER_DAY + 72);
        assert_eq!(clock.day(), 2);
        assert_eq!(clock.hour(), 12);
        assert_eq!(clock.period(), DayPeriod::Afternoon);

        assert_eq!(TimeEngine::at(18 * TICKS_PER_HOUR).period(), DayPeriod::Evening);
        assert_eq!(TimeEngine::at(TICKS_PER_DAY - 1).hour(), 23);
    }

    #[test]
    fn seasons_cycle_every_120_days() {
        let on_day = |day: u64| TimeEngine::at((day - 1) * TICKS_PER_DAY).season();
        assert_eq!(on_day(1), Season::Spring);
        assert_eq!(on_day(30), Season::Spring);
        assert_eq!(on_day(31), Season::Summer);
        assert_eq!(on_day(61), Season::Autumn);
        assert_eq!(on_day(91), Season::Winter);
        assert_eq!(on_day(120), Season::Winter);
        assert_eq!(on_day(121), Season::Spring);
    }

    #[test]
    fn advance_for_reports_cost_and_label() {
        let mut clock = TimeEngine::new();
        let advance = clock.advance_for(IntentKind::Cultivate);
        assert!(advance.is_ok());
        let advance = advance.unwrap_or(TimeAdvance {
            ticks_passed: 0,
            tick: 0,
            label: String::new(),
        });
        assert_eq!(advance.ticks_passed, 10);
        assert_eq!(advance.tick, 10);
        assert_eq!(advance.label, "Day 1, Late Night (Spring)");
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = TimeEngine::at(u64::MAX - 1);
        assert!(clock.advance(1).is_ok());
        assert!(matches!(clock.advance(1), Err(ClockError::TickOverflow)));
        assert_eq!(clock.tick(), u64::MAX);
    }
}
