//! Wall-clock source for time-window decisions
//!
//! Consumers poll a [`Clock`] whenever they need "now". Nothing here depends on
//! the one-second display tick, so filtering can run at any granularity.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock anchored at a fixed instant and advanced by the tokio clock.
///
/// Under `tokio::time::pause` this clock stands still and jumps together with
/// the runtime's timers.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    wall: DateTime<Utc>,
    anchor: tokio::time::Instant,
}

impl AnchoredClock {
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            wall,
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.anchor.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.wall + elapsed
    }
}

/// Part of the day, drives the greeting and theme on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

/// Restaurant service period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DiningPeriod {
    Breakfast,
    Lunch,
    Dinner,
    LateNight,
}

impl DiningPeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=10 => DiningPeriod::Breakfast,
            11..=15 => DiningPeriod::Lunch,
            16..=22 => DiningPeriod::Dinner,
            _ => DiningPeriod::LateNight,
        }
    }
}

/// Hour of day at the hotel
pub fn local_hour(now: DateTime<Utc>, offset: FixedOffset) -> u32 {
    now.with_timezone(&offset).hour()
}
