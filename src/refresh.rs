//! Refresh coordinator
//!
//! Owns the top-level cadence of a mounted display: when the next data
//! refresh is due, and when the display resets itself. The reset is preceded
//! by a one-second countdown so the screen can show a warning badge.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use utoipa::ToSchema;

use crate::error::AppError;

/// Reference cadence values
pub const DATA_REFRESH_INTERVAL: Duration = Duration::from_secs(45);
pub const PAGE_RELOAD_INTERVAL: Duration = Duration::from_secs(600);
pub const RELOAD_WARNING_TIME: Duration = Duration::from_secs(10);
pub const WEATHER_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Cadences of a mounted display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub data_refresh: Duration,
    pub page_reload: Duration,
    pub reload_warning: Duration,
    pub weather_refresh: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            data_refresh: DATA_REFRESH_INTERVAL,
            page_reload: PAGE_RELOAD_INTERVAL,
            reload_warning: RELOAD_WARNING_TIME,
            weather_refresh: WEATHER_REFRESH_INTERVAL,
        }
    }
}

impl Timing {
    pub fn validate(&self) -> Result<(), AppError> {
        let intervals = [
            ("data refresh", self.data_refresh),
            ("page reload", self.page_reload),
            ("weather refresh", self.weather_refresh),
        ];
        for (name, interval) in intervals {
            if interval.is_zero() {
                return Err(AppError::Config(format!("{} interval must be non-zero", name)));
            }
        }
        if self.reload_warning >= self.page_reload {
            return Err(AppError::Config(format!(
                "reload warning ({}s) must be shorter than the reload interval ({}s)",
                self.reload_warning.as_secs(),
                self.page_reload.as_secs()
            )));
        }
        Ok(())
    }
}

/// Refresh bookkeeping exposed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RefreshState {
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_fetch_ok: bool,
    pub next_full_reset_at: DateTime<Utc>,
    /// Seconds left before the reset; only set inside the warning window
    pub countdown_remaining: Option<u64>,
}

/// Outcome of a clock tick for the reset timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTick {
    Quiet,
    Countdown(u64),
    Reset,
}

#[derive(Debug, Clone)]
pub struct RefreshCoordinator {
    timing: Timing,
    mounted_at: Instant,
    fired: bool,
    state: RefreshState,
}

impl RefreshCoordinator {
    pub fn mount(timing: Timing, mounted_at: Instant, now: DateTime<Utc>) -> Self {
        let reset_in = chrono::Duration::from_std(timing.page_reload)
            .unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            timing,
            mounted_at,
            fired: false,
            state: RefreshState {
                last_fetch_at: None,
                last_fetch_ok: false,
                next_full_reset_at: now + reset_in,
                countdown_remaining: None,
            },
        }
    }

    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    /// First data-refresh deadline after mount
    pub fn first_data_refresh(&self) -> Instant {
        self.mounted_at + self.timing.data_refresh
    }

    pub fn reset_deadline(&self) -> Instant {
        self.mounted_at + self.timing.page_reload
    }

    pub fn record_fetch(&mut self, now: DateTime<Utc>, ok: bool) {
        self.state.last_fetch_at = Some(now);
        self.state.last_fetch_ok = ok;
    }

    /// Advance the countdown. `Reset` is returned exactly once per mount.
    pub fn on_tick(&mut self, at: Instant) -> ResetTick {
        if self.fired {
            return ResetTick::Quiet;
        }

        let deadline = self.reset_deadline();
        if at >= deadline {
            self.fired = true;
            self.state.countdown_remaining = Some(0);
            return ResetTick::Reset;
        }

        let left = deadline - at;
        if left > self.timing.reload_warning {
            self.state.countdown_remaining = None;
            return ResetTick::Quiet;
        }

        let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
        self.state.countdown_remaining = Some(secs);
        ResetTick::Countdown(secs)
    }
}
