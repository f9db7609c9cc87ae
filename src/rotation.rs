//! Rotation scheduler
//!
//! One cursor per zone, advanced on the zone's own cadence. A cursor never
//! outlives the collection it indexes: any change in length restarts it at 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::layout::{Layout, RotationPolicy, Zone};

/// Cursor state as seen by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum CursorState {
    Idle,
    Cycling { index: usize },
}

/// Manual navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

/// Index into one zone's collection
#[derive(Debug, Clone)]
pub struct RotationCursor {
    index: usize,
    len: usize,
    page: usize,
    auto: bool,
    last_advanced_at: DateTime<Utc>,
}

impl RotationCursor {
    pub fn new(page: usize, now: DateTime<Utc>) -> Self {
        Self {
            index: 0,
            len: 0,
            page: page.max(1),
            auto: true,
            last_advanced_at: now,
        }
    }

    pub fn state(&self) -> CursorState {
        if self.is_empty() {
            CursorState::Idle
        } else {
            CursorState::Cycling { index: self.index }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the timer may still move this cursor
    pub fn is_auto(&self) -> bool {
        self.auto
    }

    pub fn last_advanced_at(&self) -> DateTime<Utc> {
        self.last_advanced_at
    }

    /// The collection was swapped; restart unless the length is unchanged
    pub fn resize(&mut self, len: usize, now: DateTime<Utc>) {
        if len != self.len {
            self.len = len;
            self.index = 0;
            self.last_advanced_at = now;
        }
    }

    /// Timer-driven advance. Returns whether the shown item changed.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        if !self.auto {
            return false;
        }
        self.step_forward(now)
    }

    /// Manual navigation; also stops auto-advance for the rest of the session
    pub fn navigate(&mut self, direction: Direction, now: DateTime<Utc>) -> bool {
        self.auto = false;
        match direction {
            Direction::Next => self.step_forward(now),
            Direction::Prev => self.step_back(now),
        }
    }

    /// Indices shown right now, wrapping to the start for paged zones
    pub fn visible(&self) -> Vec<usize> {
        let count = self.page.min(self.len);
        (0..count).map(|offset| (self.index + offset) % self.len).collect()
    }

    fn single_page(&self) -> bool {
        self.len <= self.page
    }

    fn step_forward(&mut self, now: DateTime<Utc>) -> bool {
        if self.single_page() {
            return false;
        }
        self.index = (self.index + self.page) % self.len;
        self.last_advanced_at = now;
        true
    }

    fn step_back(&mut self, now: DateTime<Utc>) -> bool {
        if self.single_page() {
            return false;
        }
        self.index = (self.index + self.len - self.page % self.len) % self.len;
        self.last_advanced_at = now;
        true
    }
}

/// A zone's cursor and its timer
#[derive(Debug, Clone)]
pub struct ZoneRotation {
    pub zone: Zone,
    pub cursor: RotationCursor,
    policy: RotationPolicy,
    next_due: Option<Instant>,
}

/// All cursors of a mounted display
#[derive(Debug, Clone)]
pub struct Rotations {
    zones: Vec<ZoneRotation>,
}

impl Rotations {
    pub fn new(layout: &Layout, started: Instant, now: DateTime<Utc>) -> Self {
        let zones = layout
            .zones()
            .iter()
            .map(|(zone, policy)| ZoneRotation {
                zone: *zone,
                cursor: RotationCursor::new(policy.page, now),
                policy: *policy,
                next_due: policy.period.map(|period| started + period),
            })
            .collect();
        Self { zones }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneRotation> {
        self.zones.iter()
    }

    pub fn get(&self, zone: Zone) -> Option<&RotationCursor> {
        self.zones.iter().find(|z| z.zone == zone).map(|z| &z.cursor)
    }

    /// Earliest pending auto-advance
    pub fn next_due(&self) -> Option<Instant> {
        self.zones.iter().filter_map(|z| z.next_due).min()
    }

    /// Fire every zone timer due at `at`. Returns the zones whose item changed.
    pub fn advance_due(&mut self, at: Instant, now: DateTime<Utc>) -> Vec<Zone> {
        let mut changed = Vec::new();
        for z in &mut self.zones {
            let (Some(due), Some(period)) = (z.next_due, z.policy.period) else {
                continue;
            };
            if due > at {
                continue;
            }
            let mut next = due + period;
            while next <= at {
                next += period;
            }
            z.next_due = Some(next);
            if z.cursor.advance(now) {
                tracing::debug!("Rotated {} to {:?}", z.zone, z.cursor.state());
                changed.push(z.zone);
            }
        }
        changed
    }

    /// Tell every cursor showing `zone` the new collection length
    pub fn resize(&mut self, zone: Zone, len: usize, now: DateTime<Utc>) {
        for z in self.zones.iter_mut().filter(|z| z.zone == zone) {
            z.cursor.resize(len, now);
        }
    }

    /// Manual navigation; suspends the zone's timer
    pub fn navigate(&mut self, zone: Zone, direction: Direction, now: DateTime<Utc>) -> Result<bool, AppError> {
        let z = self
            .zones
            .iter_mut()
            .find(|z| z.zone == zone)
            .ok_or_else(|| AppError::InvalidZone(zone.to_string()))?;
        z.next_due = None;
        Ok(z.cursor.navigate(direction, now))
    }
}
