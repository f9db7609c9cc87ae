//! Screen layouts
//!
//! A layout lists the rotating zones on screen and how each one cycles. Every
//! display variant runs the same scheduler; only this value differs.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use utoipa::ToSchema;

use crate::content::{ContentKind, SpecialCategory};
use crate::error::AppError;

/// A rotating region of the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Zone {
    Ads,
    Events,
    Offers,
    DishOfDay,
    Specialties,
}

impl Zone {
    pub fn kind(&self) -> ContentKind {
        match self {
            Zone::Ads => ContentKind::Ads,
            Zone::Events => ContentKind::Events,
            Zone::Offers | Zone::DishOfDay | Zone::Specialties => ContentKind::Specials,
        }
    }

    /// Specials category shown by this zone, if it is a specials zone
    pub fn category(&self) -> Option<SpecialCategory> {
        match self {
            Zone::Offers => Some(SpecialCategory::Offers),
            Zone::DishOfDay => Some(SpecialCategory::DishOfDay),
            Zone::Specialties => Some(SpecialCategory::Specialties),
            Zone::Ads | Zone::Events => None,
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Ads => write!(f, "ads"),
            Zone::Events => write!(f, "events"),
            Zone::Offers => write!(f, "offers"),
            Zone::DishOfDay => write!(f, "dish-of-day"),
            Zone::Specialties => write!(f, "specialties"),
        }
    }
}

/// How a zone's cursor moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Auto-advance cadence; `None` keeps the first page featured
    pub period: Option<Duration>,
    /// Items shown at once, and how far one advance moves
    pub page: usize,
}

impl RotationPolicy {
    pub fn every(secs: u64) -> Self {
        Self {
            period: Some(Duration::from_secs(secs)),
            page: 1,
        }
    }

    pub fn paged(secs: u64, page: usize) -> Self {
        Self {
            period: Some(Duration::from_secs(secs)),
            page: page.max(1),
        }
    }

    pub fn fixed() -> Self {
        Self {
            period: None,
            page: 1,
        }
    }
}

/// Built-in display variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Landscape,
    Portrait,
    Clean,
}

impl FromStr for LayoutKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "landscape" => Ok(LayoutKind::Landscape),
            "portrait" => Ok(LayoutKind::Portrait),
            "clean" => Ok(LayoutKind::Clean),
            other => Err(AppError::Config(format!("unknown layout: {}", other))),
        }
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutKind::Landscape => write!(f, "landscape"),
            LayoutKind::Portrait => write!(f, "portrait"),
            LayoutKind::Clean => write!(f, "clean"),
        }
    }
}

/// Default ad rotation period shared by every preset
pub const AD_ROTATION_SECS: u64 = 12;

/// Zones on screen with their rotation policies
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    zones: Vec<(Zone, RotationPolicy)>,
}

impl Layout {
    pub fn preset(kind: LayoutKind) -> Self {
        let ads = (Zone::Ads, RotationPolicy::every(AD_ROTATION_SECS));
        let zones = match kind {
            LayoutKind::Landscape => vec![
                ads,
                (Zone::Events, RotationPolicy::every(10)),
                (Zone::Specialties, RotationPolicy::paged(20, 4)),
            ],
            LayoutKind::Portrait => vec![
                ads,
                (Zone::Events, RotationPolicy::every(8)),
                (Zone::Specialties, RotationPolicy::every(10)),
                (Zone::DishOfDay, RotationPolicy::every(12)),
                (Zone::Offers, RotationPolicy::every(9)),
            ],
            LayoutKind::Clean => vec![
                ads,
                (Zone::Events, RotationPolicy::fixed()),
                (Zone::DishOfDay, RotationPolicy::fixed()),
                (Zone::Offers, RotationPolicy::fixed()),
                (Zone::Specialties, RotationPolicy::fixed()),
            ],
        };
        Self { zones }
    }

    /// Layout with an explicit zone list; a zone listed twice keeps its first policy
    pub fn custom(zones: Vec<(Zone, RotationPolicy)>) -> Self {
        let mut unique: Vec<(Zone, RotationPolicy)> = Vec::with_capacity(zones.len());
        for (zone, policy) in zones {
            if !unique.iter().any(|(z, _)| *z == zone) {
                unique.push((zone, policy));
            }
        }
        Self { zones: unique }
    }

    /// Override the ad zone's cadence
    pub fn with_ad_rotation(mut self, period: Duration) -> Self {
        for (zone, policy) in &mut self.zones {
            if *zone == Zone::Ads {
                policy.period = Some(period);
            }
        }
        self
    }

    pub fn zones(&self) -> &[(Zone, RotationPolicy)] {
        &self.zones
    }
}
