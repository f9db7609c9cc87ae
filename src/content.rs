//! Content records shown on the lobby display
//!
//! Each record type knows which backend table it lives in, which rows are
//! eligible for display at a given moment, and how displayed rows are ordered.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::datasource::Query;

/// The three content collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Events,
    Ads,
    Specials,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Events, ContentKind::Ads, ContentKind::Specials];

    /// Backend table holding this kind
    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Events => "events",
            ContentKind::Ads => "ads",
            ContentKind::Specials => "restaurant_specials",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            ContentKind::Events => 0,
            ContentKind::Ads => 1,
            ContentKind::Specials => 2,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Events => write!(f, "events"),
            ContentKind::Ads => write!(f, "ads"),
            ContentKind::Specials => write!(f, "specials"),
        }
    }
}

/// A record type the display can fetch, filter and sort
pub trait Content: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    const KIND: ContentKind;

    /// Query sent to the data-access collaborator
    fn query() -> Query;

    /// Whether this record may be shown at `now`
    fn is_displayable(&self, now: DateTime<Utc>) -> bool;

    /// Stable sort into display order
    fn sort(items: &mut [Self]);

    /// Built-in set shown instead of an empty or failed fetch
    fn fallback() -> Option<Vec<Self>> {
        None
    }
}

/// Filter and sort a raw collection into its displayed form
pub fn prepare<T: Content>(rows: Vec<T>, now: DateTime<Utc>) -> Vec<T> {
    let mut shown: Vec<T> = rows.into_iter().filter(|r| r.is_displayable(now)).collect();
    T::sort(&mut shown);
    shown
}

/// A hotel event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl Event {
    /// Active and inside its live window (inclusive on both ends)
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_time <= now && now <= self.end_time
    }
}

impl Content for Event {
    const KIND: ContentKind = ContentKind::Events;

    fn query() -> Query {
        Query::table(Self::KIND.table())
            .eq("is_active", true)
            .order_by("start_time")
    }

    fn is_displayable(&self, now: DateTime<Utc>) -> bool {
        self.is_live(now)
    }

    fn sort(items: &mut [Self]) {
        items.sort_by_key(|e| e.start_time);
    }
}

/// An advertisement slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Ad {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: String,
    /// Advisory dwell time; rotation uses the layout's fixed ad period
    #[serde(alias = "duration", default)]
    pub duration_seconds: u32,
    pub is_active: bool,
    pub display_order: i32,
}

impl Content for Ad {
    const KIND: ContentKind = ContentKind::Ads;

    fn query() -> Query {
        Query::table(Self::KIND.table())
            .eq("is_active", true)
            .order_by("display_order")
    }

    fn is_displayable(&self, _now: DateTime<Utc>) -> bool {
        self.is_active
    }

    fn sort(items: &mut [Self]) {
        items.sort_by_key(|a| a.display_order);
    }

    fn fallback() -> Option<Vec<Self>> {
        Some(placeholder_ads())
    }
}

/// Restaurant special category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum SpecialCategory {
    #[serde(rename = "offers", alias = "offer", alias = "soup")]
    Offers,
    #[serde(rename = "dish-of-day", alias = "dish")]
    DishOfDay,
    #[serde(rename = "specialties", alias = "special")]
    Specialties,
}

/// A restaurant special
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RestaurantSpecial {
    pub id: String,
    pub category: SpecialCategory,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub price: Option<String>,
    pub is_available: bool,
    pub display_order: i32,
}

impl Content for RestaurantSpecial {
    const KIND: ContentKind = ContentKind::Specials;

    fn query() -> Query {
        Query::table(Self::KIND.table())
            .eq("is_available", true)
            .order_by("display_order")
    }

    fn is_displayable(&self, _now: DateTime<Utc>) -> bool {
        self.is_available
    }

    fn sort(items: &mut [Self]) {
        items.sort_by_key(|s| s.display_order);
    }
}

/// Ads shown when the backend is unreachable or has nothing active
pub fn placeholder_ads() -> Vec<Ad> {
    vec![
        Ad {
            id: "noodles-festival".to_string(),
            title: "Noodles Festival".to_string(),
            description: Some(
                "Authentic Asian noodle dishes from around the world. Fresh ingredients, bold flavors, unforgettable experience."
                    .to_string(),
            ),
            image_url: "https://images.unsplash.com/photo-1555126634-323283e090fa?auto=format&fit=crop&w=1200&q=80".to_string(),
            duration_seconds: 8,
            is_active: true,
            display_order: 1,
        },
        Ad {
            id: "jerusalem-experience".to_string(),
            title: "Discover Jerusalem".to_string(),
            description: Some(
                "Explore the ancient streets of the Old City. Private guided tours available at the concierge desk."
                    .to_string(),
            ),
            image_url: "https://images.unsplash.com/photo-1549813069-f95e44d7f498?auto=format&fit=crop&w=1200&q=80".to_string(),
            duration_seconds: 6,
            is_active: true,
            display_order: 2,
        },
        Ad {
            id: "spa-wellness".to_string(),
            title: "Spa & Wellness".to_string(),
            description: Some(
                "Relax and rejuvenate at our luxury spa. Book your treatment today for the ultimate wellness experience."
                    .to_string(),
            ),
            image_url: "https://images.unsplash.com/photo-1540555700478-4be289fbecef?auto=format&fit=crop&w=1200&q=80".to_string(),
            duration_seconds: 7,
            is_active: true,
            display_order: 3,
        },
    ]
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    pub fn event(id: &str, now: DateTime<Utc>, start: Duration, end: Duration) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {id}"),
            description: String::new(),
            start_time: now + start,
            end_time: now + end,
            location: "Lobby".to_string(),
            image_url: None,
            is_active: true,
        }
    }

    pub fn ad(id: &str, order: i32, active: bool) -> Ad {
        Ad {
            id: id.to_string(),
            title: format!("Ad {id}"),
            description: None,
            image_url: format!("https://example.com/{id}.jpg"),
            duration_seconds: 10,
            is_active: active,
            display_order: order,
        }
    }

    pub fn special(id: &str, category: SpecialCategory, order: i32, available: bool) -> RestaurantSpecial {
        RestaurantSpecial {
            id: id.to_string(),
            category,
            title: format!("Special {id}"),
            description: String::new(),
            image_url: String::new(),
            price: None,
            is_available: available,
            display_order: order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_event_live_window() {
        let now = noon();
        let live = event("live", now, Duration::hours(-1), Duration::hours(1));
        let ended = event("ended", now, Duration::hours(-2), Duration::minutes(-10));
        let upcoming = event("upcoming", now, Duration::hours(1), Duration::hours(2));
        let mut inactive = live.clone();
        inactive.is_active = false;

        let shown = prepare(vec![ended, live.clone(), upcoming, inactive], now);
        assert_eq!(shown, vec![live]);
    }

    #[test]
    fn test_event_window_is_inclusive() {
        let now = noon();
        let starts_now = event("a", now, Duration::zero(), Duration::hours(1));
        let ends_now = event("b", now, Duration::hours(-1), Duration::zero());
        assert!(starts_now.is_live(now));
        assert!(ends_now.is_live(now));
        assert!(!ends_now.is_live(now + Duration::seconds(1)));
    }

    #[test]
    fn test_events_sorted_by_start_time() {
        let now = noon();
        let later = event("later", now, Duration::minutes(-10), Duration::hours(1));
        let earlier = event("earlier", now, Duration::hours(-3), Duration::hours(1));
        let shown = prepare(vec![later, earlier], now);
        let ids: Vec<_> = shown.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["earlier", "later"]);
    }

    #[test]
    fn test_ads_ordering_is_stable_on_ties() {
        let shown = prepare(
            vec![ad("c", 2, true), ad("a", 1, true), ad("x", 1, false), ad("b", 1, true)],
            noon(),
        );
        let ids: Vec<_> = shown.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_specials_drop_unavailable() {
        let shown = prepare(
            vec![
                special("s2", SpecialCategory::Offers, 2, true),
                special("s1", SpecialCategory::DishOfDay, 1, false),
                special("s0", SpecialCategory::Specialties, 0, true),
            ],
            noon(),
        );
        let ids: Vec<_> = shown.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["s0", "s2"]);
    }

    #[test]
    fn test_special_category_accepts_source_spellings() {
        let parse = |s: &str| serde_json::from_value::<SpecialCategory>(serde_json::json!(s)).unwrap();
        assert_eq!(parse("dish"), SpecialCategory::DishOfDay);
        assert_eq!(parse("dish-of-day"), SpecialCategory::DishOfDay);
        assert_eq!(parse("special"), SpecialCategory::Specialties);
        assert_eq!(parse("soup"), SpecialCategory::Offers);
        assert_eq!(
            serde_json::to_value(SpecialCategory::DishOfDay).unwrap(),
            serde_json::json!("dish-of-day")
        );
    }

    #[test]
    fn test_ad_accepts_duration_alias() {
        let ad: Ad = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "title": "Brunch",
            "image_url": "https://example.com/brunch.jpg",
            "duration": 9,
            "is_active": true,
            "display_order": 4
        }))
        .unwrap();
        assert_eq!(ad.duration_seconds, 9);
        assert_eq!(ad.description, None);
    }

    #[test]
    fn test_placeholder_ads_fixed_order() {
        let ads = placeholder_ads();
        let orders: Vec<_> = ads.iter().map(|a| a.display_order).collect();
        assert_eq!(orders, [1, 2, 3]);
        assert_eq!(ads[0].title, "Noodles Festival");
        assert_eq!(Ad::fallback().unwrap(), ads);
        assert!(Event::fallback().is_none());
    }
}
