//! Content store
//!
//! Holds the displayed snapshot of each collection. Only the fetch cycle
//! writes here; each write swaps a whole collection at once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::content::{Ad, Content, ContentKind, Event, RestaurantSpecial, SpecialCategory};
use crate::fetch::{resolve, FetchedBatch, Resolution};
use crate::layout::Zone;

/// Items a zone shows right now
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum VisibleItems {
    Events(Vec<Event>),
    Ads(Vec<Ad>),
    Specials(Vec<RestaurantSpecial>),
}

/// Summary of one applied fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub kind: ContentKind,
    pub ok: bool,
    pub swapped: bool,
}

#[derive(Debug, Default, Clone)]
pub struct ContentStore {
    events: Arc<Vec<Event>>,
    ads: Arc<Vec<Ad>>,
    specials: Arc<Vec<RestaurantSpecial>>,
    settled: [bool; 3],
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn events(&self) -> Arc<Vec<Event>> {
        self.events.clone()
    }

    #[cfg(test)]
    pub fn ads(&self) -> Arc<Vec<Ad>> {
        self.ads.clone()
    }

    /// Available specials of one category, in display order
    pub fn specials_in(&self, category: SpecialCategory) -> Vec<&RestaurantSpecial> {
        self.specials.iter().filter(|s| s.category == category).collect()
    }

    /// True once every kind has completed its first fetch cycle
    pub fn is_settled(&self) -> bool {
        self.settled.iter().all(|s| *s)
    }

    /// Length of the collection behind a zone
    pub fn zone_len(&self, zone: Zone) -> usize {
        match zone.category() {
            Some(category) => self.specials_in(category).len(),
            None => match zone.kind() {
                ContentKind::Events => self.events.len(),
                _ => self.ads.len(),
            },
        }
    }

    /// Items of a zone at the given positions
    pub fn zone_items(&self, zone: Zone, positions: &[usize]) -> VisibleItems {
        match zone.category() {
            Some(category) => {
                let subset = self.specials_in(category);
                VisibleItems::Specials(pick(&subset, positions))
            }
            None => match zone.kind() {
                ContentKind::Events => {
                    let all: Vec<&Event> = self.events.iter().collect();
                    VisibleItems::Events(pick(&all, positions))
                }
                _ => {
                    let all: Vec<&Ad> = self.ads.iter().collect();
                    VisibleItems::Ads(pick(&all, positions))
                }
            },
        }
    }

    /// Resolve a fetch result and swap the matching snapshot
    pub fn apply(&mut self, batch: FetchedBatch, now: DateTime<Utc>) -> Applied {
        let kind = batch.kind();
        self.settled[kind.index()] = true;
        let (ok, swapped) = match batch {
            FetchedBatch::Events(result) => swap(&mut self.events, result, now),
            FetchedBatch::Ads(result) => swap(&mut self.ads, result, now),
            FetchedBatch::Specials(result) => swap(&mut self.specials, result, now),
        };
        Applied { kind, ok, swapped }
    }
}

fn swap<T: Content>(
    slot: &mut Arc<Vec<T>>,
    result: Result<Vec<T>, crate::error::AppError>,
    now: DateTime<Utc>,
) -> (bool, bool) {
    let ok = result.is_ok();
    match resolve(result, now) {
        Resolution::Replace(items) | Resolution::Fallback(items) => {
            *slot = Arc::new(items);
            (ok, true)
        }
        Resolution::Retain => (ok, false),
    }
}

fn pick<T: Clone>(items: &[&T], positions: &[usize]) -> Vec<T> {
    positions
        .iter()
        .filter_map(|i| items.get(*i).map(|item| (*item).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures::{ad, event, special};
    use crate::content::placeholder_ads;
    use crate::error::AppError;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_failed_events_fetch_keeps_snapshot() {
        let mut store = ContentStore::new();
        let live = event("e1", now(), Duration::hours(-1), Duration::hours(1));
        store.apply(FetchedBatch::Events(Ok(vec![live.clone()])), now());

        let applied = store.apply(
            FetchedBatch::Events(Err(AppError::ExternalApi("down".into()))),
            now(),
        );
        assert_eq!(
            applied,
            Applied {
                kind: ContentKind::Events,
                ok: false,
                swapped: false
            }
        );
        assert_eq!(*store.events(), vec![live]);
    }

    #[test]
    fn test_failed_ads_fetch_uses_placeholders() {
        let mut store = ContentStore::new();
        store.apply(FetchedBatch::Ads(Ok(vec![ad("a", 1, true)])), now());
        store.apply(FetchedBatch::Ads(Err(AppError::ExternalApi("down".into()))), now());
        assert_eq!(*store.ads(), placeholder_ads());
    }

    #[test]
    fn test_expired_event_dropped_on_next_fetch() {
        let mut store = ContentStore::new();
        let meeting = event("e1", now(), Duration::hours(-1), Duration::minutes(30));
        store.apply(FetchedBatch::Events(Ok(vec![meeting.clone()])), now());
        assert_eq!(store.events().len(), 1);

        let later = now() + Duration::hours(1);
        store.apply(FetchedBatch::Events(Ok(vec![meeting])), later);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_settled_after_every_kind() {
        let mut store = ContentStore::new();
        assert!(!store.is_settled());
        store.apply(FetchedBatch::Events(Ok(vec![])), now());
        store.apply(FetchedBatch::Ads(Err(AppError::ExternalApi("down".into()))), now());
        assert!(!store.is_settled());
        store.apply(FetchedBatch::Specials(Ok(vec![])), now());
        assert!(store.is_settled());
    }

    #[test]
    fn test_zone_views_split_specials_by_category() {
        let mut store = ContentStore::new();
        store.apply(
            FetchedBatch::Specials(Ok(vec![
                special("o2", SpecialCategory::Offers, 2, true),
                special("d1", SpecialCategory::DishOfDay, 1, true),
                special("o1", SpecialCategory::Offers, 1, true),
            ])),
            now(),
        );

        assert_eq!(store.zone_len(Zone::Offers), 2);
        assert_eq!(store.zone_len(Zone::DishOfDay), 1);
        assert_eq!(store.zone_len(Zone::Specialties), 0);

        match store.zone_items(Zone::Offers, &[1, 0, 7]) {
            VisibleItems::Specials(items) => {
                let ids: Vec<_> = items.iter().map(|s| s.id.as_str()).collect();
                assert_eq!(ids, ["o2", "o1"]);
            }
            other => panic!("unexpected items: {other:?}"),
        }
    }
}
