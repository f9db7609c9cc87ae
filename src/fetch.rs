//! Fetch cycle: pull one content kind, decide what the store should hold
//!
//! The I/O half ([`FetchedBatch::fetch`]) runs off the display task. The
//! filter, sort and swap half runs on it, so readers never see a partial
//! collection.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::content::{prepare, Ad, Content, ContentKind, Event, RestaurantSpecial};
use crate::datasource::ContentSource;
use crate::error::AppError;

/// Raw result of one backend call, decoded into records
#[derive(Debug)]
pub enum FetchedBatch {
    Events(Result<Vec<Event>, AppError>),
    Ads(Result<Vec<Ad>, AppError>),
    Specials(Result<Vec<RestaurantSpecial>, AppError>),
}

impl FetchedBatch {
    pub async fn fetch(kind: ContentKind, source: &dyn ContentSource) -> Self {
        match kind {
            ContentKind::Events => FetchedBatch::Events(fetch_records(source).await),
            ContentKind::Ads => FetchedBatch::Ads(fetch_records(source).await),
            ContentKind::Specials => FetchedBatch::Specials(fetch_records(source).await),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            FetchedBatch::Events(_) => ContentKind::Events,
            FetchedBatch::Ads(_) => ContentKind::Ads,
            FetchedBatch::Specials(_) => ContentKind::Specials,
        }
    }
}

/// Query the source for `T` and decode every well-formed row
pub async fn fetch_records<T: Content>(source: &dyn ContentSource) -> Result<Vec<T>, AppError> {
    let rows = source.fetch_rows(&T::query()).await?;
    Ok(decode_rows(T::KIND, rows))
}

fn decode_rows<T: Content>(kind: ContentKind, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed {} row: {}", kind, e);
                None
            }
        })
        .collect()
}

/// What a fetch result means for the stored snapshot
#[derive(Debug, PartialEq)]
pub enum Resolution<T> {
    /// Swap in the freshly filtered collection (possibly empty)
    Replace(Vec<T>),
    /// Swap in the built-in fallback set
    Fallback(Vec<T>),
    /// Keep the previous snapshot
    Retain,
}

/// Apply the kind's fallback policy to a fetch result
pub fn resolve<T: Content>(result: Result<Vec<T>, AppError>, now: DateTime<Utc>) -> Resolution<T> {
    match result {
        Ok(rows) => {
            let shown = prepare(rows, now);
            if shown.is_empty() {
                if let Some(fallback) = T::fallback() {
                    tracing::warn!("No {} to display, using placeholders", T::KIND);
                    return Resolution::Fallback(fallback);
                }
            }
            Resolution::Replace(shown)
        }
        Err(e) => match T::fallback() {
            Some(fallback) => {
                tracing::warn!("Failed to fetch {}: {}, using placeholders", T::KIND, e);
                Resolution::Fallback(fallback)
            }
            None => {
                tracing::warn!("Failed to fetch {}: {}, keeping last snapshot", T::KIND, e);
                Resolution::Retain
            }
        },
    }
}

/// Per-kind in-flight markers used to coalesce triggers
#[derive(Debug, Default)]
pub struct InFlight([bool; 3]);

impl InFlight {
    /// Mark `kind` as pending. Returns false if it already was.
    pub fn try_begin(&mut self, kind: ContentKind) -> bool {
        let slot = &mut self.0[kind.index()];
        if *slot {
            return false;
        }
        *slot = true;
        true
    }

    pub fn finish(&mut self, kind: ContentKind) {
        self.0[kind.index()] = false;
    }

    #[cfg(test)]
    pub fn is_pending(&self, kind: ContentKind) -> bool {
        self.0[kind.index()]
    }
}
