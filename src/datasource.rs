//! Data-access collaborators for content records
//!
//! A content source returns raw rows for a table, optionally filtered by one
//! equality predicate and ordered ascending by one field. Decoding, filtering
//! and display ordering happen in the fetch cycle.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

use crate::error::AppError;

/// Query against one backend table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: &'static str,
    pub filter: Option<(&'static str, Value)>,
    pub order_by: Option<&'static str>,
}

impl Query {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            filter: None,
            order_by: None,
        }
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.filter = Some((field, value.into()));
        self
    }

    pub fn order_by(mut self, field: &'static str) -> Self {
        self.order_by = Some(field);
        self
    }
}

/// A source of content rows
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch all rows matching the query. An empty table is `Ok(vec![])`.
    async fn fetch_rows(&self, query: &Query) -> Result<Vec<Value>, AppError>;
}

/// PostgREST-style backend (the hotel's hosted database)
pub struct RestContentSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestContentSource {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, query: &Query) -> String {
        let mut url = format!("{}/rest/v1/{}?select=*", self.base_url, query.table);
        if let Some((field, value)) = &query.filter {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            url.push_str(&format!("&{}=eq.{}", field, urlencoding::encode(&value)));
        }
        if let Some(field) = query.order_by {
            url.push_str(&format!("&order={}.asc", field));
        }
        url
    }
}

#[async_trait]
impl ContentSource for RestContentSource {
    async fn fetch_rows(&self, query: &Query) -> Result<Vec<Value>, AppError> {
        let url = self.url(query);
        tracing::debug!("Fetching {} from: {}", query.table, url);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "{} query returned status: {}",
                query.table,
                response.status()
            )));
        }

        let rows: Vec<Value> = response.json().await?;
        Ok(rows)
    }
}

/// In-process tables, used when no backend is configured
#[derive(Default)]
pub struct MemoryContentSource {
    tables: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tables from a JSON object of `{ "table": [rows...] }`
    pub async fn from_seed_file(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let tables: HashMap<String, Vec<Value>> = serde_json::from_str(&raw)?;
        tracing::info!(
            "Seeded {} content tables from {}",
            tables.len(),
            path.display()
        );
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Replace every row of a table
    pub async fn set_table(&self, table: &str, rows: Vec<Value>) {
        self.tables.write().await.insert(table.to_string(), rows);
    }
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn fetch_rows(&self, query: &Query) -> Result<Vec<Value>, AppError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| match &query.filter {
                        Some((field, value)) => row.get(*field) == Some(value),
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(field) = query.order_by {
            rows.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
        }

        Ok(rows)
    }
}

/// Ascending order for JSON scalars; missing values sort last
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rest_url_encodes_filter_and_order() {
        let source = RestContentSource::new(Client::new(), "https://db.example.com/", None);
        let query = Query::table("ads").eq("is_active", true).order_by("display_order");
        assert_eq!(
            source.url(&query),
            "https://db.example.com/rest/v1/ads?select=*&is_active=eq.true&order=display_order.asc"
        );

        let query = Query::table("restaurant_specials").eq("category", "dish of day");
        assert_eq!(
            source.url(&query),
            "https://db.example.com/rest/v1/restaurant_specials?select=*&category=eq.dish%20of%20day"
        );
    }

    #[tokio::test]
    async fn test_memory_source_filters_and_orders() {
        let source = MemoryContentSource::new();
        source
            .set_table(
                "ads",
                vec![
                    json!({"id": "b", "is_active": true, "display_order": 2}),
                    json!({"id": "x", "is_active": false, "display_order": 0}),
                    json!({"id": "a", "is_active": true, "display_order": 1}),
                    json!({"id": "c", "is_active": true}),
                ],
            )
            .await;

        let query = Query::table("ads").eq("is_active", true).order_by("display_order");
        let rows = source.fetch_rows(&query).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_memory_source_unknown_table_is_empty() {
        let source = MemoryContentSource::new();
        let rows = source.fetch_rows(&Query::table("events")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_memory_source_from_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{"events": [{"id": "e1"}], "ads": [{"id": "a1"}, {"id": "a2"}]}"#,
        )
        .unwrap();

        let source = MemoryContentSource::from_seed_file(&path).await.unwrap();
        let ads = source.fetch_rows(&Query::table("ads")).await.unwrap();
        assert_eq!(ads.len(), 2);
    }
}
