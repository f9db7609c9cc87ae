//! HTTP surface of the kiosk server

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

use crate::clock::{DiningPeriod, TimeOfDay};
use crate::content::{Ad, ContentKind, Event, RestaurantSpecial, SpecialCategory};
use crate::display::{DisplayHandle, DisplayView, WifiInfo, ZoneView};
use crate::error::AppError;
use crate::featured::{Banner, DayPart, FeaturedView, Quote, QuoteCategory};
use crate::layout::Zone;
use crate::notify::ChangeHub;
use crate::refresh::RefreshState;
use crate::rotation::{CursorState, Direction};
use crate::settings::{FlagStore, SHOW_EVENTS};
use crate::store::VisibleItems;
use crate::weather::{Weather, WeatherIcon};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub display: Arc<DisplayHandle>,
    pub hub: ChangeHub,
    pub flags: Arc<FlagStore>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lobby Kiosk API",
        description = "Content scheduling for the hotel lobby display",
        version = "0.1.0"
    ),
    tags(
        (name = "Display", description = "Current display state and manual navigation"),
        (name = "Backend", description = "Change notifications from the content backend"),
        (name = "Settings", description = "Persistent display flags")
    ),
    paths(health, get_display, navigate_zone, notify_change, get_settings, put_setting),
    components(schemas(
        DisplayView, ZoneView, VisibleItems, CursorState, Direction, Zone, ContentKind,
        Event, Ad, RestaurantSpecial, SpecialCategory, RefreshState, Weather, WeatherIcon,
        WifiInfo, TimeOfDay, DiningPeriod, FeaturedView, Banner, DayPart, Quote, QuoteCategory,
        FlagValue, NotifyAccepted
    ))
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/display", get(get_display))
        .route("/display/zones/{zone}/{direction}", post(navigate_zone))
        .route("/notify/{kind}", post(notify_change))
        .route("/settings", get(get_settings))
        .route("/settings/{key}", put(put_setting))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/openapi.json", get(openapi_json))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health() -> &'static str {
    "ok"
}

/// Get OpenAPI JSON specification
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Current display frame
///
/// Visible items per zone, cursor positions, refresh status and weather.
#[utoipa::path(
    get,
    path = "/display",
    tag = "Display",
    responses(
        (status = 200, description = "Latest display view", body = DisplayView)
    )
)]
async fn get_display(State(state): State<AppState>) -> Json<DisplayView> {
    Json(state.display.view())
}

/// Step a zone manually
///
/// Moves the zone by one page. The zone stops auto-advancing until the next
/// full reset.
#[utoipa::path(
    post,
    path = "/display/zones/{zone}/{direction}",
    tag = "Display",
    params(
        ("zone" = Zone, Path, description = "Zone to move"),
        ("direction" = Direction, Path, description = "next or prev")
    ),
    responses(
        (status = 204, description = "Zone moved"),
        (status = 400, description = "Zone is not part of this layout"),
        (status = 503, description = "Display is not mounted")
    )
)]
async fn navigate_zone(
    State(state): State<AppState>,
    Path((zone, direction)): Path<(Zone, Direction)>,
) -> Result<StatusCode, AppError> {
    tracing::info!("Manual navigation: zone={}, direction={:?}", zone, direction);
    state.display.navigate(zone, direction).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotifyAccepted {
    /// Listeners that were told to re-fetch
    pub listeners: usize,
}

/// Backend change webhook
///
/// Tells every mounted display to re-fetch the given content kind.
#[utoipa::path(
    post,
    path = "/notify/{kind}",
    tag = "Backend",
    params(
        ("kind" = ContentKind, Path, description = "events, ads or specials")
    ),
    responses(
        (status = 202, description = "Re-fetch scheduled", body = NotifyAccepted)
    )
)]
async fn notify_change(
    State(state): State<AppState>,
    Path(kind): Path<ContentKind>,
) -> impl IntoResponse {
    let listeners = state.hub.publish(kind);
    (StatusCode::ACCEPTED, Json(NotifyAccepted { listeners }))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlagValue {
    pub value: bool,
}

async fn settings_snapshot(flags: &FlagStore) -> BTreeMap<String, bool> {
    let show_events = flags.show_events().await;
    let mut all = flags.all().await;
    all.entry(SHOW_EVENTS.to_string()).or_insert(show_events);
    all
}

/// All display flags, defaults included
#[utoipa::path(
    get,
    path = "/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Flag values", body = BTreeMap<String, bool>)
    )
)]
async fn get_settings(State(state): State<AppState>) -> Json<BTreeMap<String, bool>> {
    Json(settings_snapshot(&state.flags).await)
}

/// Set one display flag
#[utoipa::path(
    put,
    path = "/settings/{key}",
    tag = "Settings",
    params(
        ("key" = String, Path, description = "Flag name, e.g. show_events")
    ),
    request_body = FlagValue,
    responses(
        (status = 200, description = "Updated flag values", body = BTreeMap<String, bool>),
        (status = 500, description = "Flags could not be saved")
    )
)]
async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<FlagValue>,
) -> Result<Json<BTreeMap<String, bool>>, AppError> {
    state.flags.set(&key, body.value).await?;
    Ok(Json(settings_snapshot(&state.flags).await))
}
