use reqwest::Client;
use std::sync::Arc;
use tokio::signal;

use lobby_kiosk::api::{router, AppState};
use lobby_kiosk::clock::SystemClock;
use lobby_kiosk::config::Config;
use lobby_kiosk::datasource::{ContentSource, MemoryContentSource, RestContentSource};
use lobby_kiosk::display::{DisplayDeps, DisplayHandle};
use lobby_kiosk::error::AppError;
use lobby_kiosk::notify::ChangeHub;
use lobby_kiosk::settings::FlagStore;
use lobby_kiosk::weather::{OpenMeteoWeather, WeatherSource};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Create HTTP client
    let client = Client::new();

    let source: Arc<dyn ContentSource> = match &config.content_api_url {
        Some(url) => {
            tracing::info!("Reading content from {}", url);
            Arc::new(RestContentSource::new(
                client.clone(),
                url.clone(),
                config.content_api_key.clone(),
            ))
        }
        None => match &config.seed_path {
            Some(path) => Arc::new(MemoryContentSource::from_seed_file(path).await?),
            None => {
                tracing::warn!("No content backend configured, starting with empty tables");
                Arc::new(MemoryContentSource::new())
            }
        },
    };

    let weather: Option<Arc<dyn WeatherSource>> = if config.weather_enabled {
        Some(Arc::new(OpenMeteoWeather::new(
            client,
            config.latitude,
            config.longitude,
        )))
    } else {
        tracing::info!("Weather polling disabled");
        None
    };

    let hub = ChangeHub::new();
    let flags = Arc::new(FlagStore::open(&config.settings_path).await?);

    tracing::info!("Mounting {} layout", config.layout);
    let display = Arc::new(
        DisplayHandle::mount(
            DisplayDeps {
                source,
                notifier: Arc::new(hub.clone()),
                weather,
                clock: Arc::new(SystemClock),
                flags: flags.clone(),
            },
            config.display_settings(),
        )
        .await?,
    );

    let app = router(AppState {
        display: display.clone(),
        hub,
        flags,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    display.unmount().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
