//! Weather lookup
//!
//! Pulls current conditions from open-meteo for the hotel's coordinates.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Icon shown next to the temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherIcon {
    Sun,
    CloudSun,
    CloudFog,
    CloudDrizzle,
    CloudRain,
    CloudSnow,
    CloudLightning,
}

/// Current conditions
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Weather {
    /// Degrees Celsius, rounded
    pub temperature: i32,
    pub condition: String,
    pub icon: WeatherIcon,
    /// Relative humidity, percent
    pub humidity: u8,
    /// km/h, rounded
    pub wind_speed: i32,
}

/// Source of current weather
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self) -> Result<Weather, AppError>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: u16,
}

/// open-meteo client
pub struct OpenMeteoWeather {
    client: Client,
    latitude: f64,
    longitude: f64,
}

impl OpenMeteoWeather {
    pub fn new(client: Client, latitude: f64, longitude: f64) -> Self {
        Self {
            client,
            latitude,
            longitude,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code",
            OPEN_METEO_URL, self.latitude, self.longitude
        )
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoWeather {
    async fn current(&self) -> Result<Weather, AppError> {
        let url = self.url();
        tracing::debug!("Fetching weather from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "open-meteo returned status: {}",
                response.status()
            )));
        }

        let forecast: ForecastResponse = response.json().await?;
        Ok(forecast.current.into())
    }
}

impl From<CurrentConditions> for Weather {
    fn from(current: CurrentConditions) -> Self {
        let (condition, icon) = describe(current.weather_code);
        Weather {
            temperature: current.temperature_2m.round() as i32,
            condition: condition.to_string(),
            icon,
            humidity: current.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
            wind_speed: current.wind_speed_10m.round() as i32,
        }
    }
}

/// Map a WMO weather code to a condition label and icon
pub fn describe(code: u16) -> (&'static str, WeatherIcon) {
    match code {
        0 => ("Clear", WeatherIcon::Sun),
        1..=3 => ("Partly Cloudy", WeatherIcon::CloudSun),
        45..=48 => ("Foggy", WeatherIcon::CloudFog),
        51..=57 => ("Drizzle", WeatherIcon::CloudDrizzle),
        61..=67 => ("Rainy", WeatherIcon::CloudRain),
        71..=77 => ("Snowy", WeatherIcon::CloudSnow),
        80..=82 => ("Showers", WeatherIcon::CloudRain),
        95..=99 => ("Stormy", WeatherIcon::CloudLightning),
        _ => ("Clear", WeatherIcon::Sun),
    }
}
