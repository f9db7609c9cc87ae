use chrono::FixedOffset;
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::info;

use crate::display::{DisplaySettings, WifiInfo};
use crate::error::AppError;
use crate::layout::{Layout, LayoutKind};
use crate::refresh::Timing;

/// Process configuration, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Base URL of the PostgREST-style backend; unset means in-memory content
    pub content_api_url: Option<String>,
    pub content_api_key: Option<String>,
    /// JSON file seeding the in-memory source
    pub seed_path: Option<PathBuf>,
    pub settings_path: PathBuf,
    pub layout: LayoutKind,
    pub ad_rotation: Option<Duration>,
    pub timing: Timing,
    pub weather_enabled: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset: FixedOffset,
    pub wifi: Option<WifiInfo>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let timing = Timing {
            data_refresh: secs(&lookup, "KIOSK_DATA_REFRESH_SECS", "45")?,
            page_reload: secs(&lookup, "KIOSK_PAGE_RELOAD_SECS", "600")?,
            reload_warning: secs(&lookup, "KIOSK_RELOAD_WARNING_SECS", "10")?,
            weather_refresh: secs(&lookup, "KIOSK_WEATHER_REFRESH_SECS", "1800")?,
        };
        timing.validate()?;

        let ad_rotation = optional(&lookup, "KIOSK_AD_ROTATION_SECS")
            .map(|raw| parse::<u64>("KIOSK_AD_ROTATION_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);
        if ad_rotation.is_some_and(|period| period.is_zero()) {
            return Err(AppError::Config("KIOSK_AD_ROTATION_SECS must be non-zero".into()));
        }

        let weather: String = try_load(&lookup, "KIOSK_WEATHER", "on")?;
        let weather_enabled = match weather.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" => true,
            "off" | "false" | "0" => false,
            other => {
                return Err(AppError::Config(format!("Invalid KIOSK_WEATHER value: {other}")))
            }
        };

        let offset_minutes: i32 = try_load(&lookup, "KIOSK_UTC_OFFSET_MINUTES", "120")?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            AppError::Config(format!("KIOSK_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))
        })?;

        let wifi = optional(&lookup, "KIOSK_WIFI_SSID").map(|ssid| WifiInfo {
            ssid,
            password: optional(&lookup, "KIOSK_WIFI_PASSWORD"),
        });

        Ok(Self {
            port: try_load(&lookup, "PORT", "3000")?,
            content_api_url: optional(&lookup, "CONTENT_API_URL"),
            content_api_key: optional(&lookup, "CONTENT_API_KEY"),
            seed_path: optional(&lookup, "KIOSK_SEED_PATH").map(PathBuf::from),
            settings_path: try_load(&lookup, "KIOSK_SETTINGS_PATH", "kiosk-settings.json")?,
            layout: try_load(&lookup, "KIOSK_LAYOUT", "landscape")?,
            ad_rotation,
            timing,
            weather_enabled,
            latitude: try_load(&lookup, "KIOSK_LATITUDE", "31.7683")?,
            longitude: try_load(&lookup, "KIOSK_LONGITUDE", "35.2137")?,
            utc_offset,
            wifi,
        })
    }

    pub fn display_settings(&self) -> DisplaySettings {
        let mut layout = Layout::preset(self.layout);
        if let Some(period) = self.ad_rotation {
            layout = layout.with_ad_rotation(period);
        }
        DisplaySettings {
            layout,
            timing: self.timing,
            utc_offset: self.utc_offset,
            wifi: self.wifi.clone(),
        }
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, AppError>
where
    T::Err: Display,
{
    let raw = optional(lookup, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse(key, &raw)
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, AppError>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {key} value: {e}")))
}

fn secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<Duration, AppError> {
    try_load::<u64>(lookup, key, default).map(Duration::from_secs)
}
