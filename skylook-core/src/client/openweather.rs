use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    config::validate_api_key,
    error::WeatherError,
    model::{CurrentConditions, Forecast, ForecastEntry, Query, Units},
};

use super::{ClientSettings, WeatherClient, downsample_daily};

const CURRENT_FALLBACK: &str = "Failed to fetch weather data.";
const FORECAST_FALLBACK: &str = "Failed to fetch forecast data.";

/// Client for the OpenWeather 2.5 `weather` and `forecast` endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    settings: ClientSettings,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(settings: ClientSettings) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| WeatherError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { settings, http })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), name)
    }

    /// Sends one GET and classifies the outcome; `fallback` is used when the
    /// service reports a failure without a message.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &Query,
        fallback: &str,
    ) -> Result<(T, Units), WeatherError> {
        let api_key = validate_api_key(self.settings.api_key.as_deref())
            .map_err(WeatherError::Configuration)?;
        let units = query.units.unwrap_or(self.settings.units);
        let url = self.endpoint(endpoint);

        debug!(%url, city = query.city(), %units, "sending request");

        let res = self
            .http
            .get(&url)
            .query(&[("q", query.city()), ("appid", api_key), ("units", units.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        classify(status, &body, fallback)?;

        let parsed = serde_json::from_str(&body).map_err(|e| {
            warn!(%url, error = %e, body = %truncate_body(&body), "undecodable response");
            WeatherError::MalformedResponse(e.to_string())
        })?;

        Ok((parsed, units))
    }
}

/// Maps an HTTP status and body onto the error taxonomy. `Ok` means the body
/// should be decoded as a regular payload.
fn classify(status: StatusCode, body: &str, fallback: &str) -> Result<(), WeatherError> {
    if status == StatusCode::NOT_FOUND {
        return Err(WeatherError::CityNotFound);
    }

    // OpenWeather repeats the outcome in the body as `cod`, sometimes as a
    // string, sometimes as a number.
    let envelope = serde_json::from_str::<OwEnvelope>(body).ok();

    if let Some(code) = envelope.as_ref().and_then(OwEnvelope::code) {
        if code == 404 {
            return Err(WeatherError::CityNotFound);
        }
        if code != 200 {
            return Err(api_error(envelope.as_ref(), fallback));
        }
    }

    if !status.is_success() {
        debug!(%status, body = %truncate_body(body), "service reported failure");
        return Err(api_error(envelope.as_ref(), fallback));
    }

    Ok(())
}

fn api_error(envelope: Option<&OwEnvelope>, fallback: &str) -> WeatherError {
    let message = envelope
        .and_then(|e| e.message.as_ref())
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(fallback);

    WeatherError::Api(message.to_string())
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    #[serde(default)]
    cod: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

impl OwEnvelope {
    fn code(&self) -> Option<u16> {
        match self.cod.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize, Default)]
struct OwWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

/// (condition, icon, description) of the first `weather` element.
fn primary_condition(weather: &[OwWeather]) -> (String, String, String) {
    weather
        .first()
        .map(|w| (w.main.clone(), w.icon.clone(), w.description.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new(), String::new()))
}

impl OwCurrentResponse {
    fn into_conditions(self, units: Units) -> CurrentConditions {
        let (condition, icon, description) = primary_condition(&self.weather);

        CurrentConditions {
            location_name: self.name,
            country: self.sys.country,
            temperature: self.main.temp,
            feels_like: self.main.feels_like.unwrap_or(self.main.temp),
            humidity_pct: self.main.humidity,
            wind_speed: self.wind.speed,
            pressure_hpa: self.main.pressure,
            condition,
            icon,
            description,
            observation_time: unix_to_utc(self.dt).unwrap_or_else(Utc::now),
            units,
        }
    }
}

impl OwForecastEntry {
    fn into_entry(self) -> ForecastEntry {
        let (condition, icon, description) = primary_condition(&self.weather);

        ForecastEntry {
            timestamp: unix_to_utc(self.dt).unwrap_or_else(Utc::now),
            temperature: self.main.temp,
            condition,
            icon,
            description,
        }
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    #[instrument(skip(self, query), fields(city = query.city()))]
    async fn fetch_current(&self, query: &Query) -> Result<CurrentConditions, WeatherError> {
        let (parsed, units): (OwCurrentResponse, Units) =
            self.get_json("weather", query, CURRENT_FALLBACK).await?;

        Ok(parsed.into_conditions(units))
    }

    #[instrument(skip(self, query), fields(city = query.city()))]
    async fn fetch_forecast(&self, query: &Query) -> Result<Forecast, WeatherError> {
        let (parsed, _units): (OwForecastResponse, Units) =
            self.get_json("forecast", query, FORECAST_FALLBACK).await?;

        let samples = parsed.list.len();
        let entries: Vec<ForecastEntry> =
            downsample_daily(parsed.list).into_iter().map(OwForecastEntry::into_entry).collect();

        debug!(samples, days = entries.len(), "forecast downsampled");

        Ok(Forecast { entries })
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
