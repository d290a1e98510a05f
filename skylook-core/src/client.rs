use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{CurrentConditions, Forecast, Query, Snapshot, Units},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// The forecast feed reports every 3 hours.
pub const SAMPLES_PER_DAY: usize = 8;

/// Connection settings for [`OpenWeatherClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Checked on every request so a missing key surfaces as an error, not at startup.
    pub api_key: Option<String>,
    pub units: Units,
    pub timeout: Duration,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn fetch_current(&self, query: &Query) -> Result<CurrentConditions, WeatherError>;

    /// One entry per day, see [`downsample_daily`].
    async fn fetch_forecast(&self, query: &Query) -> Result<Forecast, WeatherError>;
}

/// Keeps every [`SAMPLES_PER_DAY`]th sample, starting with the first one.
///
/// Indices 0, 8, 16, ... survive, so a series of `n` samples yields `ceil(n / 8)`.
pub fn downsample_daily<T>(series: Vec<T>) -> Vec<T> {
    series.into_iter().step_by(SAMPLES_PER_DAY).collect()
}

/// Current conditions first; the forecast is requested only if that succeeded.
pub async fn fetch_snapshot<C>(client: &C, query: &Query) -> Result<Snapshot, WeatherError>
where
    C: WeatherClient + ?Sized,
{
    let current = client.fetch_current(query).await?;
    let forecast = client.fetch_forecast(query).await?;

    debug!(city = query.city(), days = forecast.len(), "lookup complete");

    Ok(Snapshot { query: query.clone(), current, forecast })
}
