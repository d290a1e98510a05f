use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::WeatherError;

/// Unit system requested from the weather service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    pub fn to_celsius(&self, temperature: f64) -> f64 {
        match self {
            Units::Metric => temperature,
            Units::Imperial => (temperature - 32.0) * 5.0 / 9.0,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(Units::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// A validated city lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    city: String,
    pub units: Option<Units>,
}

impl Query {
    /// Trims the city name and rejects it if nothing is left.
    pub fn new(city: &str) -> Result<Self, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::empty_city());
        }

        Ok(Self { city: city.to_string(), units: None })
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = Some(units);
        self
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub country: Option<String>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub pressure_hpa: f64,
    /// Primary condition group, e.g. "Clouds" or "Rain".
    pub condition: String,
    pub icon: String,
    pub description: String,
    pub observation_time: DateTime<Utc>,
    pub units: Units,
}

impl CurrentConditions {
    /// "London, GB", or just the name when the country is unknown.
    pub fn display_location(&self) -> String {
        match &self.country {
            Some(country) if !country.is_empty() => format!("{}, {}", self.location_name, country),
            _ => self.location_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
    pub description: String,
}

/// One entry per day, oldest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForecastEntry> {
        self.entries.iter()
    }
}

/// Current conditions and forecast fetched for the same query.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub query: Query,
    pub current: CurrentConditions,
    pub forecast: Forecast,
}

/// Image URL for an OpenWeather icon id such as `"10d"`.
pub fn icon_url(icon: &str, large: bool) -> String {
    if large {
        format!("http://openweathermap.org/img/wn/{icon}@2x.png")
    } else {
        format!("http://openweathermap.org/img/wn/{icon}.png")
    }
}
