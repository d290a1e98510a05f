//! Core library for the `skylook` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and its error taxonomy
//! - View state for a city lookup, driven by [`WeatherSession`]
//! - Theme selection derived from current conditions
//!
//! It is used by `skylook-cli`, but can also back other front ends.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod state;
pub mod theme;

pub use client::{ClientSettings, OpenWeatherClient, WeatherClient, fetch_snapshot};
pub use config::Config;
pub use error::WeatherError;
pub use model::{CurrentConditions, Forecast, ForecastEntry, Query, Snapshot, Units};
pub use state::{Event, PendingLookup, RequestState, ViewState, WeatherSession};
pub use theme::{Theme, ThemeRules};
