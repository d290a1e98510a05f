use thiserror::Error;

/// Message shown when a lookup is submitted without a city name.
pub const EMPTY_CITY_MESSAGE: &str = "Please enter a city name";

/// Banner text for failures that never reached the weather service.
pub const TRANSPORT_MESSAGE: &str = "Sorry, we couldn't retrieve the weather data at this time";

/// Classified failure of a weather lookup.
///
/// Every variant is cheap to clone so the last error can be kept in view state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// The query was rejected locally before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The API key is missing or still set to the template placeholder.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The service does not know the requested city.
    #[error("City not found")]
    CityNotFound,

    /// Network failure, timeout, or an unreadable response stream.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service reported a failure other than "not found".
    #[error("Weather service error: {0}")]
    Api(String),

    /// A successful response whose body could not be decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl WeatherError {
    pub fn empty_city() -> Self {
        WeatherError::InvalidInput(EMPTY_CITY_MESSAGE.to_string())
    }

    /// Short, human-readable text for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::InvalidInput(msg)
            | WeatherError::Configuration(msg)
            | WeatherError::Api(msg) => msg.clone(),
            WeatherError::CityNotFound => "City not found".to_string(),
            WeatherError::Transport(_) => TRANSPORT_MESSAGE.to_string(),
            WeatherError::MalformedResponse(_) => {
                "The weather service sent a response we could not read".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Transport(format!("request timed out: {err}"))
        } else {
            WeatherError::Transport(err.to_string())
        }
    }
}
