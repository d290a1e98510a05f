//! Integration tests for the OpenWeather client and session using wiremock.
//!
//! These run the real HTTP client against a mock server to check request
//! construction, response classification and the full lookup flow.

use std::time::Duration;

use skylook_core::{
    ClientSettings, OpenWeatherClient, Query, Units, WeatherClient, WeatherError, WeatherSession,
    config::API_KEY_PLACEHOLDER,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn sample_current_response() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1257, "lat": 51.5085 },
        "weather": [
            { "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }
        ],
        "base": "stations",
        "main": {
            "temp": 11.4,
            "feels_like": 10.6,
            "temp_min": 10.2,
            "temp_max": 12.3,
            "pressure": 1012,
            "humidity": 81
        },
        "visibility": 10000,
        "wind": { "speed": 4.63, "deg": 240 },
        "clouds": { "all": 75 },
        "dt": 1_700_000_000,
        "sys": { "type": 2, "id": 2075535, "country": "GB", "sunrise": 1_699_975_000, "sunset": 1_700_008_000 },
        "timezone": 0,
        "id": 2643743,
        "name": "London",
        "cod": 200
    })
}

fn sample_forecast_response(samples: usize) -> serde_json::Value {
    let list: Vec<serde_json::Value> = (0..samples)
        .map(|i| {
            serde_json::json!({
                "dt": 1_700_000_000 + (i as i64) * 10_800,
                "main": { "temp": 10.0 + i as f64, "feels_like": 9.0, "pressure": 1010, "humidity": 80 },
                "weather": [
                    { "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }
                ],
                "wind": { "speed": 3.2, "deg": 200 },
                "dt_txt": "2023-11-14 21:00:00"
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": samples,
        "list": list,
        "city": { "id": 2643743, "name": "London", "country": "GB" }
    })
}

fn not_found_body() -> serde_json::Value {
    serde_json::json!({ "cod": "404", "message": "city not found" })
}

fn settings(base_url: String) -> ClientSettings {
    ClientSettings {
        base_url,
        api_key: Some("TEST_KEY".to_string()),
        units: Units::Metric,
        timeout: Duration::from_secs(5),
    }
}

/// Create a test client configured to use the mock server
fn create_test_client(mock_server: &MockServer) -> OpenWeatherClient {
    #[allow(clippy::expect_used)]
    OpenWeatherClient::new(settings(mock_server.uri())).expect("Failed to create client")
}

fn query(city: &str) -> Query {
    #[allow(clippy::expect_used)]
    Query::new(city).expect("valid city")
}

// ============================================================================
// Request construction
// ============================================================================

#[tokio::test]
async fn current_request_carries_city_key_and_units() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "São Paulo"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_current_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.fetch_current(&query(" São Paulo ").with_units(Units::Imperial)).await;

    let current = result.expect("request should match the mock");
    assert_eq!(current.units, Units::Imperial);
}

#[tokio::test]
async fn base_url_trailing_slash_is_tolerated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_current_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::new(settings(format!("{}/", mock_server.uri()))).unwrap();
    assert!(client.fetch_current(&query("London")).await.is_ok());
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn fetch_current_decodes_conditions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_current_response()))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let current = client.fetch_current(&query("London")).await.unwrap();

    assert_eq!(current.location_name, "London");
    assert_eq!(current.country.as_deref(), Some("GB"));
    assert!((current.temperature - 11.4).abs() < 0.01);
    assert!((current.feels_like - 10.6).abs() < 0.01);
    assert_eq!(current.humidity_pct, 81);
    assert!((current.wind_speed - 4.63).abs() < 0.01);
    assert!((current.pressure_hpa - 1012.0).abs() < 0.01);
    assert_eq!(current.condition, "Clouds");
    assert_eq!(current.icon, "04d");
    assert_eq!(current.description, "broken clouds");
}

#[tokio::test]
async fn fetch_forecast_keeps_one_sample_per_day() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast_response(40)))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let forecast = client.fetch_forecast(&query("London")).await.unwrap();

    assert_eq!(forecast.len(), 5);
    for (i, entry) in forecast.iter().enumerate() {
        let source_index = (i * 8) as i64;
        assert_eq!(entry.timestamp.timestamp(), 1_700_000_000 + source_index * 10_800);
        assert!((entry.temperature - (10.0 + source_index as f64)).abs() < 0.01);
        assert_eq!(entry.condition, "Rain");
    }
}

#[tokio::test]
async fn short_and_empty_forecasts_are_valid() {
    for (samples, expected) in [(0, 0), (3, 1), (9, 2)] {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(sample_forecast_response(samples)),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let forecast = client.fetch_forecast(&query("London")).await.unwrap();
        assert_eq!(forecast.len(), expected, "samples = {samples}");
    }
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test]
async fn http_404_is_city_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body()))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.fetch_current(&query("Nonexistentville")).await.unwrap_err();
    assert_eq!(err, WeatherError::CityNotFound);
}

#[tokio::test]
async fn unauthorized_uses_api_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.fetch_current(&query("London")).await.unwrap_err();

    match err {
        WeatherError::Api(message) => assert!(message.starts_with("Invalid API key")),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_without_message_uses_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.fetch_forecast(&query("London")).await.unwrap_err();
    assert_eq!(err, WeatherError::Api("Failed to fetch forecast data.".to_string()));
}

#[tokio::test]
async fn success_status_with_error_code_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": "429",
            "message": "Your account is temporary blocked due to exceeding of requests limitation of your subscription type."
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.fetch_current(&query("London")).await.unwrap_err();
    assert!(matches!(err, WeatherError::Api(ref m) if m.contains("temporary blocked")));
}

#[tokio::test]
async fn undecodable_success_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.fetch_current(&query("London")).await.unwrap_err();
    assert!(matches!(err, WeatherError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Nothing listens on port 1.
    let client = OpenWeatherClient::new(settings("http://127.0.0.1:1".to_string())).unwrap();
    let err = client.fetch_current(&query("London")).await.unwrap_err();
    assert!(matches!(err, WeatherError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_response_times_out_as_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sample_current_response())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::new(ClientSettings {
        timeout: Duration::from_millis(300),
        ..settings(mock_server.uri())
    })
    .unwrap();

    let err = client.fetch_current(&query("London")).await.unwrap_err();
    assert!(matches!(err, WeatherError::Transport(ref d) if d.contains("timed out")), "got {err:?}");
}

#[tokio::test]
async fn placeholder_key_never_reaches_the_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_current_response()))
        .expect(0)
        .mount(&mock_server)
        .await;

    for api_key in [None, Some(API_KEY_PLACEHOLDER.to_string())] {
        let client =
            OpenWeatherClient::new(ClientSettings { api_key, ..settings(mock_server.uri()) })
                .unwrap();
        let err = client.fetch_current(&query("London")).await.unwrap_err();
        assert!(matches!(err, WeatherError::Configuration(_)), "got {err:?}");
    }
}

// ============================================================================
// Session scenarios
// ============================================================================

#[tokio::test]
async fn session_london_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_current_response()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast_response(37)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut session = WeatherSession::new(create_test_client(&mock_server));
    session.submit("London").await;

    assert!(!session.is_loading());
    assert!(session.last_error().is_none(), "unexpected error: {:?}", session.last_error());
    assert_eq!(session.current_conditions().unwrap().location_name, "London");
    assert_eq!(session.forecast().len(), 5); // ceil(37 / 8)
}

#[tokio::test]
async fn session_unknown_city_never_requests_forecast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast_response(40)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut session = WeatherSession::new(create_test_client(&mock_server));
    session.submit("Nonexistentville").await;

    assert_eq!(session.last_error(), Some(&WeatherError::CityNotFound));
    assert!(session.current_conditions().is_none());
    assert!(session.forecast().is_empty());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn session_blank_input_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut session = WeatherSession::new(create_test_client(&mock_server));
    session.submit("").await;
    session.submit("   ").await;

    assert!(matches!(session.last_error(), Some(WeatherError::InvalidInput(_))));
}
