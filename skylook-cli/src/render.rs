use std::fmt::Write;

use skylook_core::{
    CurrentConditions, ForecastEntry, Theme, ThemeRules, Units, ViewState, WeatherError,
    model::icon_url,
};

pub const LOADING_LINE: &str = "Loading...";

/// Text for the whole panel: loading line, error banner or results.
pub fn render_state(state: &ViewState, rules: &ThemeRules) -> String {
    if state.is_loading() {
        return format!("{LOADING_LINE}\n");
    }

    if let Some(err) = state.last_error() {
        return render_error(err);
    }

    let Some(current) = state.current_conditions() else {
        return String::new();
    };

    let mut out = render_current(current, state.theme(rules));
    let forecast = state.forecast();
    if !forecast.is_empty() {
        out.push('\n');
        out.push_str(&render_forecast(forecast, current.units));
    }
    out
}

/// Rounds for display; `-0.3` shows as `0`, not `-0`.
fn rounded(value: f64) -> f64 {
    value.round() + 0.0
}

pub fn render_error(err: &WeatherError) -> String {
    format!("! {}\n", err.user_message())
}

fn render_current(current: &CurrentConditions, theme: Theme) -> String {
    let units = current.units;
    let mut out = String::new();

    let _ = writeln!(out, "{}  [{}]", current.display_location(), theme);
    let _ = writeln!(
        out,
        "  {}{}  {}",
        rounded(current.temperature),
        units.temperature_symbol(),
        current.condition
    );
    if !current.description.is_empty() {
        let _ = writeln!(out, "  {}", current.description);
    }
    let _ = writeln!(
        out,
        "  Feels like {}{}",
        rounded(current.feels_like),
        units.temperature_symbol()
    );
    let _ = writeln!(out, "  Humidity   {}%", current.humidity_pct);
    let _ = writeln!(out, "  Wind speed {} {}", rounded(current.wind_speed), units.wind_speed_unit());
    let _ = writeln!(out, "  Pressure   {} hPa", rounded(current.pressure_hpa));
    if !current.icon.is_empty() {
        let _ = writeln!(out, "  Icon       {}", icon_url(&current.icon, true));
    }

    out
}

fn render_forecast(entries: &[ForecastEntry], units: Units) -> String {
    let mut out = format!("{}-Day Forecast\n", entries.len());

    for entry in entries {
        let _ = writeln!(
            out,
            "  {:<4}{:>5}{}  {}",
            entry.timestamp.format("%a"),
            rounded(entry.temperature),
            units.temperature_symbol(),
            entry.condition
        );
    }

    out
}
