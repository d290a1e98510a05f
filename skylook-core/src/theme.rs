//! Background theme derived from the current conditions.

use std::fmt;

use crate::model::CurrentConditions;

/// Parameters of the theme table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeRules {
    /// Clear skies above this temperature (°C) count as warm.
    pub warm_threshold_c: f64,
}

impl Default for ThemeRules {
    fn default() -> Self {
        Self { warm_threshold_c: 20.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Rainy,
    Snowy,
    Cloudy,
    SunnyWarm,
    SunnyCool,
    Stormy,
    Default,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Rainy => "rainy",
            Theme::Snowy => "snowy",
            Theme::Cloudy => "cloudy",
            Theme::SunnyWarm => "sunny-warm",
            Theme::SunnyCool => "sunny-cool",
            Theme::Stormy => "stormy",
            Theme::Default => "default",
        }
    }

    /// First match wins: rain/drizzle, snow, cloud, clear, thunder.
    pub fn select(condition: &str, temperature_c: f64, rules: &ThemeRules) -> Self {
        let condition = condition.to_lowercase();

        if condition.contains("rain") || condition.contains("drizzle") {
            Theme::Rainy
        } else if condition.contains("snow") {
            Theme::Snowy
        } else if condition.contains("cloud") {
            Theme::Cloudy
        } else if condition.contains("clear") {
            if temperature_c > rules.warm_threshold_c {
                Theme::SunnyWarm
            } else {
                Theme::SunnyCool
            }
        } else if condition.contains("thunder") {
            Theme::Stormy
        } else {
            Theme::Default
        }
    }

    pub fn for_conditions(current: &CurrentConditions, rules: &ThemeRules) -> Self {
        let temperature_c = current.units.to_celsius(current.temperature);
        Self::select(&current.condition, temperature_c, rules)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
