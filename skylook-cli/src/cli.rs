use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use skylook_core::{Config, OpenWeatherClient, Units, WeatherSession};

use crate::render::{LOADING_LINE, render_error, render_state};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skylook", version, about = "Current weather and 5-day forecast by city")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Unit system for this run: "metric" or "imperial".
    #[arg(long, global = true)]
    pub units: Option<Units>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key, unit system and startup city.
    Configure,

    /// Show weather for a single city.
    Show {
        /// City name, e.g. "London" or "Paris,FR".
        city: String,
    },

    /// Look up cities one after another until Esc or Ctrl-C.
    Interactive {
        /// Skip the lookup of the configured default city.
        #[arg(long)]
        no_startup: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                let path = match self.config {
                    Some(path) => path,
                    None => Config::config_file_path()?,
                };
                // File values only: environment overrides must not be saved.
                let config = Config::read_from(&path)?;
                configure(config, &path)
            }
            Command::Show { city } => {
                let config = runtime_config(self.config.as_deref())?;
                show(&config, self.units, &city).await
            }
            Command::Interactive { no_startup } => {
                let config = runtime_config(self.config.as_deref())?;
                interactive(&config, self.units, no_startup).await
            }
        }
    }
}

/// Config for a lookup, with environment overrides applied.
fn runtime_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// An empty answer keeps the stored key.
fn updated_api_key(stored: Option<&str>, entered: &str) -> Option<String> {
    let entered = entered.trim();
    if entered.is_empty() {
        stored.map(str::to_string)
    } else {
        Some(entered.to_string())
    }
}

fn session(
    config: &Config,
    units: Option<Units>,
) -> anyhow::Result<WeatherSession<OpenWeatherClient>> {
    let client = OpenWeatherClient::new(config.client_settings())?;
    let session = WeatherSession::new(client);

    Ok(match units {
        Some(units) => session.with_units(units),
        None => session,
    })
}

fn configure(mut config: Config, path: &Path) -> anyhow::Result<()> {
    let help = if config.api_key.is_some() {
        "Leave empty to keep the current key"
    } else {
        "Get a free key at https://openweathermap.org/api"
    };
    let entered = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message(help)
        .prompt()
        .context("Failed to read API key")?;
    if let Some(api_key) = updated_api_key(config.api_key.as_deref(), &entered) {
        config.set_api_key(api_key);
    }

    let options = vec![Units::Metric, Units::Imperial];
    let cursor = options.iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Unit system:", options)
        .with_starting_cursor(cursor)
        .prompt()
        .context("Failed to read unit system")?;

    let default_city = Text::new("City to show on startup (leave empty for none):")
        .with_initial_value(config.default_city.as_deref().unwrap_or(""))
        .prompt()
        .context("Failed to read default city")?;
    let default_city = default_city.trim();
    config.default_city = (!default_city.is_empty()).then(|| default_city.to_string());

    config.save_to(path)?;

    if let Err(err) = config.api_key() {
        eprintln!("{}", render_error(&err));
    }
    println!("Configuration saved to {}", path.display());

    Ok(())
}

async fn show(config: &Config, units: Option<Units>, city: &str) -> anyhow::Result<()> {
    let mut session = session(config, units)?;

    eprintln!("{LOADING_LINE}");
    session.submit(city).await;

    if let Some(err) = session.last_error() {
        anyhow::bail!(err.user_message());
    }

    print!("{}", render_state(session.state(), &config.theme_rules()));
    Ok(())
}

async fn interactive(config: &Config, units: Option<Units>, no_startup: bool) -> anyhow::Result<()> {
    let startup = if no_startup { None } else { config.default_city.clone() };
    let has_startup = startup.is_some();
    let mut session = session(config, units)?.with_startup_city(startup);
    let rules = config.theme_rules();

    if has_startup {
        println!("{LOADING_LINE}");
    }
    session.activate().await;
    print!("{}", render_state(session.state(), &rules));

    loop {
        let input = match Text::new("City:")
            .with_initial_value(session.current_input())
            .prompt()
        {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read city name"),
        };

        session.set_input(input);
        println!("{LOADING_LINE}");
        session.submit_input().await;
        print!("{}", render_state(session.state(), &rules));
    }

    Ok(())
}
