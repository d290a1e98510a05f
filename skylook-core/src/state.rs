//! View state for a single lookup panel and the session that drives it.
//!
//! [`ViewState`] changes only through [`ViewState::apply`], a pure transition
//! over [`Event`]s. [`WeatherSession`] owns the state and the client, issues
//! sequence numbers for submissions and feeds completions back in. A
//! completion whose sequence number is not the latest one issued is dropped,
//! so a slow lookup can never overwrite the result of a newer one.

use tracing::{debug, info};

use crate::{
    client::{WeatherClient, fetch_snapshot},
    error::WeatherError,
    model::{CurrentConditions, ForecastEntry, Query, Snapshot, Units},
    theme::{Theme, ThemeRules},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Success(Snapshot),
    Failed(WeatherError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A valid query was submitted under `seq`.
    Submitted { seq: u64 },
    /// A submission under `seq` was rejected before any request was made.
    Rejected { seq: u64, error: WeatherError },
    /// The lookup issued under `seq` finished.
    Completed { seq: u64, outcome: Result<Snapshot, WeatherError> },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    /// Text currently in the city input.
    pub input: String,
    pub request: RequestState,
    latest_seq: u64,
}

impl ViewState {
    pub fn apply(self, event: Event) -> Self {
        match event {
            Event::Submitted { seq } => {
                Self { request: RequestState::Loading, latest_seq: seq, ..self }
            }
            Event::Rejected { seq, error } => {
                Self { request: RequestState::Failed(error), latest_seq: seq, ..self }
            }
            Event::Completed { seq, .. } if seq != self.latest_seq => self,
            Event::Completed { outcome, .. } => {
                let request = match outcome {
                    Ok(snapshot) => RequestState::Success(snapshot),
                    Err(err) => RequestState::Failed(err),
                };
                Self { request, ..self }
            }
        }
    }

    /// Sequence number of the most recent submission.
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.request, RequestState::Loading)
    }

    pub fn last_error(&self) -> Option<&WeatherError> {
        match &self.request {
            RequestState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match &self.request {
            RequestState::Success(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn current_conditions(&self) -> Option<&CurrentConditions> {
        self.snapshot().map(|s| &s.current)
    }

    /// Empty unless the last lookup succeeded.
    pub fn forecast(&self) -> &[ForecastEntry] {
        self.snapshot().map(|s| s.forecast.entries.as_slice()).unwrap_or(&[])
    }

    pub fn theme(&self, rules: &ThemeRules) -> Theme {
        self.current_conditions()
            .map(|current| Theme::for_conditions(current, rules))
            .unwrap_or(Theme::Default)
    }
}

/// Ticket for a submitted lookup; hand it back to [`WeatherSession::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLookup {
    pub seq: u64,
    pub query: Query,
}

#[derive(Debug)]
pub struct WeatherSession<C> {
    client: C,
    state: ViewState,
    units: Option<Units>,
    startup_city: Option<String>,
    activated: bool,
}

impl<C: WeatherClient> WeatherSession<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: ViewState::default(),
            units: None,
            startup_city: None,
            activated: false,
        }
    }

    /// Override the client's unit system for every lookup of this session.
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = Some(units);
        self
    }

    /// City to look up once, on [`activate`](Self::activate).
    pub fn with_startup_city(mut self, city: Option<String>) -> Self {
        self.startup_city = city.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn current_input(&self) -> &str {
        &self.state.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.state.input = input.into();
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn last_error(&self) -> Option<&WeatherError> {
        self.state.last_error()
    }

    pub fn current_conditions(&self) -> Option<&CurrentConditions> {
        self.state.current_conditions()
    }

    pub fn forecast(&self) -> &[ForecastEntry] {
        self.state.forecast()
    }

    fn transition(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(event);
    }

    /// Starts a lookup. Blank input is rejected and recorded as the last
    /// error; it also supersedes any lookup still in flight.
    pub fn begin(&mut self, city: &str) -> Option<PendingLookup> {
        let seq = self.state.latest_seq() + 1;

        match Query::new(city) {
            Ok(query) => {
                let query = match self.units {
                    Some(units) => query.with_units(units),
                    None => query,
                };
                debug!(seq, city = query.city(), "lookup submitted");
                self.transition(Event::Submitted { seq });
                Some(PendingLookup { seq, query })
            }
            Err(error) => {
                debug!(seq, "blank city rejected");
                self.transition(Event::Rejected { seq, error });
                None
            }
        }
    }

    /// Records the outcome of `pending`. Returns `false` if a newer lookup
    /// has been submitted since and the outcome was discarded.
    pub fn finish(
        &mut self,
        pending: PendingLookup,
        outcome: Result<Snapshot, WeatherError>,
    ) -> bool {
        if pending.seq != self.state.latest_seq() {
            info!(
                seq = pending.seq,
                latest = self.state.latest_seq(),
                city = pending.query.city(),
                "discarding superseded lookup"
            );
            return false;
        }

        if let Err(err) = &outcome {
            debug!(seq = pending.seq, error = %err, "lookup failed");
        }

        self.transition(Event::Completed { seq: pending.seq, outcome });
        true
    }

    /// Looks up `city`, current conditions first and the forecast only if
    /// those succeeded. Failures end up in [`last_error`](Self::last_error).
    pub async fn submit(&mut self, city: &str) {
        let Some(pending) = self.begin(city) else {
            return;
        };

        let outcome = fetch_snapshot(&self.client, &pending.query).await;
        self.finish(pending, outcome);
    }

    /// Submits the current input.
    pub async fn submit_input(&mut self) {
        let city = self.state.input.clone();
        self.submit(&city).await;
    }

    /// Runs the startup lookup the first time it is called; later calls do nothing.
    pub async fn activate(&mut self) {
        if self.activated {
            return;
        }
        self.activated = true;

        if let Some(city) = self.startup_city.clone() {
            info!(city = %city, "startup lookup");
            self.submit(&city).await;
        }
    }
}
