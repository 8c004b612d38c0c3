//! Dashboard state machine.
//!
//! Pure logic with no I/O and no timers. The scheduler feeds `DashboardEvent`s in
//! and gets `Effect`s back telling it what to fetch or stop fetching. State
//! only ever changes by replacing a whole snapshot or weather report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::{atis_at, build_board, controllers_at, BoardQuery, BoardRow};
use crate::enrich::enrich_destinations;
use crate::metar::Metar;
use crate::types::{Atis, Controller, FeedSnapshot, TrackedAircraft};

// ---------------------------------------------------------------------------
// Events and effects
// ---------------------------------------------------------------------------

/// Inputs to the dashboard.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// A full feed snapshot arrived.
    FeedLoaded(FeedSnapshot),
    /// The feed fetch failed; the previous snapshot stays.
    FeedFailed(String),
    /// A weather fetch for `icao` finished. `None` means no usable report.
    WeatherLoaded { icao: String, metar: Option<Metar> },
    /// A weather fetch for `icao` failed.
    WeatherFailed { icao: String, error: String },
    /// The operator picked a new airport of interest (empty clears it).
    AirportSelected(String),
}

/// Work the scheduler should do after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch weather for this station now and restart the weather timer.
    FetchWeather(String),
    /// Stop the weather timer.
    StopWeather,
}

/// Counters for the status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub feed_polls: u64,
    pub feed_failures: u64,
    pub weather_polls: u64,
    pub weather_failures: u64,
    pub stale_weather_dropped: u64,
    pub pilots: usize,
    pub controllers: usize,
    pub atis: usize,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Dashboard {
    airport: Option<String>,
    snapshot: FeedSnapshot,
    aircraft: Vec<TrackedAircraft>,
    weather: Option<Metar>,
    diagnostic: String,
    stats: DashboardStats,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the effects it calls for.
    pub fn apply(&mut self, event: DashboardEvent) -> Vec<Effect> {
        match event {
            DashboardEvent::FeedLoaded(snapshot) => {
                self.stats.feed_polls += 1;
                self.aircraft = enrich_destinations(&snapshot.pilots);
                self.diagnostic = format!("Total pilots: {}", snapshot.pilots.len());
                self.stats.pilots = snapshot.pilots.len();
                self.stats.controllers = snapshot.controllers.len();
                self.stats.atis = snapshot.atis.len();
                self.snapshot = snapshot;
                Vec::new()
            }
            DashboardEvent::FeedFailed(error) => {
                self.stats.feed_failures += 1;
                self.diagnostic = format!("Error: {error}");
                Vec::new()
            }
            DashboardEvent::WeatherLoaded { icao, metar } => {
                if self.is_selected(&icao) {
                    self.stats.weather_polls += 1;
                    self.weather = metar;
                } else {
                    self.stats.stale_weather_dropped += 1;
                }
                Vec::new()
            }
            DashboardEvent::WeatherFailed { icao, .. } => {
                if self.is_selected(&icao) {
                    self.stats.weather_failures += 1;
                    self.weather = None;
                } else {
                    self.stats.stale_weather_dropped += 1;
                }
                Vec::new()
            }
            DashboardEvent::AirportSelected(code) => self.select_airport(&code),
        }
    }

    fn select_airport(&mut self, code: &str) -> Vec<Effect> {
        let code = code.trim().to_ascii_uppercase();
        let next = (!code.is_empty()).then_some(code);
        if next == self.airport {
            return Vec::new();
        }

        self.airport = next;
        self.weather = None;
        match &self.airport {
            Some(icao) => vec![Effect::FetchWeather(icao.clone())],
            None => vec![Effect::StopWeather],
        }
    }

    fn is_selected(&self, icao: &str) -> bool {
        self.airport
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case(icao))
    }

    pub fn airport(&self) -> Option<&str> {
        self.airport.as_deref()
    }

    pub fn aircraft(&self) -> &[TrackedAircraft] {
        &self.aircraft
    }

    pub fn snapshot(&self) -> &FeedSnapshot {
        &self.snapshot
    }

    pub fn weather(&self) -> Option<&Metar> {
        self.weather.as_ref()
    }

    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    /// Board for a query. A query without an airport uses the selected one.
    pub fn board(&self, query: &BoardQuery, now: DateTime<Utc>) -> Vec<BoardRow> {
        if query.airport.is_some() {
            return build_board(&self.aircraft, query, now);
        }
        let query = BoardQuery {
            airport: self.airport.clone(),
            ..query.clone()
        };
        build_board(&self.aircraft, &query, now)
    }

    /// Controllers staffing the selected airport.
    pub fn controllers(&self) -> Vec<&Controller> {
        controllers_at(&self.snapshot.controllers, self.airport().unwrap_or(""))
    }

    /// ATIS stations for the selected airport.
    pub fn atis(&self) -> Vec<&Atis> {
        atis_at(&self.snapshot.atis, self.airport().unwrap_or(""))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
