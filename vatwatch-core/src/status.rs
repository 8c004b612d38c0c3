//! Flight status and display time relative to an airport of interest.
//!
//! Pure logic. The current time is always passed in by the caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use crate::geo::distance_nm;
use crate::types::TrackedAircraft;

/// Below this ground speed an aircraft is treated as on the ground.
pub const GROUND_SPEED_KTS: f64 = 50.0;

pub const LANDED: &str = "landed";
pub const UNAVAILABLE: &str = "unavailable";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Where an aircraft is relative to the airport of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlightStatus {
    PreDeparture,
    EnRouteOutbound,
    EnRouteInbound,
    Arrived,
}

impl FlightStatus {
    /// Short board label.
    pub fn label(&self) -> &'static str {
        match self {
            FlightStatus::PreDeparture => "Departing",
            FlightStatus::EnRouteOutbound => "Departed",
            FlightStatus::EnRouteInbound => "Arriving",
            FlightStatus::Arrived => "Arrived",
        }
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn is_code(code: &str, airport: &str) -> bool {
    code.eq_ignore_ascii_case(airport)
}

/// Classify an aircraft against the airport of interest.
///
/// No flight plan, or a plan unrelated to the airport, classifies as
/// outbound. A loop flight (departure and arrival both the airport) matches
/// on departure.
pub fn classify(ac: &TrackedAircraft, airport: &str) -> FlightStatus {
    let Some(fp) = ac.flight_plan() else {
        return FlightStatus::EnRouteOutbound;
    };
    let slow = ac.pilot.groundspeed < GROUND_SPEED_KTS;

    if is_code(&fp.departure, airport) {
        if slow {
            FlightStatus::PreDeparture
        } else {
            FlightStatus::EnRouteOutbound
        }
    } else if is_code(&fp.arrival, airport) {
        if slow {
            FlightStatus::Arrived
        } else {
            FlightStatus::EnRouteInbound
        }
    } else {
        FlightStatus::EnRouteOutbound
    }
}

// ---------------------------------------------------------------------------
// Display time
// ---------------------------------------------------------------------------

/// The time column of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeDisplay {
    /// Filed departure time, verbatim.
    Scheduled(String),
    /// Projected arrival, UTC.
    Projected(DateTime<Utc>),
    Landed,
    Unavailable,
}

impl TimeDisplay {
    pub fn sort_key(&self) -> f64 {
        time_sort_key(&self.to_string())
    }
}

impl std::fmt::Display for TimeDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeDisplay::Scheduled(deptime) => write!(f, "{deptime}Z"),
            TimeDisplay::Projected(at) => write!(f, "{}Z", at.format("%H:%M")),
            TimeDisplay::Landed => f.write_str(LANDED),
            TimeDisplay::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl Serialize for TimeDisplay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Display time for an aircraft relative to the airport of interest.
pub fn display_time(ac: &TrackedAircraft, airport: &str, now: DateTime<Utc>) -> TimeDisplay {
    let Some(fp) = ac.flight_plan() else {
        return TimeDisplay::Unavailable;
    };

    match classify(ac, airport) {
        FlightStatus::PreDeparture | FlightStatus::EnRouteOutbound => {
            TimeDisplay::Scheduled(fp.deptime.clone())
        }
        FlightStatus::EnRouteInbound => projected_arrival(ac, now)
            .map(TimeDisplay::Projected)
            .unwrap_or(TimeDisplay::Unavailable),
        FlightStatus::Arrived => TimeDisplay::Landed,
    }
}

/// `now` plus remaining distance over ground speed, to the nearest minute.
///
/// `None` without a destination, with a non-positive speed, or when the
/// projection is not a finite non-negative time.
pub fn projected_arrival(ac: &TrackedAircraft, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let dest = ac.destination?;
    let speed = ac.pilot.groundspeed;
    if speed.is_nan() || speed <= 0.0 {
        return None;
    }

    let minutes = distance_nm(ac.position(), dest) / speed * 60.0;
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }

    let delta = Duration::try_minutes(minutes.round() as i64)?;
    now.checked_add_signed(delta)
}

// ---------------------------------------------------------------------------
// Sort key
// ---------------------------------------------------------------------------

/// Numeric rank for ordering display times.
///
/// `landed` and `unavailable` rank last. `HH:MM` and `HHMM` (trailing `Z`
/// optional) rank as minutes of the day, with hour 00 counted as 24 so that
/// just-after-midnight sorts after 23:xx. That only holds while every time
/// on the board falls inside one operational day; there is no date here.
pub fn time_sort_key(display: &str) -> f64 {
    if display == LANDED || display == UNAVAILABLE {
        return f64::INFINITY;
    }

    let body = display.strip_suffix('Z').unwrap_or(display);
    let (hours, minutes) = match body.split_once(':') {
        Some(parts) => parts,
        None if body.len() == 4 && body.is_ascii() => body.split_at(2),
        None => return f64::INFINITY,
    };

    match (hours.parse::<u32>(), minutes.parse::<u32>()) {
        (Ok(h), Ok(m)) => {
            let h = if h == 0 { 24 } else { h };
            h.checked_mul(60)
                .and_then(|v| v.checked_add(m))
                .map_or(f64::INFINITY, f64::from)
        }
        _ => f64::INFINITY,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
