//! Board building: airport and airline filters, time sorting, and
//! attribution of controllers and ATIS stations to an airport.
//!
//! Everything here is a pure function of one snapshot plus a query.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::enrich::lookup_operator;
use crate::status::{classify, display_time, FlightStatus, TimeDisplay};
use crate::types::{Atis, Controller, TrackedAircraft};

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Which side of the airport to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Departures,
    Arrivals,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "departures" | "departed" | "dep" => Ok(StatusFilter::Departures),
            "arrivals" | "arrived" | "arr" => Ok(StatusFilter::Arrivals),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Free-text filters applied to traffic at the airport of interest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    pub callsign: String,
    pub aircraft_type: String,
    pub status: StatusFilter,
}

/// Restrict to one operator by callsign prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirlineFilter {
    pub code: String,
    pub aircraft_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardQuery {
    pub airport: Option<String>,
    pub airline: Option<AirlineFilter>,
    pub filter: BoardFilter,
    pub sort: Option<SortOrder>,
}

/// One line of the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub cid: u64,
    pub callsign: String,
    pub operator: Option<&'static str>,
    pub aircraft: String,
    pub departure: String,
    pub arrival: String,
    pub time: TimeDisplay,
    pub route: String,
    pub status: FlightStatus,
    pub lat: f64,
    pub lon: f64,
    pub altitude: f64,
    pub groundspeed: f64,
    pub heading: f64,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// The aircraft's flight plan departs from or arrives at the airport.
pub fn at_airport(ac: &TrackedAircraft, airport: &str) -> bool {
    ac.flight_plan().is_some_and(|fp| {
        fp.departure.eq_ignore_ascii_case(airport) || fp.arrival.eq_ignore_ascii_case(airport)
    })
}

impl BoardFilter {
    /// Callsign, type, and status checks for an aircraft already known to be
    /// at `airport`.
    pub fn matches(&self, ac: &TrackedAircraft, airport: &str) -> bool {
        let Some(fp) = ac.flight_plan() else {
            return false;
        };

        if !self.callsign.is_empty() && !contains_ignore_case(&ac.pilot.callsign, &self.callsign) {
            return false;
        }
        if !self.aircraft_type.is_empty() && !contains_ignore_case(&fp.aircraft, &self.aircraft_type)
        {
            return false;
        }

        let status = classify(ac, airport);
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Departures => {
                matches!(status, FlightStatus::PreDeparture | FlightStatus::EnRouteOutbound)
                    && fp.departure.eq_ignore_ascii_case(airport)
            }
            StatusFilter::Arrivals => {
                matches!(status, FlightStatus::Arrived | FlightStatus::EnRouteInbound)
                    && fp.arrival.eq_ignore_ascii_case(airport)
            }
        }
    }
}

impl AirlineFilter {
    pub fn matches(&self, ac: &TrackedAircraft) -> bool {
        if !ac.pilot.callsign.starts_with(&self.code.to_ascii_uppercase()) {
            return false;
        }
        if self.aircraft_type.is_empty() {
            return true;
        }
        ac.flight_plan()
            .is_some_and(|fp| contains_ignore_case(&fp.aircraft, &self.aircraft_type))
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

fn make_row(ac: &TrackedAircraft, airport: &str, now: DateTime<Utc>) -> BoardRow {
    let (aircraft, departure, arrival, route) = match ac.flight_plan() {
        Some(fp) => (
            fp.aircraft.clone(),
            fp.departure.clone(),
            fp.arrival.clone(),
            fp.route.clone(),
        ),
        None => Default::default(),
    };

    BoardRow {
        cid: ac.pilot.cid,
        callsign: ac.pilot.callsign.clone(),
        operator: lookup_operator(&ac.pilot.callsign),
        aircraft,
        departure,
        arrival,
        time: display_time(ac, airport, now),
        route,
        status: classify(ac, airport),
        lat: ac.pilot.latitude,
        lon: ac.pilot.longitude,
        altitude: ac.pilot.altitude,
        groundspeed: ac.pilot.groundspeed,
        heading: ac.pilot.heading,
    }
}

/// Order two sort keys. Infinite keys (landed, unavailable) go last in
/// either direction.
fn compare_keys(a: f64, b: f64, order: SortOrder) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Stable sort of board rows by their time column.
pub fn sort_by_time(rows: &mut [BoardRow], order: SortOrder) {
    rows.sort_by(|a, b| compare_keys(a.time.sort_key(), b.time.sort_key(), order));
}

/// Build the board for a query. With neither an airport nor an airline
/// selected the board is empty.
pub fn build_board(
    aircraft: &[TrackedAircraft],
    query: &BoardQuery,
    now: DateTime<Utc>,
) -> Vec<BoardRow> {
    let airport = query.airport.as_deref().filter(|a| !a.is_empty());
    let airline = query.airline.as_ref().filter(|a| !a.code.is_empty());
    if airport.is_none() && airline.is_none() {
        return Vec::new();
    }

    let mut rows: Vec<BoardRow> = aircraft
        .iter()
        .filter(|ac| airline.is_none_or(|f| f.matches(ac)))
        .filter(|ac| {
            airport.is_none_or(|apt| at_airport(ac, apt) && query.filter.matches(ac, apt))
        })
        .map(|ac| make_row(ac, airport.unwrap_or(""), now))
        .collect();

    if let Some(order) = query.sort {
        sort_by_time(&mut rows, order);
    }
    rows
}

// ---------------------------------------------------------------------------
// Controllers and ATIS
// ---------------------------------------------------------------------------

/// Airport part of a station callsign (`KLAX_TWR` -> `KLAX`).
pub fn station_prefix(callsign: &str) -> &str {
    callsign.split('_').next().unwrap_or(callsign)
}

fn staffs(callsign: &str, airport: &str) -> bool {
    !airport.is_empty() && station_prefix(callsign).eq_ignore_ascii_case(airport)
}

pub fn controllers_at<'a>(controllers: &'a [Controller], airport: &str) -> Vec<&'a Controller> {
    controllers
        .iter()
        .filter(|c| staffs(&c.callsign, airport))
        .collect()
}

pub fn atis_at<'a>(atis: &'a [Atis], airport: &str) -> Vec<&'a Atis> {
    atis.iter().filter(|a| staffs(&a.callsign, airport)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
