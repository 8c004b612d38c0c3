//! Shared types, error enum, and the network feed data model.
//!
//! The feed structs mirror the v3 JSON document closely enough for serde to
//! deserialize it directly. Fields the dashboard never reads are omitted;
//! serde ignores them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by vatwatch-core.
#[derive(Debug, Error)]
pub enum VatwatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid feed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VatwatchError>;

// ---------------------------------------------------------------------------
// Feed snapshot
// ---------------------------------------------------------------------------

/// One complete poll of the network feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    #[serde(default)]
    pub general: GeneralInfo,
    #[serde(default)]
    pub pilots: Vec<Pilot>,
    #[serde(default)]
    pub controllers: Vec<Controller>,
    #[serde(default)]
    pub atis: Vec<Atis>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub prefiles: Vec<Prefile>,
    #[serde(default)]
    pub facilities: Vec<Facility>,
}

impl FeedSnapshot {
    /// Parse a feed document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfo {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub reload: u32,
    #[serde(default)]
    pub update_timestamp: String,
    #[serde(default)]
    pub connected_clients: u32,
    #[serde(default)]
    pub unique_users: u32,
}

/// A connected pilot: identity, kinematics, and an optional flight plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pilot {
    pub cid: u64,
    #[serde(default)]
    pub name: String,
    pub callsign: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
    #[serde(default)]
    pub groundspeed: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub transponder: String,
    #[serde(default)]
    pub flight_plan: Option<FlightPlan>,
}

/// Filed intent. Every string may be empty in the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    #[serde(default)]
    pub flight_rules: String,
    #[serde(default)]
    pub aircraft: String,
    #[serde(default)]
    pub aircraft_short: String,
    #[serde(default)]
    pub departure: String,
    #[serde(default)]
    pub arrival: String,
    #[serde(default)]
    pub alternate: String,
    #[serde(default)]
    pub altitude: String,
    #[serde(default)]
    pub deptime: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub route: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    pub cid: u64,
    #[serde(default)]
    pub name: String,
    pub callsign: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub facility: u32,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub visual_range: u32,
    #[serde(default)]
    pub text_atis: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atis {
    pub cid: u64,
    #[serde(default)]
    pub name: String,
    pub callsign: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub facility: u32,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub atis_code: Option<String>,
    #[serde(default)]
    pub text_atis: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub ident: String,
    #[serde(default)]
    pub hostname_or_ip: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub name: String,
}

/// A filed-but-not-connected flight plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefile {
    pub cid: u64,
    pub callsign: String,
    #[serde(default)]
    pub flight_plan: Option<FlightPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: u32,
    pub short: String,
    pub long: String,
}

// ---------------------------------------------------------------------------
// Enriched aircraft
// ---------------------------------------------------------------------------

/// A point on the earth in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// A feed pilot plus fields derived by the enrichment pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedAircraft {
    #[serde(flatten)]
    pub pilot: Pilot,
    /// Approximate arrival airport position, borrowed from another aircraft
    /// departing there in the same snapshot.
    pub destination: Option<LatLon>,
}

impl TrackedAircraft {
    pub fn new(pilot: Pilot) -> Self {
        TrackedAircraft {
            pilot,
            destination: None,
        }
    }

    pub fn flight_plan(&self) -> Option<&FlightPlan> {
        self.pilot.flight_plan.as_ref()
    }

    pub fn position(&self) -> LatLon {
        LatLon {
            lat: self.pilot.latitude,
            lon: self.pilot.longitude,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
