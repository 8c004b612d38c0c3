//! Snapshot enrichment: derive what the feed doesn't carry.
//!
//! The feed gives airport codes but no airport positions. Aircraft sitting
//! at their departure airport are the only positional hint available, so a
//! destination coordinate is borrowed from whichever aircraft is departing
//! the same airport in the same snapshot.

use std::collections::HashMap;

use crate::types::{LatLon, Pilot, TrackedAircraft};

// ---------------------------------------------------------------------------
// Destination coordinates
// ---------------------------------------------------------------------------

/// Departure code -> position of the last pilot (in feed order) filing it.
pub fn departure_positions(pilots: &[Pilot]) -> HashMap<&str, LatLon> {
    let mut positions = HashMap::new();
    for pilot in pilots {
        if let Some(fp) = &pilot.flight_plan {
            if !fp.departure.is_empty() {
                positions.insert(
                    fp.departure.as_str(),
                    LatLon {
                        lat: pilot.latitude,
                        lon: pilot.longitude,
                    },
                );
            }
        }
    }
    positions
}

/// Attach approximate destination coordinates to every pilot.
///
/// Codes match exactly as filed. Pilots whose arrival airport nobody is
/// departing from get `None`.
pub fn enrich_destinations(pilots: &[Pilot]) -> Vec<TrackedAircraft> {
    let positions = departure_positions(pilots);

    pilots
        .iter()
        .map(|pilot| {
            let destination = pilot
                .flight_plan
                .as_ref()
                .filter(|fp| !fp.arrival.is_empty())
                .and_then(|fp| positions.get(fp.arrival.as_str()).copied());
            TrackedAircraft {
                pilot: pilot.clone(),
                destination,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Operator lookup
// ---------------------------------------------------------------------------

/// Airline ICAO prefixes -> operator name.
const AIRLINE_PREFIXES: &[(&str, &str)] = &[
    ("AAL", "American Airlines"),
    ("ACA", "Air Canada"),
    ("AFR", "Air France"),
    ("ASA", "Alaska Airlines"),
    ("BAW", "British Airways"),
    ("DAL", "Delta Air Lines"),
    ("DLH", "Lufthansa"),
    ("EIN", "Aer Lingus"),
    ("EZY", "easyJet"),
    ("FDX", "FedEx"),
    ("IBE", "Iberia"),
    ("JBU", "JetBlue Airways"),
    ("KLM", "KLM"),
    ("QFA", "Qantas"),
    ("RYR", "Ryanair"),
    ("SIA", "Singapore Airlines"),
    ("SWA", "Southwest Airlines"),
    ("SWR", "Swiss"),
    ("UAE", "Emirates"),
    ("UAL", "United Airlines"),
    ("UPS", "UPS"),
    ("VIR", "Virgin Atlantic"),
    ("WJA", "WestJet"),
];

/// Look up operator name from callsign prefix.
pub fn lookup_operator(callsign: &str) -> Option<&'static str> {
    let prefix = callsign.get(..3)?.to_ascii_uppercase();
    AIRLINE_PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix.as_str())
        .map(|(_, name)| *name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlightPlan;

    fn pilot(callsign: &str, lat: f64, lon: f64, route: Option<(&str, &str)>) -> Pilot {
        Pilot {
            cid: 1,
            name: String::new(),
            callsign: callsign.into(),
            latitude: lat,
            longitude: lon,
            altitude: 0.0,
            groundspeed: 0.0,
            heading: 0.0,
            transponder: String::new(),
            flight_plan: route.map(|(dep, arr)| FlightPlan {
                departure: dep.into(),
                arrival: arr.into(),
                ..FlightPlan::default()
            }),
        }
    }

    #[test]
    fn test_destination_from_departing_aircraft() {
        let pilots = vec![
            pilot("DAL1", 33.64, -84.43, Some(("KATL", "KLAX"))),
            pilot("UAL2", 38.0, -100.0, Some(("KORD", "KATL"))),
        ];
        let out = enrich_destinations(&pilots);

        assert_eq!(out[1].destination, Some(LatLon { lat: 33.64, lon: -84.43 }));
        // Nobody is departing KLAX.
        assert_eq!(out[0].destination, None);
    }

    #[test]
    fn test_last_departure_wins() {
        let pilots = vec![
            pilot("A", 1.0, 1.0, Some(("KSFO", "KSEA"))),
            pilot("B", 2.0, 2.0, Some(("KSFO", "KSEA"))),
            pilot("C", 9.0, 9.0, Some(("KPDX", "KSFO"))),
        ];
        let out = enrich_destinations(&pilots);
        assert_eq!(out[2].destination, Some(LatLon { lat: 2.0, lon: 2.0 }));
    }

    #[test]
    fn test_empty_codes_ignored() {
        let pilots = vec![
            pilot("A", 1.0, 1.0, Some(("", ""))),
            pilot("B", 2.0, 2.0, Some(("KSFO", ""))),
        ];
        let out = enrich_destinations(&pilots);
        assert!(out.iter().all(|ac| ac.destination.is_none()));
        assert!(!departure_positions(&pilots).contains_key(""));
    }

    #[test]
    fn test_no_flight_plan_untouched() {
        let pilots = vec![pilot("N123AB", 1.0, 1.0, None)];
        let out = enrich_destinations(&pilots);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pilot, pilots[0]);
        assert!(out[0].destination.is_none());
    }

    #[test]
    fn test_zero_coordinate_is_a_real_destination() {
        let pilots = vec![
            pilot("A", 0.0, 0.0, Some(("NULL", "KSFO"))),
            pilot("B", 5.0, 5.0, Some(("KSFO", "NULL"))),
        ];
        let out = enrich_destinations(&pilots);
        assert_eq!(out[1].destination, Some(LatLon { lat: 0.0, lon: 0.0 }));
    }

    #[test]
    fn test_codes_match_exactly() {
        let pilots = vec![
            pilot("A", 1.0, 1.0, Some(("ksfo", "KSEA"))),
            pilot("B", 2.0, 2.0, Some(("KSEA", "KSFO"))),
        ];
        let out = enrich_destinations(&pilots);
        assert!(out[1].destination.is_none());
    }

    #[test]
    fn test_lookup_operator_known() {
        assert_eq!(lookup_operator("BAW123"), Some("British Airways"));
        assert_eq!(lookup_operator("dal456"), Some("Delta Air Lines"));
    }

    #[test]
    fn test_lookup_operator_unknown() {
        assert_eq!(lookup_operator("XYZ999"), None);
        assert_eq!(lookup_operator("AA"), None);
    }
}
