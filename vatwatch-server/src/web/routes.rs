//! REST API route handlers.
//!
//! All reads come from the in-memory dashboard; nothing here touches the
//! network. Lock guards are dropped before any `.await`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use vatwatch_core::board::{AirlineFilter, BoardFilter, BoardQuery, SortOrder, StatusFilter};
use vatwatch_core::metar;

use crate::poller::select_airport;
use crate::web::AppState;

// ---------------------------------------------------------------------------
// Query param types
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
pub struct BoardParams {
    airport: Option<String>,
    airline: Option<String>,
    airline_aircraft: Option<String>,
    callsign: Option<String>,
    aircraft: Option<String>,
    status: Option<String>,
    sort: Option<String>,
}

#[derive(Deserialize)]
pub struct AirportBody {
    icao: String,
}

#[derive(Deserialize)]
pub struct DecodeParams {
    raw: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_empty(val: Option<String>) -> Option<String> {
    val.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn bad_request(msg: String) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

impl BoardParams {
    fn into_query(self) -> Result<BoardQuery, String> {
        let status = match self.status.as_deref() {
            Some(s) => s.parse::<StatusFilter>()?,
            None => StatusFilter::All,
        };
        let sort = match non_empty(self.sort) {
            Some(s) => Some(s.parse::<SortOrder>()?),
            None => None,
        };
        let airline = non_empty(self.airline).map(|code| AirlineFilter {
            code,
            aircraft_type: self.airline_aircraft.unwrap_or_default(),
        });

        Ok(BoardQuery {
            airport: non_empty(self.airport).map(|a| a.to_ascii_uppercase()),
            airline,
            filter: BoardFilter {
                callsign: self.callsign.unwrap_or_default(),
                aircraft_type: self.aircraft.unwrap_or_default(),
                status,
            },
            sort,
        })
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// GET /api/board: filtered, optionally sorted board rows.
///
/// Without an `airport` param the dashboard's selected airport is used.
pub async fn api_board(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BoardParams>,
) -> impl IntoResponse {
    let query = match params.into_query() {
        Ok(q) => q,
        Err(e) => return bad_request(e),
    };

    let dashboard = state.dashboard.read().unwrap();
    let rows = dashboard.board(&query, Utc::now());
    let airport = query
        .airport
        .as_deref()
        .or(dashboard.airport())
        .map(str::to_string);

    Json(json!({
        "airport": airport,
        "count": rows.len(),
        "flights": rows,
    }))
    .into_response()
}

// ---------------------------------------------------------------------------
// Airport of interest
// ---------------------------------------------------------------------------

/// GET /api/weather: latest decoded METAR for the selected airport.
pub async fn api_weather(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().unwrap();
    Json(json!({
        "airport": dashboard.airport(),
        "metar": dashboard.weather(),
    }))
}

/// GET /api/controllers: controllers staffing the selected airport.
pub async fn api_controllers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().unwrap();
    Json(serde_json::to_value(dashboard.controllers()).unwrap_or(json!([])))
}

/// GET /api/atis: ATIS stations for the selected airport.
pub async fn api_atis(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().unwrap();
    Json(serde_json::to_value(dashboard.atis()).unwrap_or(json!([])))
}

/// POST /api/airport: select (or with an empty code, clear) the airport.
pub async fn api_select_airport(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AirportBody>,
) -> impl IntoResponse {
    let selected = select_airport(&state.dashboard, &state.effects, &body.icao).await;
    Json(json!({ "airport": selected }))
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// GET /api/status: diagnostic line and poll counters.
pub async fn api_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().unwrap();
    Json(json!({
        "diagnostic": dashboard.diagnostic(),
        "airport": dashboard.airport(),
        "stats": dashboard.stats(),
        "network_update": dashboard.snapshot().general.update_timestamp,
    }))
}

/// GET /api/metar/decode?raw=: decode a raw report without fetching.
pub async fn api_metar_decode(Query(params): Query<DecodeParams>) -> impl IntoResponse {
    let raw = params.raw.unwrap_or_default();
    match metar::parse(&metar::decode_html_entities(&raw)) {
        Some(m) => (StatusCode::OK, Json(json!(m))),
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "report needs a station and at least one group"})),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::RwLock;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use vatwatch_core::dashboard::{Dashboard, DashboardEvent, Effect};
    use vatwatch_core::types::{Controller, FeedSnapshot, FlightPlan, Pilot};

    fn pilot(callsign: &str, dep: &str, arr: &str, speed: f64, deptime: &str) -> Pilot {
        Pilot {
            cid: 100,
            name: String::new(),
            callsign: callsign.into(),
            latitude: 33.94,
            longitude: -118.41,
            altitude: 0.0,
            groundspeed: speed,
            heading: 0.0,
            transponder: "2000".into(),
            flight_plan: Some(FlightPlan {
                aircraft: "B738".into(),
                departure: dep.into(),
                arrival: arr.into(),
                deptime: deptime.into(),
                ..FlightPlan::default()
            }),
        }
    }

    fn test_state() -> (Arc<AppState>, mpsc::Receiver<Effect>) {
        let mut dashboard = Dashboard::new();
        dashboard.apply(DashboardEvent::FeedLoaded(FeedSnapshot {
            pilots: vec![
                pilot("AAL1", "KLAX", "KJFK", 0.0, "1500"),
                pilot("DAL2", "KLAX", "KATL", 0.0, "1400"),
                pilot("UAL3", "KSFO", "KLAX", 0.0, "0900"),
                pilot("BAW4", "EGLL", "KJFK", 480.0, "1000"),
            ],
            controllers: vec![Controller {
                cid: 5,
                name: String::new(),
                callsign: "KLAX_TWR".into(),
                frequency: "133.900".into(),
                facility: 4,
                rating: 3,
                visual_range: 50,
                text_atis: None,
            }],
            ..FeedSnapshot::default()
        }));

        let (tx, rx) = mpsc::channel(8);
        let state = Arc::new(AppState {
            dashboard: Arc::new(RwLock::new(dashboard)),
            effects: tx,
        });
        (state, rx)
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_api_board_by_airport() {
        let (state, _rx) = test_state();
        let (status, json) = get_json(state, "/api/board?airport=KLAX&sort=asc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["airport"], "KLAX");
        assert_eq!(json["count"], 3);
        let callsigns: Vec<_> = json["flights"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["callsign"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(callsigns, vec!["DAL2", "AAL1", "UAL3"]);
        assert_eq!(json["flights"][0]["time"], "1400Z");
        assert_eq!(json["flights"][2]["time"], "landed");
        assert_eq!(json["flights"][2]["status"], "arrived");
    }

    #[tokio::test]
    async fn test_api_board_status_filter() {
        let (state, _rx) = test_state();
        let (_, json) = get_json(state, "/api/board?airport=klax&status=arrivals").await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["flights"][0]["callsign"], "UAL3");
    }

    #[tokio::test]
    async fn test_api_board_lowercase_airport_echoed_upper() {
        let (state, _rx) = test_state();
        let (status, json) = get_json(state, "/api/board?airport=klax").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["airport"], "KLAX");
        assert_eq!(json["count"], 3);
    }

    #[tokio::test]
    async fn test_api_board_airline_only() {
        let (state, _rx) = test_state();
        let (_, json) = get_json(state, "/api/board?airline=baw").await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["flights"][0]["operator"], "British Airways");
        assert!(json["airport"].is_null());
    }

    #[tokio::test]
    async fn test_api_board_empty_without_selection() {
        let (state, _rx) = test_state();
        let (status, json) = get_json(state, "/api/board").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_api_board_bad_params() {
        let (state, _rx) = test_state();
        let (status, json) = get_json(state.clone(), "/api/board?airport=KLAX&status=sideways").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("sideways"));

        let (status, _) = get_json(state, "/api/board?airport=KLAX&sort=up").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_select_airport() {
        let (state, mut rx) = test_state();
        let app = crate::web::build_router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/airport")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"icao":"klax"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["airport"], "KLAX");
        assert_eq!(rx.try_recv().unwrap(), Effect::FetchWeather("KLAX".into()));

        // The selected airport now drives the board and controller list.
        let (_, board) = get_json(state.clone(), "/api/board").await;
        assert_eq!(board["count"], 3);
        let (_, ctrl) = get_json(state, "/api/controllers").await;
        assert_eq!(ctrl.as_array().unwrap().len(), 1);
        assert_eq!(ctrl[0]["callsign"], "KLAX_TWR");
    }

    #[tokio::test]
    async fn test_api_weather_and_atis_empty() {
        let (state, _rx) = test_state();
        let (status, json) = get_json(state.clone(), "/api/weather").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["metar"].is_null());

        let (_, atis) = get_json(state, "/api/atis").await;
        assert_eq!(atis.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_api_weather_after_load() {
        let (state, _rx) = test_state();
        {
            let mut dashboard = state.dashboard.write().unwrap();
            dashboard.apply(DashboardEvent::AirportSelected("KLAX".into()));
            dashboard.apply(DashboardEvent::WeatherLoaded {
                icao: "KLAX".into(),
                metar: metar::parse("KLAX 211851Z 25008KT 1600 BR OVC004 12/11 A2992"),
            });
        }
        let (_, json) = get_json(state, "/api/weather").await;
        assert_eq!(json["airport"], "KLAX");
        assert_eq!(json["metar"]["flight_category"], "LIFR");
        assert_eq!(json["metar"]["conditions"], "BR");
    }

    #[tokio::test]
    async fn test_api_status() {
        let (state, _rx) = test_state();
        let (status, json) = get_json(state, "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["diagnostic"], "Total pilots: 4");
        assert_eq!(json["stats"]["feed_polls"], 1);
        assert_eq!(json["stats"]["controllers"], 1);
    }

    #[tokio::test]
    async fn test_api_metar_decode() {
        let (state, _rx) = test_state();
        let (status, json) = get_json(
            state.clone(),
            "/api/metar/decode?raw=KLAX%20211851Z%2025008KT%2010SM%20FEW250%2022%2F12%20A3001",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["station"], "KLAX");
        assert_eq!(json["temperature"], "22");
        assert_eq!(json["flight_category"], "VFR");

        let (status, _) = get_json(state, "/api/metar/decode?raw=KLAX").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
