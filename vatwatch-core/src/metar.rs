//! METAR decoding and flight category.
//!
//! Tokens are classified independently against one ordered pattern table
//! (`TOKEN_TABLE`). The first pattern that matches decides the field; tokens
//! matching nothing are dropped. Token 0 is always the station.
//!
//! Visibility is only ever stored as a four-digit metre group or `CAVOK`, so
//! the statute-mile branch of [`visibility_statute_miles`] cannot be reached
//! from [`parse`]. It stays for callers that build reports by other means.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Metres to statute miles.
const METERS_TO_SM: f64 = 0.000621371;

/// Visibility assumed when the group is missing or unrecognised.
const DEFAULT_VISIBILITY_SM: f64 = 10.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Coarse flight-rules classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FlightCategory {
    #[serde(rename = "VFR")]
    Vfr,
    #[serde(rename = "MVFR")]
    Mvfr,
    #[serde(rename = "IFR")]
    Ifr,
    #[serde(rename = "LIFR")]
    Lifr,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl std::fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightCategory::Vfr => write!(f, "VFR"),
            FlightCategory::Mvfr => write!(f, "MVFR"),
            FlightCategory::Ifr => write!(f, "IFR"),
            FlightCategory::Lifr => write!(f, "LIFR"),
            FlightCategory::Unknown => write!(f, "unknown"),
        }
    }
}

/// A decoded report. Empty strings mean the group was not present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metar {
    pub raw: String,
    pub station: String,
    pub time: String,
    pub wind: String,
    pub visibility: String,
    pub conditions: String,
    pub clouds: String,
    pub temperature: String,
    pub dewpoint: String,
    pub pressure: String,
    pub flight_category: FlightCategory,
}

/// Report field a token is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Time,
    Wind,
    Visibility,
    Conditions,
    Clouds,
    TempDew,
    Pressure,
}

// ---------------------------------------------------------------------------
// Token table
// ---------------------------------------------------------------------------

/// Ordered classifier. Order matters: a token is claimed by the first row
/// whose pattern matches.
static TOKEN_TABLE: LazyLock<Vec<(Regex, Field)>> = LazyLock::new(|| {
    [
        (r"^\d{6}Z$", Field::Time),
        (r"^(VRB|\d{3})\d{2}(G\d{2})?KT$", Field::Wind),
        (r"^(\d{4}|CAVOK)$", Field::Visibility),
        (r"^[+-]?(RA|SN|BR|FG|DZ|TS|SH|HZ|FU|DU|SA|PY)", Field::Conditions),
        (r"(FEW|SCT|BKN|OVC|CLR|SKC|NSC|NCD)(\d{3})?", Field::Clouds),
        (r"^M?\d{2}/M?\d{2}$", Field::TempDew),
        (r"^[AQ]\d{4}", Field::Pressure),
    ]
    .into_iter()
    .map(|(pattern, field)| (Regex::new(pattern).unwrap(), field))
    .collect()
});

static METER_VISIBILITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").unwrap());
static SM_VISIBILITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)SM$").unwrap());
static CEILING_LAYER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(BKN|OVC)(\d{3})").unwrap());

/// Classify a single (non-station) token.
pub fn classify_token(token: &str) -> Option<Field> {
    TOKEN_TABLE
        .iter()
        .find(|(re, _)| re.is_match(token))
        .map(|(_, field)| *field)
}

fn append_group(target: &mut String, token: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(token);
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Decode a raw single-line report. Returns `None` for fewer than two tokens.
pub fn parse(raw: &str) -> Option<Metar> {
    let raw = raw.trim();
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }

    let mut metar = Metar {
        raw: raw.to_string(),
        station: tokens[0].to_string(),
        ..Metar::default()
    };

    for &token in &tokens[1..] {
        match classify_token(token) {
            Some(Field::Time) => metar.time = token.to_string(),
            Some(Field::Wind) => metar.wind = token.to_string(),
            Some(Field::Visibility) => metar.visibility = token.to_string(),
            Some(Field::Conditions) => append_group(&mut metar.conditions, token),
            Some(Field::Clouds) => append_group(&mut metar.clouds, token),
            Some(Field::TempDew) => {
                if let Some((temp, dew)) = token.split_once('/') {
                    metar.temperature = temp.to_string();
                    metar.dewpoint = dew.to_string();
                }
            }
            Some(Field::Pressure) => metar.pressure = token.to_string(),
            None => {}
        }
    }

    metar.flight_category = flight_category(&metar.visibility, &metar.clouds);
    Some(metar)
}

// ---------------------------------------------------------------------------
// Flight category
// ---------------------------------------------------------------------------

/// Normalise a visibility group to statute miles.
pub fn visibility_statute_miles(visibility: &str) -> f64 {
    if visibility == "CAVOK" {
        return DEFAULT_VISIBILITY_SM;
    }
    if METER_VISIBILITY.is_match(visibility) {
        return visibility
            .parse::<f64>()
            .map(|m| m * METERS_TO_SM)
            .unwrap_or(DEFAULT_VISIBILITY_SM);
    }
    if let Some(caps) = SM_VISIBILITY.captures(visibility) {
        return caps[1].parse::<f64>().unwrap_or(DEFAULT_VISIBILITY_SM);
    }
    DEFAULT_VISIBILITY_SM
}

/// Lowest broken or overcast layer in feet, `None` when there is no ceiling.
pub fn ceiling_ft(clouds: &str) -> Option<u32> {
    clouds
        .split(' ')
        .filter_map(|layer| CEILING_LAYER.captures(layer))
        .filter_map(|caps| caps[2].parse::<u32>().ok())
        .map(|hundreds| hundreds * 100)
        .min()
}

/// Derive the flight category from the visibility and cloud groups.
pub fn flight_category(visibility: &str, clouds: &str) -> FlightCategory {
    let vis = visibility_statute_miles(visibility);
    let ceiling = ceiling_ft(clouds).map(f64::from).unwrap_or(f64::INFINITY);

    if vis < 1.0 || ceiling < 500.0 {
        FlightCategory::Lifr
    } else if vis < 3.0 || ceiling < 1000.0 {
        FlightCategory::Ifr
    } else if vis < 5.0 || ceiling < 3000.0 {
        FlightCategory::Mvfr
    } else {
        FlightCategory::Vfr
    }
}

// ---------------------------------------------------------------------------
// HTML entities
// ---------------------------------------------------------------------------

/// Decode the HTML entities the weather feed may put in report text.
///
/// Unknown or malformed entities are left as written.
pub fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
