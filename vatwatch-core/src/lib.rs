//! vatwatch-core: pure data and logic for a VATSIM airport board.
//!
//! No async, no network, just algorithms. File I/O is limited to the config
//! module. This crate is shared by the `vatwatch` server and CLI.

pub mod board;
pub mod config;
pub mod dashboard;
pub mod enrich;
pub mod geo;
pub mod metar;
pub mod status;
pub mod types;

// Re-export commonly used types at crate root
pub use board::{build_board, BoardFilter, BoardQuery, BoardRow, SortOrder, StatusFilter};
pub use dashboard::{Dashboard, DashboardEvent, Effect};
pub use enrich::enrich_destinations;
pub use metar::{FlightCategory, Metar};
pub use status::{FlightStatus, TimeDisplay};
pub use types::*;
