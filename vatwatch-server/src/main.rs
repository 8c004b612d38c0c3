//! vatwatch: airport dashboard server + CLI for the VATSIM network feed.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vatwatch_core::board::{
    build_board, AirlineFilter, BoardFilter, BoardQuery, SortOrder, StatusFilter,
};
use vatwatch_core::config::{self, Config};
use vatwatch_core::dashboard::Dashboard;
use vatwatch_core::enrich::enrich_destinations;
use vatwatch_core::metar;
use vatwatch_core::types::FeedSnapshot;

mod feed;
mod poller;
mod web;

use feed::HttpFeed;
use poller::{select_airport, Poller};
use web::AppState;

#[derive(Parser)]
#[command(name = "vatwatch", version, about = "VATSIM airport departures/arrivals board")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the network feed and serve the JSON API
    Serve {
        /// Listen address (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (default from config)
        #[arg(long)]
        port: Option<u16>,

        /// Airport of interest to select at startup
        #[arg(long)]
        airport: Option<String>,

        /// Override the network feed URL
        #[arg(long, env = "VATWATCH_FEED_URL")]
        feed_url: Option<String>,
    },

    /// Print the board for a saved feed snapshot
    Board {
        /// Path to a feed JSON snapshot
        file: PathBuf,

        /// Airport of interest (ICAO)
        #[arg(long)]
        airport: Option<String>,

        /// Airline ICAO prefix, e.g. BAW
        #[arg(long)]
        airline: Option<String>,

        /// all, departures or arrivals
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// Sort by time: asc or desc
        #[arg(long)]
        sort: Option<SortOrder>,
    },

    /// Decode a raw METAR report
    Metar {
        /// Report text; multiple words are joined with spaces
        #[arg(required = true)]
        raw: Vec<String>,
    },

    /// Manage ~/.vatwatch/config.yaml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            airport,
            feed_url,
        } => cmd_serve(host, port, airport, feed_url).await,
        Commands::Board {
            file,
            airport,
            airline,
            status,
            sort,
        } => cmd_board(file, airport, airline, status, sort),
        Commands::Metar { raw } => cmd_metar(&raw.join(" ")),
        Commands::Config { action } => cmd_config(action),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    airport: Option<String>,
    feed_url: Option<String>,
) {
    let Config {
        feed: feed_config,
        dashboard: dashboard_config,
        defaults,
    } = config::load_config();

    let host = host.unwrap_or(dashboard_config.host);
    let port = port.unwrap_or(dashboard_config.port);
    let feed_url = feed_url.unwrap_or(feed_config.url);

    let source = HttpFeed::new(&feed_url, &feed_config.metar_url).unwrap_or_else(|e| {
        eprintln!("Error creating HTTP client: {e}");
        std::process::exit(1);
    });

    let dashboard = Arc::new(RwLock::new(Dashboard::new()));
    let (effect_tx, effect_rx) = mpsc::channel(16);
    let (stop_tx, stop_rx) = watch::channel(false);

    let poller = Poller::new(
        Arc::new(source),
        dashboard.clone(),
        Duration::from_secs(feed_config.poll_secs),
        Duration::from_secs(feed_config.weather_secs),
    );
    let poller_task = tokio::spawn(poller.run(effect_rx, stop_rx));

    if let Some(code) = airport.or(defaults.airport) {
        if let Some(icao) = select_airport(&dashboard, &effect_tx, &code).await {
            info!(%icao, "airport of interest selected");
        }
    }

    let state = Arc::new(AppState {
        dashboard,
        effects: effect_tx,
    });
    let result = web::serve(state, &host, port, shutdown_signal()).await;

    let _ = stop_tx.send(true);
    let _ = poller_task.await;

    if let Err(e) = result {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// ---------------------------------------------------------------------------
// board
// ---------------------------------------------------------------------------

fn cmd_board(
    file: PathBuf,
    airport: Option<String>,
    airline: Option<String>,
    status: StatusFilter,
    sort: Option<SortOrder>,
) {
    let text = std::fs::read_to_string(&file).unwrap_or_else(|e| {
        eprintln!("Error opening {}: {e}", file.display());
        std::process::exit(1);
    });
    let snapshot = FeedSnapshot::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", file.display());
        std::process::exit(1);
    });

    let defaults = config::load_config().defaults;
    let airport = airport.or(defaults.airport);
    let airline = airline.or(defaults.airline);
    if airport.is_none() && airline.is_none() {
        eprintln!("Pick an airport (--airport) or an airline (--airline)");
        std::process::exit(2);
    }

    let query = BoardQuery {
        airport: airport.map(|a| a.to_ascii_uppercase()),
        airline: airline.map(|code| AirlineFilter {
            code,
            aircraft_type: String::new(),
        }),
        filter: BoardFilter {
            status,
            ..BoardFilter::default()
        },
        sort,
    };

    let aircraft = enrich_destinations(&snapshot.pilots);
    let rows = build_board(&aircraft, &query, Utc::now());

    println!();
    println!(
        "Total pilots: {}, {} on board{}",
        snapshot.pilots.len(),
        rows.len(),
        query
            .airport
            .as_deref()
            .map(|a| format!(" at {a}"))
            .unwrap_or_default()
    );
    println!();

    if rows.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Callsign", "Operator", "Aircraft", "From", "To", "Time", "Status", "Alt (ft)", "GS (kts)",
    ]);

    for row in &rows {
        table.add_row(vec![
            Cell::new(&row.callsign),
            Cell::new(row.operator.unwrap_or("-")),
            Cell::new(dash_if_empty(&row.aircraft)),
            Cell::new(dash_if_empty(&row.departure)),
            Cell::new(dash_if_empty(&row.arrival)),
            Cell::new(&row.time),
            Cell::new(row.status.label()),
            Cell::new(format!("{:.0}", row.altitude)),
            Cell::new(format!("{:.0}", row.groundspeed)),
        ]);
    }

    println!("{table}");
}

fn dash_if_empty(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

// ---------------------------------------------------------------------------
// metar
// ---------------------------------------------------------------------------

fn cmd_metar(raw: &str) {
    let Some(report) = metar::parse(&metar::decode_html_entities(raw)) else {
        eprintln!("Not a METAR: need a station and at least one group");
        std::process::exit(1);
    };

    println!();
    for (label, value) in [
        ("Station", report.station.as_str()),
        ("Time", report.time.as_str()),
        ("Wind", report.wind.as_str()),
        ("Visibility", report.visibility.as_str()),
        ("Conditions", report.conditions.as_str()),
        ("Clouds", report.clouds.as_str()),
        ("Temperature", report.temperature.as_str()),
        ("Dewpoint", report.dewpoint.as_str()),
        ("Pressure", report.pressure.as_str()),
    ] {
        println!("  {label:<12} {}", dash_if_empty(value));
    }
    println!("  {:<12} {}", "Category", report.flight_category);
    println!();
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config(action: ConfigAction) {
    match action {
        ConfigAction::Init { force } => {
            let path = config::config_file();
            if path.exists() && !force {
                eprintln!("{} already exists (use --force to overwrite)", path.display());
                std::process::exit(1);
            }
            match config::save_config(&Config::default()) {
                Ok(path) => println!("Wrote {}", path.display()),
                Err(e) => {
                    eprintln!("Error writing config: {e}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Show => {
            println!("# {}", config::config_file().display());
            print!("{}", config::serialize_config(&config::load_config()));
        }
    }
}
