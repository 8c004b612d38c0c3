//! Background poller: the only scheduler in the process.
//!
//! Two loops, one per timer. The feed timer runs for the life of the poller
//! and fires immediately on start. The weather timer exists only while an
//! airport is selected; a `FetchWeather` effect recreates it (first tick is
//! immediate) and `StopWeather` drops it. Each loop awaits its fetch before
//! taking the next tick, so fetches of one kind never overlap, while the two
//! kinds run independently.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use vatwatch_core::dashboard::{Dashboard, DashboardEvent, Effect};

use crate::feed::FeedSource;

pub struct Poller<S: FeedSource> {
    source: Arc<S>,
    dashboard: Arc<RwLock<Dashboard>>,
    feed_every: Duration,
    weather_every: Duration,
}

impl<S: FeedSource + 'static> Poller<S> {
    pub fn new(
        source: Arc<S>,
        dashboard: Arc<RwLock<Dashboard>>,
        feed_every: Duration,
        weather_every: Duration,
    ) -> Self {
        Poller {
            source,
            dashboard,
            feed_every,
            weather_every,
        }
    }

    /// Run until `shutdown` flips to true or its sender is dropped. The feed
    /// loop runs on its own task; the weather loop runs on this one.
    pub async fn run(
        self,
        effects: mpsc::Receiver<Effect>,
        shutdown: watch::Receiver<bool>,
    ) {
        info!(
            feed_secs = self.feed_every.as_secs(),
            weather_secs = self.weather_every.as_secs(),
            "poller started"
        );

        let poller = Arc::new(self);
        let feed_task = tokio::spawn(poller.clone().feed_loop(shutdown.clone()));
        poller.weather_loop(effects, shutdown).await;
        if let Err(e) = feed_task.await {
            warn!(error = %e, "feed loop ended abnormally");
        }

        info!("poller shutting down");
    }

    async fn feed_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut feed_timer = interval(self.feed_every);
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = feed_timer.tick() => self.poll_feed().await,
            }
        }
    }

    async fn weather_loop(
        &self,
        mut effects: mpsc::Receiver<Effect>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut weather_timer: Option<Interval> = None;
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tick(&mut weather_timer) => self.poll_weather().await,
                Some(effect) = effects.recv() => match effect {
                    Effect::FetchWeather(icao) => {
                        debug!(%icao, "weather timer restarted");
                        weather_timer = Some(interval(self.weather_every));
                    }
                    Effect::StopWeather => {
                        debug!("weather timer stopped");
                        weather_timer = None;
                    }
                },
            }
        }
    }

    async fn poll_feed(&self) {
        let event = match self.source.snapshot().await {
            Ok(snapshot) => {
                info!(
                    pilots = snapshot.pilots.len(),
                    controllers = snapshot.controllers.len(),
                    "feed updated"
                );
                DashboardEvent::FeedLoaded(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "feed fetch failed");
                DashboardEvent::FeedFailed(e.to_string())
            }
        };
        self.apply(event);
    }

    async fn poll_weather(&self) {
        let Some(icao) = self.read_airport() else {
            return;
        };

        let event = match self.source.metar(&icao).await {
            Ok(metar) => {
                match &metar {
                    Some(m) => info!(%icao, category = %m.flight_category, "weather updated"),
                    None => warn!(%icao, "no usable METAR"),
                }
                DashboardEvent::WeatherLoaded { icao, metar }
            }
            Err(e) => {
                warn!(%icao, error = %e, "weather fetch failed");
                DashboardEvent::WeatherFailed {
                    icao,
                    error: e.to_string(),
                }
            }
        };
        self.apply(event);
    }

    fn read_airport(&self) -> Option<String> {
        let dashboard = self.dashboard.read().unwrap();
        dashboard.airport().map(str::to_string)
    }

    fn apply(&self, event: DashboardEvent) {
        let mut dashboard = self.dashboard.write().unwrap();
        dashboard.apply(event);
    }
}

fn interval(period: Duration) -> Interval {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

/// Tick an optional timer; a missing timer never fires.
async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Select an airport on the dashboard and hand the resulting effects to the
/// poller. Returns the airport now selected.
pub async fn select_airport(
    dashboard: &RwLock<Dashboard>,
    effects: &mpsc::Sender<Effect>,
    code: &str,
) -> Option<String> {
    let (pending, selected) = {
        let mut dashboard = dashboard.write().unwrap();
        let pending = dashboard.apply(DashboardEvent::AirportSelected(code.to_string()));
        (pending, dashboard.airport().map(str::to_string))
    };

    for effect in pending {
        if effects.send(effect).await.is_err() {
            warn!("poller gone, effect dropped");
        }
    }
    selected
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
