//! Mounted lobby display
//!
//! A display runs as one task that owns the content store, the rotation
//! cursors and the refresh coordinator. Timers, change notifications and
//! fetch results all arrive on that task, so state is only ever touched from
//! one place. Backend and weather calls run in spawned tasks and report back
//! through the command channel.
//!
//! The renderer reads [`DisplayView`] snapshots from a watch channel.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use utoipa::ToSchema;

use crate::clock::{local_hour, Clock, DiningPeriod, TimeOfDay};
use crate::content::ContentKind;
use crate::datasource::ContentSource;
use crate::error::AppError;
use crate::featured::FeaturedView;
use crate::fetch::{FetchedBatch, InFlight};
use crate::layout::{Layout, Zone};
use crate::notify::{ChangeCallback, ChangeNotifier, Subscription};
use crate::refresh::{RefreshCoordinator, RefreshState, ResetTick, Timing};
use crate::rotation::{CursorState, Direction, Rotations};
use crate::settings::FlagStore;
use crate::store::{ContentStore, VisibleItems};
use crate::weather::{Weather, WeatherSource};

const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Guest WiFi credentials shown on screen
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WifiInfo {
    pub ssid: String,
    pub password: Option<String>,
}

/// Per-display configuration
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub layout: Layout,
    pub timing: Timing,
    pub utc_offset: FixedOffset,
    pub wifi: Option<WifiInfo>,
}

/// Collaborators a display talks to
#[derive(Clone)]
pub struct DisplayDeps {
    pub source: Arc<dyn ContentSource>,
    pub notifier: Arc<dyn ChangeNotifier>,
    pub weather: Option<Arc<dyn WeatherSource>>,
    pub clock: Arc<dyn Clock>,
    pub flags: Arc<FlagStore>,
}

/// One rotating zone as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ZoneView {
    pub zone: Zone,
    pub cursor: CursorState,
    /// False once manual navigation took over
    pub auto: bool,
    pub total: usize,
    pub last_advanced_at: DateTime<Utc>,
    pub items: VisibleItems,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DisplayView {
    pub now: DateTime<Utc>,
    pub time_of_day: TimeOfDay,
    pub dining_period: DiningPeriod,
    /// Only true until the first fetch of every kind completes
    pub loading: bool,
    pub show_events: bool,
    /// Full resets performed since the process started
    pub resets: u64,
    pub refresh: RefreshState,
    pub weather: Option<Weather>,
    pub wifi: Option<WifiInfo>,
    pub featured: FeaturedView,
    pub zones: Vec<ZoneView>,
}

impl DisplayView {
    pub fn zone(&self, zone: Zone) -> Option<&ZoneView> {
        self.zones.iter().find(|z| z.zone == zone)
    }
}

enum Command {
    Changed(ContentKind),
    Navigate {
        zone: Zone,
        direction: Direction,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    Fetched {
        generation: u64,
        batch: FetchedBatch,
    },
    Weather {
        generation: u64,
        report: Option<Weather>,
    },
    Unmount,
}

/// Handle to a mounted display
pub struct DisplayHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<DisplayView>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DisplayHandle {
    /// Start a display: subscribe to changes, kick off the first fetches and
    /// arm every timer.
    pub async fn mount(deps: DisplayDeps, settings: DisplaySettings) -> Result<Self, AppError> {
        settings.timing.validate()?;

        let (commands, inbox) = mpsc::unbounded_channel();
        let session = Session::new(&settings, deps.clock.now());
        let show_events = deps.flags.show_events().await;
        let initial = render(&session, &settings, deps.clock.now(), 0, show_events);
        let (view_tx, view_rx) = watch::channel(initial);
        let subscriptions = subscribe_all(deps.notifier.as_ref(), &commands);

        let actor = DisplayActor {
            deps,
            settings,
            commands: commands.clone(),
            inbox,
            view: view_tx,
            subscriptions,
            generation: 0,
            resets: 0,
            session,
        };
        let task = tokio::spawn(actor.run());

        Ok(Self {
            commands,
            view: view_rx,
            task: Mutex::new(Some(task)),
        })
    }

    /// Latest published view
    pub fn view(&self) -> DisplayView {
        self.view.borrow().clone()
    }

    /// Receiver that wakes on every published view
    pub fn watch(&self) -> watch::Receiver<DisplayView> {
        self.view.clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Move a zone by one page and stop its auto-advance
    pub async fn navigate(&self, zone: Zone, direction: Direction) -> Result<(), AppError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Navigate {
                zone,
                direction,
                reply,
            })
            .map_err(|_| AppError::DisplayUnmounted)?;
        response.await.map_err(|_| AppError::DisplayUnmounted)?
    }

    /// Stop every timer and listener and wait for the display task to exit.
    /// Fetches still in flight complete, but their results are dropped.
    pub async fn unmount(&self) {
        let _ = self.commands.send(Command::Unmount);
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                tracing::warn!("Display task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Unmount);
    }
}

fn subscribe_all(
    notifier: &dyn ChangeNotifier,
    commands: &mpsc::UnboundedSender<Command>,
) -> Vec<Subscription> {
    ContentKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let commands = commands.clone();
            let callback: ChangeCallback = Arc::new(move || {
                let _ = commands.send(Command::Changed(kind));
            });
            match notifier.subscribe(kind, callback) {
                Ok(subscription) => Some(subscription),
                Err(e) => {
                    tracing::warn!(
                        "Change subscription for {} failed: {}, relying on periodic refresh",
                        kind,
                        e
                    );
                    None
                }
            }
        })
        .collect()
}

/// Transient state of one mount; replaced by a full reset
struct Session {
    started: Instant,
    store: ContentStore,
    rotations: Rotations,
    refresh: RefreshCoordinator,
    in_flight: InFlight,
    weather: Option<Weather>,
    clock_tick: Interval,
    data_refresh: Interval,
    weather_refresh: Interval,
}

impl Session {
    fn new(settings: &DisplaySettings, now: DateTime<Utc>) -> Self {
        Self::seeded(settings, now, ContentStore::new(), None)
    }

    /// Fresh timers and cursors over already-fetched snapshots, so a reset
    /// never blanks the screen while the new fetches are in flight.
    fn seeded(
        settings: &DisplaySettings,
        now: DateTime<Utc>,
        store: ContentStore,
        weather: Option<Weather>,
    ) -> Self {
        let started = Instant::now();
        let timing = settings.timing;
        let refresh = RefreshCoordinator::mount(timing, started, now);

        let mut clock_tick = interval_at(started + CLOCK_TICK, CLOCK_TICK);
        clock_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut data_refresh = interval_at(refresh.first_data_refresh(), timing.data_refresh);
        data_refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut weather_refresh =
            interval_at(started + timing.weather_refresh, timing.weather_refresh);
        weather_refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut rotations = Rotations::new(&settings.layout, started, now);
        for (zone, _) in settings.layout.zones() {
            rotations.resize(*zone, store.zone_len(*zone), now);
        }

        Self {
            started,
            store,
            rotations,
            refresh,
            in_flight: InFlight::default(),
            weather,
            clock_tick,
            data_refresh,
            weather_refresh,
        }
    }
}

fn render(
    session: &Session,
    settings: &DisplaySettings,
    now: DateTime<Utc>,
    resets: u64,
    show_events: bool,
) -> DisplayView {
    let hour = local_hour(now, settings.utc_offset);
    let zones = session
        .rotations
        .iter()
        .map(|z| ZoneView {
            zone: z.zone,
            cursor: z.cursor.state(),
            auto: z.cursor.is_auto(),
            total: z.cursor.len(),
            last_advanced_at: z.cursor.last_advanced_at(),
            items: session.store.zone_items(z.zone, &z.cursor.visible()),
        })
        .collect();

    DisplayView {
        now,
        time_of_day: TimeOfDay::from_hour(hour),
        dining_period: DiningPeriod::from_hour(hour),
        loading: !session.store.is_settled(),
        show_events,
        resets,
        refresh: session.refresh.state().clone(),
        weather: session.weather.clone(),
        wifi: settings.wifi.clone(),
        featured: FeaturedView::at(hour, session.started.elapsed()),
        zones,
    }
}

enum Wake {
    Command(Option<Command>),
    ClockTick(Instant),
    DataRefresh,
    Weather,
    Rotation(Instant),
}

async fn sleep_until_due(due: Option<Instant>) -> Instant {
    match due {
        Some(at) => {
            sleep_until(at).await;
            at
        }
        None => std::future::pending().await,
    }
}

struct DisplayActor {
    deps: DisplayDeps,
    settings: DisplaySettings,
    commands: mpsc::UnboundedSender<Command>,
    inbox: mpsc::UnboundedReceiver<Command>,
    view: watch::Sender<DisplayView>,
    subscriptions: Vec<Subscription>,
    /// Bumped by every full reset; results tagged with an older value are stale
    generation: u64,
    resets: u64,
    session: Session,
}

impl DisplayActor {
    async fn run(mut self) {
        tracing::info!(
            "Display mounted with {} zones, {} change subscriptions",
            self.settings.layout.zones().len(),
            self.subscriptions.len()
        );
        self.start_session();

        loop {
            let next_rotation = self.session.rotations.next_due();
            let weather_enabled = self.deps.weather.is_some();

            let wake = tokio::select! {
                biased;
                command = self.inbox.recv() => Wake::Command(command),
                at = self.session.clock_tick.tick() => Wake::ClockTick(at),
                _ = self.session.data_refresh.tick() => Wake::DataRefresh,
                _ = self.session.weather_refresh.tick(), if weather_enabled => Wake::Weather,
                at = sleep_until_due(next_rotation) => Wake::Rotation(at),
            };

            match wake {
                Wake::Command(None) => break,
                Wake::Command(Some(command)) => {
                    if self.handle(command).is_break() {
                        break;
                    }
                }
                Wake::ClockTick(at) => match self.session.refresh.on_tick(at) {
                    ResetTick::Reset => {
                        // Watchers get the zero frame before the session is replaced.
                        self.publish().await;
                        tokio::task::yield_now().await;
                        self.full_reset();
                    }
                    ResetTick::Countdown(secs) => {
                        tracing::debug!("Display reset in {}s", secs);
                    }
                    ResetTick::Quiet => {}
                },
                Wake::DataRefresh => {
                    for kind in ContentKind::ALL {
                        self.trigger_fetch(kind);
                    }
                }
                Wake::Weather => self.trigger_weather(),
                Wake::Rotation(at) => {
                    let now = self.deps.clock.now();
                    self.session.rotations.advance_due(at, now);
                }
            }

            self.publish().await;
        }

        for subscription in self.subscriptions.drain(..) {
            tracing::debug!("Dropping {} change subscription", subscription.kind());
        }
        tracing::info!("Display unmounted");
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Unmount => return ControlFlow::Break(()),
            Command::Changed(kind) => {
                tracing::debug!("Backend reported a change to {}", kind);
                self.trigger_fetch(kind);
            }
            Command::Navigate {
                zone,
                direction,
                reply,
            } => {
                let now = self.deps.clock.now();
                let result = self
                    .session
                    .rotations
                    .navigate(zone, direction, now)
                    .map(|_| ());
                tracing::debug!("Manual {:?} on {}, auto-advance suspended", direction, zone);
                let _ = reply.send(result);
            }
            Command::Fetched { generation, batch } => self.apply_fetch(generation, batch),
            Command::Weather { generation, report } => {
                if generation != self.generation {
                    return ControlFlow::Continue(());
                }
                match report {
                    Some(weather) => self.session.weather = Some(weather),
                    None => tracing::debug!("Keeping last known weather"),
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn start_session(&mut self) {
        for kind in ContentKind::ALL {
            self.trigger_fetch(kind);
        }
        self.trigger_weather();
    }

    fn trigger_fetch(&mut self, kind: ContentKind) {
        if !self.session.in_flight.try_begin(kind) {
            tracing::debug!("{} fetch already in flight, coalescing", kind);
            return;
        }

        let source = self.deps.source.clone();
        let commands = self.commands.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let batch = FetchedBatch::fetch(kind, source.as_ref()).await;
            // Fails once the display is gone; the result is dropped with it.
            let _ = commands.send(Command::Fetched { generation, batch });
        });
    }

    fn trigger_weather(&mut self) {
        let Some(source) = self.deps.weather.clone() else {
            return;
        };
        let commands = self.commands.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let report = match source.current().await {
                Ok(weather) => Some(weather),
                Err(e) => {
                    tracing::warn!("Weather lookup failed: {}", e);
                    None
                }
            };
            let _ = commands.send(Command::Weather { generation, report });
        });
    }

    fn apply_fetch(&mut self, generation: u64, batch: FetchedBatch) {
        let kind = batch.kind();
        if generation != self.generation {
            tracing::debug!("Dropping {} result issued before the last reset", kind);
            return;
        }

        let now = self.deps.clock.now();
        self.session.in_flight.finish(kind);
        let applied = self.session.store.apply(batch, now);
        self.session.refresh.record_fetch(now, applied.ok);

        if applied.swapped {
            let zones: Vec<Zone> = self
                .session
                .rotations
                .iter()
                .map(|z| z.zone)
                .filter(|zone| zone.kind() == kind)
                .collect();
            for zone in zones {
                let len = self.session.store.zone_len(zone);
                self.session.rotations.resize(zone, len, now);
            }
        }

        tracing::info!(
            "Applied {} fetch (ok: {}, swapped: {})",
            kind,
            applied.ok,
            applied.swapped
        );
    }

    /// Scheduled self-heal: restart timers, cursors and fetches as if freshly
    /// mounted. The last snapshots stay on screen until the new fetches land;
    /// flags live outside the session and are kept.
    fn full_reset(&mut self) {
        self.generation += 1;
        self.resets += 1;
        tracing::info!("Full display reset #{}", self.resets);
        let store = self.session.store.clone();
        let weather = self.session.weather.take();
        self.session = Session::seeded(&self.settings, self.deps.clock.now(), store, weather);
        self.start_session();
    }

    async fn publish(&mut self) {
        let show_events = self.deps.flags.show_events().await;
        let view = render(
            &self.session,
            &self.settings,
            self.deps.clock.now(),
            self.resets,
            show_events,
        );
        self.view.send_replace(view);
    }
}
