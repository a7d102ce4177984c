//! Async driver for [`SessionEngine`].
//!
//! Owns the single ticker task of the current session and an ordered effect
//! queue. Transitions are computed under the engine lock and their effects
//! are queued before the lock is released, so the queue order always matches
//! the order of the transitions. A single worker drains the queue and applies
//! each effect on the blocking pool, one at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::engine::{EngineSettings, SessionEngine, SessionState, Transition};
use super::mode::Mode;
use crate::device::{DeviceEffects, Effect};
use crate::events::Event;

const EVENT_BUFFER: usize = 64;

/// `tokio::time::interval` panics on a zero period.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

enum EffectMessage {
    Apply(Effect),
    Flush(oneshot::Sender<()>),
}

/// Session-facing API for the presentation layer.
///
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct SessionController {
    engine: Arc<Mutex<SessionEngine>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    effects: mpsc::UnboundedSender<EffectMessage>,
    state: Arc<watch::Sender<SessionState>>,
    events: broadcast::Sender<Event>,
    tick_interval: Duration,
}

impl SessionController {
    pub fn new(device: Arc<DeviceEffects>, settings: EngineSettings) -> Self {
        Self::with_tick_interval(device, settings, Duration::from_secs(1))
    }

    /// A zero `tick_interval` is raised to [`MIN_TICK_INTERVAL`].
    pub fn with_tick_interval(
        device: Arc<DeviceEffects>,
        settings: EngineSettings,
        tick_interval: Duration,
    ) -> Self {
        let tick_interval = if tick_interval.is_zero() {
            warn!("zero tick interval, using {MIN_TICK_INTERVAL:?}");
            MIN_TICK_INTERVAL
        } else {
            tick_interval
        };

        let (effects, effect_rx) = mpsc::unbounded_channel();
        spawn_effect_worker(device, effect_rx);

        let (state, _) = watch::channel(SessionState::default());
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            engine: Arc::new(Mutex::new(SessionEngine::with_settings(settings))),
            ticker: Arc::new(Mutex::new(None)),
            effects,
            state: Arc::new(state),
            events,
            tick_interval,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn format_remaining(&self) -> String {
        self.state().format_remaining()
    }

    pub fn unlock_wait_label(&self) -> String {
        self.state().unlock_wait_label()
    }

    pub async fn snapshot(&self) -> Event {
        self.engine.lock().await.snapshot()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session. Returns false when the start was ignored (zero
    /// duration or a session already running).
    pub async fn start_session(&self, mode: Mode, total_seconds: u64) -> bool {
        let mut engine = self.engine.lock().await;
        let Some(transition) = engine.start(mode, total_seconds) else {
            debug!(%mode, total_seconds, "start ignored");
            return false;
        };

        info!(%mode, total_seconds, "session started");
        self.spawn_ticker().await;
        publish(&self.state, &self.events, &self.effects, &engine, transition);
        true
    }

    /// Ask to end the session early. Returns true if the session ended.
    pub async fn request_exit(&self) -> bool {
        let mut engine = self.engine.lock().await;
        let Some(transition) = engine.request_exit() else {
            return false;
        };

        let ended = transition.ends_session();
        if ended {
            // No tick may fire once teardown effects are queued.
            self.cancel_ticker().await;
            info!("session exited early");
        } else {
            debug!(
                wait = %engine.unlock_wait_label(),
                "exit refused, session still locked"
            );
        }
        publish(&self.state, &self.events, &self.effects, &engine, transition);
        ended
    }

    /// Wait until every effect queued so far has been applied.
    pub async fn flush_effects(&self) {
        let (done, wait) = oneshot::channel();
        if self.effects.send(EffectMessage::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let engine = self.engine.clone();
        let state = self.state.clone();
        let events = self.events.clone();
        let effects = self.effects.clone();
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            // Missed ticks are delivered in a burst, so every elapsed period
            // produces exactly one engine tick.
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;

                let mut guard = engine.lock().await;
                let Some(transition) = guard.tick() else {
                    break;
                };
                let ended = transition.ends_session();
                publish(&state, &events, &effects, &guard, transition);
                if ended {
                    info!("session completed");
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

fn publish(
    state: &watch::Sender<SessionState>,
    events: &broadcast::Sender<Event>,
    effects: &mpsc::UnboundedSender<EffectMessage>,
    engine: &SessionEngine,
    transition: Transition,
) {
    for effect in transition.effects {
        if effects.send(EffectMessage::Apply(effect)).is_err() {
            warn!(?effect, "effect worker stopped, dropping effect");
        }
    }
    state.send_replace(*engine.state());
    for event in transition.events {
        // No subscribers is fine.
        let _ = events.send(event);
    }
}

fn spawn_effect_worker(
    device: Arc<DeviceEffects>,
    mut rx: mpsc::UnboundedReceiver<EffectMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                EffectMessage::Apply(effect) => {
                    let device = device.clone();
                    let applied = tokio::task::spawn_blocking(move || device.apply(effect)).await;
                    if let Err(e) = applied {
                        warn!(?effect, error = %e, "device effect aborted");
                    }
                }
                EffectMessage::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    })
}
