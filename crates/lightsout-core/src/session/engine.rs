//! Session engine implementation.
//!
//! The session engine is a tick-driven state machine. It does not use
//! internal threads or clocks - the caller delivers exactly one `tick()` per
//! elapsed second (see [`SessionController`](super::SessionController)).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Locked -> Unlocked -> Idle
//!           \_________________/
//!            natural completion
//! ```
//!
//! Every command returns a [`Transition`]: the events describing what
//! happened and the device effects to issue, in order. The engine never
//! performs effects itself, so a failing device can not corrupt it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new();
//! engine.start(Mode::Work, 1500);
//! // Once per second:
//! engine.tick();
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::mode::Mode;
use crate::device::Effect;
use crate::events::Event;

/// Brightness requested while a session runs.
pub const DEFAULT_DIM_LEVEL: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    /// Running, exit refused (20% rule active).
    Locked,
    /// Running, exit allowed.
    Unlocked,
}

/// What the user asked for when pressing start. Immutable for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    pub mode: Mode,
    pub total_seconds: u64,
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub config: SessionConfig,
    pub seconds_remaining: u64,
    pub is_active: bool,
    pub is_locked: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            config: SessionConfig::default(),
            seconds_remaining: 0,
            is_active: false,
            is_locked: true,
        }
    }
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match (self.is_active, self.is_locked) {
            (false, _) => SessionPhase::Idle,
            (true, true) => SessionPhase::Locked,
            (true, false) => SessionPhase::Unlocked,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.config
            .total_seconds
            .saturating_sub(self.seconds_remaining)
    }

    /// Seconds that must elapse before exit is allowed: `ceil(total * 0.2)`.
    ///
    /// Both the unlock transition and the wait label use this value.
    pub fn unlock_threshold(&self) -> u64 {
        unlock_threshold(self.config.total_seconds)
    }

    pub fn remaining_to_unlock(&self) -> u64 {
        self.unlock_threshold().saturating_sub(self.elapsed_secs())
    }

    /// Remaining time as `MM:SS`. Minutes are not capped at 59.
    pub fn format_remaining(&self) -> String {
        format_clock(self.seconds_remaining)
    }

    /// How long until exit is allowed, e.g. `"45 sec"` or `"5 min"`.
    pub fn unlock_wait_label(&self) -> String {
        let remaining = self.remaining_to_unlock();
        if remaining >= 60 {
            format!("{} min", remaining.div_ceil(60))
        } else {
            format!("{remaining} sec")
        }
    }
}

/// `ceil(total * 0.2)` in integer arithmetic.
pub fn unlock_threshold(total_seconds: u64) -> u64 {
    total_seconds.div_ceil(5)
}

pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Result of one state-machine command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub events: Vec<Event>,
    /// Device effects in the order they must be issued.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// True if the transition ended the session.
    pub fn ends_session(&self) -> bool {
        self.events.iter().any(|e| {
            matches!(
                e,
                Event::SessionCompleted { .. } | Event::SessionExited { .. }
            )
        })
    }
}

/// Knobs the engine takes from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub dim_level: f32,
    pub disable_radio: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dim_level: DEFAULT_DIM_LEVEL,
            disable_radio: true,
        }
    }
}

/// Core session engine.
#[derive(Debug, Clone, Default)]
pub struct SessionEngine {
    state: SessionState,
    settings: EngineSettings,
}

impl SessionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            state: SessionState::default(),
            settings,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn format_remaining(&self) -> String {
        self.state.format_remaining()
    }

    pub fn unlock_wait_label(&self) -> String {
        self.state.unlock_wait_label()
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase(),
            mode: self.state.config.mode,
            total_seconds: self.state.config.total_seconds,
            seconds_remaining: self.state.seconds_remaining,
            remaining: self.state.format_remaining(),
            unlock_wait: self.state.unlock_wait_label(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session. Ignored (returns `None`) when a session is already
    /// running or the duration is zero.
    pub fn start(&mut self, mode: Mode, total_seconds: u64) -> Option<Transition> {
        if self.state.is_active || total_seconds == 0 {
            return None;
        }

        self.state = SessionState {
            config: SessionConfig {
                mode,
                total_seconds,
            },
            seconds_remaining: total_seconds,
            is_active: true,
            is_locked: true,
        };

        let mut effects = vec![Effect::Dim(self.settings.dim_level)];
        if self.settings.disable_radio {
            effects.push(Effect::SetNetworkRadio(false));
        }
        effects.push(Effect::SetCountdown(total_seconds));

        Some(Transition {
            events: vec![Event::SessionStarted {
                mode,
                total_seconds,
                unlock_after_secs: self.state.unlock_threshold(),
                at: Utc::now(),
            }],
            effects,
        })
    }

    /// Advance by one elapsed second. Returns `None` when idle.
    pub fn tick(&mut self) -> Option<Transition> {
        if !self.state.is_active {
            return None;
        }

        // Compute the next (remaining, locked) pair from the previous one,
        // then commit both together.
        let remaining = self.state.seconds_remaining.saturating_sub(1);
        let elapsed = self.state.config.total_seconds - remaining;
        let unlocks = self.state.is_locked && elapsed >= self.state.unlock_threshold();

        self.state.seconds_remaining = remaining;
        self.state.is_locked = self.state.is_locked && !unlocks;

        let now = Utc::now();
        let mut transition = Transition::default();
        transition.push_event(Event::SessionTicked {
            seconds_remaining: remaining,
            at: now,
        });
        if unlocks {
            transition.push_event(Event::SessionUnlocked {
                elapsed_secs: elapsed,
                at: now,
            });
        }

        if remaining == 0 {
            let config = self.state.config;
            self.teardown(&mut transition);
            transition.push_event(Event::SessionCompleted {
                mode: config.mode,
                total_seconds: config.total_seconds,
                at: now,
            });
        } else {
            transition.effects.push(Effect::SetCountdown(remaining));
        }

        Some(transition)
    }

    /// User-initiated exit. Refused while locked, with no state change and no
    /// effects. Returns `None` when idle.
    pub fn request_exit(&mut self) -> Option<Transition> {
        if !self.state.is_active {
            return None;
        }

        if self.state.is_locked {
            return Some(Transition {
                events: vec![Event::ExitRefused {
                    remaining_to_unlock_secs: self.state.remaining_to_unlock(),
                    at: Utc::now(),
                }],
                effects: Vec::new(),
            });
        }

        let ended = self.state;
        let mut transition = Transition::default();
        self.teardown(&mut transition);
        transition.push_event(Event::SessionExited {
            mode: ended.config.mode,
            elapsed_secs: ended.elapsed_secs(),
            seconds_remaining: ended.seconds_remaining,
            at: Utc::now(),
        });
        Some(transition)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn teardown(&mut self, transition: &mut Transition) {
        self.state = SessionState::default();
        transition.effects.push(Effect::RestoreBrightness);
        transition.effects.push(Effect::ClearCountdown);
    }
}
