mod controller;
mod duration;
mod engine;
mod mode;

pub use controller::SessionController;
pub use duration::{DurationInput, MAX_HOURS};
pub use engine::{
    format_clock, unlock_threshold, EngineSettings, SessionConfig, SessionEngine, SessionPhase,
    SessionState, Transition, DEFAULT_DIM_LEVEL,
};
pub use mode::Mode;

/// Lockscreen notification body, e.g. `Currently LightsOut! 4:05 remaining`.
pub fn format_countdown_body(remaining_seconds: u64) -> String {
    format!(
        "Currently LightsOut! {}:{:02} remaining",
        remaining_seconds / 60,
        remaining_seconds % 60
    )
}
