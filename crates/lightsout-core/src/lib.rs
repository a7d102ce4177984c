//! # Lights Out Core Library
//!
//! Core logic for the Lights Out focus timer: the user picks a mode and a
//! duration, the screen dims, a lockscreen countdown appears, and leaving
//! early is refused until 20% of the session has elapsed.
//!
//! ## Architecture
//!
//! - **Session Engine**: a tick-driven state machine that returns the device
//!   effects each transition needs instead of performing them
//! - **Session Controller**: tokio driver owning the one-per-second ticker and
//!   an ordered effect queue
//! - **Device Effects**: permission-gated adapter over platform capabilities
//!   (brightness, notifications, network radio)
//! - **Presets**: built-in and persisted custom duration shortcuts
//! - **Storage**: SQLite key-value persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Core session state machine
//! - [`SessionController`]: Async session-facing API
//! - [`DeviceEffects`]: Device side-effect adapter
//! - [`PresetStore`]: Preset persistence
//! - [`Config`]: Application configuration management

pub mod device;
pub mod error;
pub mod events;
pub mod presets;
pub mod session;
pub mod storage;

pub use device::{Capability, CapabilityProvider, DeviceEffects, Effect, NullCapabilities};
pub use error::{ConfigError, CoreError, DatabaseError, DeviceError, ValidationError};
pub use events::Event;
pub use presets::{NewPreset, Preset, PresetStore};
pub use session::{
    DurationInput, Mode, SessionController, SessionEngine, SessionPhase, SessionState,
};
pub use storage::{BlobStore, Config, Database};
