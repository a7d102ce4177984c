//! Device side effects: screen brightness, the lockscreen countdown
//! notification and the network radio.
//!
//! Platforms expose these through a [`CapabilityProvider`]. The
//! [`DeviceEffects`] adapter wraps a provider, gates every call on the
//! permission the user granted, and swallows failures so the session state
//! machine never sees them.

mod effects;
mod recording;

pub use effects::{DeviceEffects, COUNTDOWN_NOTIFICATION_ID, DEFAULT_NOTIFICATION_TITLE};
pub use recording::{DeviceCall, RecordingCapabilities, MAX_RECORDED_CALLS};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DeviceError;

/// A platform capability that needs a user grant before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Brightness,
    Notifications,
    NetworkRadio,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::Brightness,
        Capability::Notifications,
        Capability::NetworkRadio,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Brightness => "brightness",
            Capability::Notifications => "notifications",
            Capability::NetworkRadio => "network radio",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// A device side effect requested by a session transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", content = "value", rename_all = "snake_case")]
pub enum Effect {
    /// Lower the screen brightness to the given level (0.0..=1.0).
    Dim(f32),
    /// Return the screen to the level seen before the first dim.
    RestoreBrightness,
    SetNetworkRadio(bool),
    /// Show or replace the lockscreen countdown.
    SetCountdown(u64),
    ClearCountdown,
}

/// Content of the lockscreen countdown notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownNotification {
    /// Stable identifier; scheduling the same id replaces the previous one.
    pub id: String,
    pub title: String,
    pub body: String,
    pub remaining_seconds: u64,
}

/// Platform capabilities consumed by the device adapter.
///
/// Implementations report failures as [`DeviceError`]; they must not assume
/// the caller retries.
pub trait CapabilityProvider: Send + Sync {
    fn request_permission(&self, capability: Capability) -> Result<PermissionStatus, DeviceError>;

    /// Current screen brightness (0.0..=1.0).
    fn brightness(&self) -> Result<f32, DeviceError>;

    fn set_brightness(&self, level: f32) -> Result<(), DeviceError>;

    fn schedule_notification(&self, notification: &CountdownNotification)
        -> Result<(), DeviceError>;

    fn dismiss_all_notifications(&self) -> Result<(), DeviceError>;

    /// Best-effort. Platforms commonly refuse to re-enable the radio.
    fn set_radio_enabled(&self, enabled: bool) -> Result<(), DeviceError>;
}

/// Provider for platforms or builds that have none of the capabilities.
///
/// Every permission request is denied, so the adapter never calls the
/// remaining methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCapabilities;

impl CapabilityProvider for NullCapabilities {
    fn request_permission(&self, _capability: Capability) -> Result<PermissionStatus, DeviceError> {
        Ok(PermissionStatus::Denied)
    }

    fn brightness(&self) -> Result<f32, DeviceError> {
        Err(DeviceError::Unavailable("brightness".into()))
    }

    fn set_brightness(&self, _level: f32) -> Result<(), DeviceError> {
        Err(DeviceError::Unavailable("brightness".into()))
    }

    fn schedule_notification(
        &self,
        _notification: &CountdownNotification,
    ) -> Result<(), DeviceError> {
        Err(DeviceError::Unavailable("notifications".into()))
    }

    fn dismiss_all_notifications(&self) -> Result<(), DeviceError> {
        Err(DeviceError::Unavailable("notifications".into()))
    }

    fn set_radio_enabled(&self, _enabled: bool) -> Result<(), DeviceError> {
        Err(DeviceError::Unavailable("network radio".into()))
    }
}
