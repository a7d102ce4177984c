use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{Capability, CapabilityProvider, CountdownNotification, Effect, PermissionStatus};
use crate::error::DeviceError;
use crate::session::format_countdown_body;

pub const COUNTDOWN_NOTIFICATION_ID: &str = "timer-countdown";
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Lights Out!";

/// Permission-gated, failure-swallowing wrapper around a capability provider.
///
/// Owns the brightness memo: the level observed at the first dim of a dim
/// episode. Later dims in the same episode leave it untouched, so a restore
/// always returns to the level the user had before the session.
pub struct DeviceEffects {
    provider: Arc<dyn CapabilityProvider>,
    granted: Mutex<HashSet<Capability>>,
    disabled: HashSet<Capability>,
    brightness_memo: Mutex<Option<f32>>,
    notification_title: String,
}

impl DeviceEffects {
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        Self {
            provider,
            granted: Mutex::new(HashSet::new()),
            disabled: HashSet::new(),
            brightness_memo: Mutex::new(None),
            notification_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }

    pub fn with_notification_title(mut self, title: impl Into<String>) -> Self {
        self.notification_title = title.into();
        self
    }

    /// Never request or use `capability`, even if the platform offers it.
    pub fn without(mut self, capability: Capability) -> Self {
        self.disabled.insert(capability);
        self
    }

    /// Ask the provider for every capability and remember the grants.
    ///
    /// Returns the granted capabilities. A failed request counts as denied.
    pub fn request_permissions(&self) -> Vec<Capability> {
        let mut granted = Vec::new();
        for capability in Capability::ALL {
            if self.disabled.contains(&capability) {
                debug!(%capability, "capability disabled by configuration");
                continue;
            }
            match self.provider.request_permission(capability) {
                Ok(PermissionStatus::Granted) => granted.push(capability),
                Ok(PermissionStatus::Denied) => {
                    debug!(%capability, "permission denied");
                }
                Err(e) => {
                    warn!(%capability, error = %e, "permission request failed");
                }
            }
        }

        let mut set = lock(&self.granted);
        set.clear();
        set.extend(granted.iter().copied());
        granted
    }

    pub fn is_granted(&self, capability: Capability) -> bool {
        lock(&self.granted).contains(&capability)
    }

    /// Brightness recorded at the start of the current dim episode.
    pub fn brightness_memo(&self) -> Option<f32> {
        *lock(&self.brightness_memo)
    }

    pub fn apply(&self, effect: Effect) {
        match effect {
            Effect::Dim(level) => self.dim(level),
            Effect::RestoreBrightness => self.restore_brightness(),
            Effect::SetNetworkRadio(enabled) => self.set_network_radio(enabled),
            Effect::SetCountdown(seconds) => self.set_countdown_notification(seconds),
            Effect::ClearCountdown => self.clear_countdown_notification(),
        }
    }

    pub fn dim(&self, level: f32) {
        if !self.gate(Capability::Brightness) {
            return;
        }

        let current = match self.provider.brightness() {
            Ok(level) => level,
            Err(e) => return report("read brightness", e),
        };

        {
            let mut memo = lock(&self.brightness_memo);
            if memo.is_none() {
                *memo = Some(current);
            }
        }

        if let Err(e) = self.provider.set_brightness(level.clamp(0.0, 1.0)) {
            report("dim", e);
        }
    }

    /// Restore the pre-dim brightness and end the dim episode.
    ///
    /// No-op when nothing was dimmed. On failure the memo is kept so a later
    /// restore can still reach the original level.
    pub fn restore_brightness(&self) {
        if !self.gate(Capability::Brightness) {
            return;
        }

        let mut memo = lock(&self.brightness_memo);
        let Some(original) = *memo else {
            debug!("restore requested without prior dim");
            return;
        };

        match self.provider.set_brightness(original) {
            Ok(()) => *memo = None,
            Err(e) => report("restore brightness", e),
        }
    }

    pub fn set_network_radio(&self, enabled: bool) {
        if !self.gate(Capability::NetworkRadio) {
            return;
        }
        if enabled {
            debug!("re-enabling the network radio is best-effort");
        }
        if let Err(e) = self.provider.set_radio_enabled(enabled) {
            report("toggle network radio", e);
        }
    }

    /// Show the countdown, replacing any previous one under the same id.
    pub fn set_countdown_notification(&self, seconds_remaining: u64) {
        if !self.gate(Capability::Notifications) {
            return;
        }

        let notification = CountdownNotification {
            id: COUNTDOWN_NOTIFICATION_ID.to_string(),
            title: self.notification_title.clone(),
            body: format_countdown_body(seconds_remaining),
            remaining_seconds: seconds_remaining,
        };
        if let Err(e) = self.provider.schedule_notification(&notification) {
            report("update countdown notification", e);
        }
    }

    pub fn clear_countdown_notification(&self) {
        if !self.gate(Capability::Notifications) {
            return;
        }
        if let Err(e) = self.provider.dismiss_all_notifications() {
            report("clear countdown notification", e);
        }
    }

    fn gate(&self, capability: Capability) -> bool {
        let granted = self.is_granted(capability);
        if !granted {
            debug!(%capability, "capability not granted, skipping effect");
        }
        granted
    }
}

fn report(action: &str, error: DeviceError) {
    warn!(action, error = %error, "device effect failed");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, NullCapabilities, RecordingCapabilities};

    fn granted_device(brightness: f32) -> (Arc<RecordingCapabilities>, DeviceEffects) {
        let provider = Arc::new(RecordingCapabilities::granting_all(brightness));
        let device = DeviceEffects::new(provider.clone());
        device.request_permissions();
        (provider, device)
    }

    #[test]
    fn repeated_dims_keep_first_original() {
        let (provider, device) = granted_device(0.7);

        device.dim(0.01);
        device.dim(0.01);
        device.restore_brightness();

        assert_eq!(provider.current_brightness(), 0.7);
    }

    #[test]
    fn dim_wake_dim_cycle_restores_true_original() {
        let (provider, device) = granted_device(0.6);

        device.dim(0.01);
        // touch-to-wake brightens the screen without ending the episode
        provider.set_brightness(0.5).unwrap();
        device.dim(0.01);
        device.restore_brightness();

        assert_eq!(provider.current_brightness(), 0.6);
    }

    #[test]
    fn restore_without_dim_changes_nothing() {
        let (provider, device) = granted_device(0.4);

        device.restore_brightness();

        assert!(provider
            .calls()
            .iter()
            .all(|c| !matches!(c, DeviceCall::SetBrightness(_))));
        assert_eq!(provider.current_brightness(), 0.4);
    }

    #[test]
    fn restore_ends_the_dim_episode() {
        let (provider, device) = granted_device(0.8);

        device.dim(0.01);
        device.restore_brightness();
        assert_eq!(device.brightness_memo(), None);

        provider.set_brightness(0.3).unwrap();
        device.dim(0.01);
        device.restore_brightness();
        assert_eq!(provider.current_brightness(), 0.3);
    }

    #[test]
    fn ungranted_capabilities_are_silent_noops() {
        let provider = Arc::new(RecordingCapabilities::granting(0.5, &[]));
        let device = DeviceEffects::new(provider.clone());
        device.request_permissions();

        device.dim(0.01);
        device.set_network_radio(false);
        device.set_countdown_notification(60);
        device.clear_countdown_notification();
        device.restore_brightness();

        let calls = provider.calls();
        assert!(calls
            .iter()
            .all(|c| matches!(c, DeviceCall::RequestPermission(_))));
        assert_eq!(provider.current_brightness(), 0.5);
    }

    #[test]
    fn disabled_capability_is_never_requested() {
        let provider = Arc::new(RecordingCapabilities::granting_all(0.5));
        let device = DeviceEffects::new(provider.clone()).without(Capability::Notifications);

        let granted = device.request_permissions();
        assert!(!granted.contains(&Capability::Notifications));

        device.set_countdown_notification(10);
        assert!(provider.notifications().is_empty());
        assert!(!provider
            .calls()
            .contains(&DeviceCall::RequestPermission(Capability::Notifications)));
    }

    #[test]
    fn null_provider_never_panics() {
        let device = DeviceEffects::new(Arc::new(NullCapabilities));
        assert!(device.request_permissions().is_empty());
        for effect in [
            Effect::Dim(0.01),
            Effect::SetNetworkRadio(false),
            Effect::SetCountdown(10),
            Effect::ClearCountdown,
            Effect::RestoreBrightness,
        ] {
            device.apply(effect);
        }
    }

    #[test]
    fn countdown_uses_stable_identifier() {
        let (provider, device) = granted_device(0.5);

        device.set_countdown_notification(125);
        device.set_countdown_notification(124);

        let notifications = provider.notifications();
        assert_eq!(notifications.len(), 2);
        assert!(notifications
            .iter()
            .all(|n| n.id == COUNTDOWN_NOTIFICATION_ID));
        assert_eq!(notifications[0].body, "Currently LightsOut! 2:05 remaining");
        assert_eq!(provider.visible_notifications(), 1);
    }

    #[test]
    fn provider_failures_are_swallowed() {
        let (provider, device) = granted_device(0.9);
        provider.fail_calls(true);

        device.dim(0.01);
        device.set_countdown_notification(30);
        device.restore_brightness();

        assert_eq!(device.brightness_memo(), None);
        assert_eq!(provider.current_brightness(), 0.9);
    }

    #[test]
    fn failed_restore_keeps_memo_for_retry() {
        let (provider, device) = granted_device(0.9);
        device.dim(0.01);

        provider.fail_calls(true);
        device.restore_brightness();
        assert_eq!(device.brightness_memo(), Some(0.9));

        provider.fail_calls(false);
        device.restore_brightness();
        assert_eq!(provider.current_brightness(), 0.9);
    }
}
