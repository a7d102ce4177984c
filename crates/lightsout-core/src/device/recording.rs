use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Capability, CapabilityProvider, CountdownNotification, PermissionStatus};
use crate::error::DeviceError;

/// Calls kept in the log; older ones are dropped first.
pub const MAX_RECORDED_CALLS: usize = 1024;

/// One call made against a [`RecordingCapabilities`] provider.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    RequestPermission(Capability),
    GetBrightness,
    SetBrightness(f32),
    ScheduleNotification(CountdownNotification),
    DismissAllNotifications,
    SetRadioEnabled(bool),
}

#[derive(Debug, Default)]
struct Inner {
    brightness: f32,
    radio_enabled: bool,
    visible: BTreeMap<String, CountdownNotification>,
    calls: VecDeque<DeviceCall>,
    failing: bool,
}

impl Inner {
    fn push_call(&mut self, call: DeviceCall) {
        if self.calls.len() == MAX_RECORDED_CALLS {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }
}

/// In-memory device that grants a fixed set of capabilities and records
/// every call. Used for simulation and tests.
#[derive(Debug)]
pub struct RecordingCapabilities {
    grants: HashSet<Capability>,
    inner: Mutex<Inner>,
}

impl RecordingCapabilities {
    pub fn granting(brightness: f32, grants: &[Capability]) -> Self {
        Self {
            grants: grants.iter().copied().collect(),
            inner: Mutex::new(Inner {
                brightness,
                radio_enabled: true,
                ..Inner::default()
            }),
        }
    }

    pub fn granting_all(brightness: f32) -> Self {
        Self::granting(brightness, &Capability::ALL)
    }

    /// Make every platform call (other than permission requests) fail.
    pub fn fail_calls(&self, failing: bool) {
        self.inner().failing = failing;
    }

    pub fn current_brightness(&self) -> f32 {
        self.inner().brightness
    }

    pub fn radio_enabled(&self) -> bool {
        self.inner().radio_enabled
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.inner().calls.iter().cloned().collect()
    }

    /// Notifications scheduled within the call log, in order.
    pub fn notifications(&self) -> Vec<CountdownNotification> {
        self.inner()
            .calls
            .iter()
            .filter_map(|c| match c {
                DeviceCall::ScheduleNotification(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    /// Notifications currently on screen.
    pub fn visible_notifications(&self) -> usize {
        self.inner().visible.len()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: DeviceCall) -> Result<MutexGuard<'_, Inner>, DeviceError> {
        let mut inner = self.inner();
        inner.push_call(call);
        if inner.failing {
            return Err(DeviceError::Platform("simulated failure".into()));
        }
        Ok(inner)
    }
}

impl CapabilityProvider for RecordingCapabilities {
    fn request_permission(&self, capability: Capability) -> Result<PermissionStatus, DeviceError> {
        self.inner()
            .push_call(DeviceCall::RequestPermission(capability));
        if self.grants.contains(&capability) {
            Ok(PermissionStatus::Granted)
        } else {
            Ok(PermissionStatus::Denied)
        }
    }

    fn brightness(&self) -> Result<f32, DeviceError> {
        let inner = self.record(DeviceCall::GetBrightness)?;
        Ok(inner.brightness)
    }

    fn set_brightness(&self, level: f32) -> Result<(), DeviceError> {
        let mut inner = self.record(DeviceCall::SetBrightness(level))?;
        inner.brightness = level;
        Ok(())
    }

    fn schedule_notification(
        &self,
        notification: &CountdownNotification,
    ) -> Result<(), DeviceError> {
        let mut inner = self.record(DeviceCall::ScheduleNotification(notification.clone()))?;
        inner
            .visible
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    fn dismiss_all_notifications(&self) -> Result<(), DeviceError> {
        let mut inner = self.record(DeviceCall::DismissAllNotifications)?;
        inner.visible.clear();
        Ok(())
    }

    fn set_radio_enabled(&self, enabled: bool) -> Result<(), DeviceError> {
        let mut inner = self.record(DeviceCall::SetRadioEnabled(enabled))?;
        inner.radio_enabled = enabled;
        Ok(())
    }
}
