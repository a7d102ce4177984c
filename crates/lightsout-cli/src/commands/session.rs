use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use lightsout_core::device::{CountdownNotification, PermissionStatus, RecordingCapabilities};
use lightsout_core::session::format_clock;
use lightsout_core::{
    Capability, CapabilityProvider, Config, Database, DeviceEffects, DeviceError, DurationInput,
    Event, Mode, PresetStore, SessionController,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Brightness the simulated screen starts at.
const SIMULATED_BRIGHTNESS: f32 = 0.8;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a session in the foreground. Type q + Enter to leave once unlocked.
    Run {
        /// work, study or sleep
        #[arg(long, default_value = "work")]
        mode: Mode,
        /// Hours (0-23)
        #[arg(long)]
        hours: Option<u32>,
        /// Minutes (0-59)
        #[arg(long)]
        minutes: Option<u32>,
        /// Extra seconds, mostly for short manual runs
        #[arg(long)]
        seconds: Option<u64>,
        /// Take the duration from a preset id
        #[arg(long, conflicts_with_all = ["hours", "minutes"])]
        preset: Option<String>,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            mode,
            hours,
            minutes,
            seconds,
            preset,
        } => {
            let config = Config::load()?;
            let total = resolve_duration(hours, minutes, seconds, preset.as_deref())?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_session(config, mode, total))
        }
    }
}

fn resolve_duration(
    hours: Option<u32>,
    minutes: Option<u32>,
    seconds: Option<u64>,
    preset: Option<&str>,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut input = DurationInput::default();

    if let Some(id) = preset {
        let db = Database::open()?;
        let store = PresetStore::open(&db);
        let preset = store
            .get(id)
            .ok_or_else(|| format!("unknown preset: {id}"))?;
        input.apply_preset(&preset);
    } else if hours.is_some() || minutes.is_some() || seconds.is_some() {
        input = DurationInput::new(hours.unwrap_or(0), minutes.unwrap_or(0));
    }

    input
        .total_seconds()
        .checked_add(seconds.unwrap_or(0))
        .ok_or_else(|| "session duration is too long".into())
}

async fn run_session(
    config: Config,
    mode: Mode,
    total_seconds: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut device = DeviceEffects::new(Arc::new(SimulatedDevice::new()))
        .with_notification_title(config.notifications.title.clone());
    if !config.notifications.enabled {
        device = device.without(Capability::Notifications);
    }
    let granted = device.request_permissions();
    info!(?granted, "device permissions");

    let controller = SessionController::with_tick_interval(
        Arc::new(device),
        config.engine_settings(),
        Duration::from_millis(config.session.tick_interval_ms),
    );
    let mut events = controller.events();

    if !controller.start_session(mode, total_seconds).await {
        return Err("session duration must be greater than zero".into());
    }
    println!(
        "{} session for {} (background: {})",
        mode.label(),
        format_clock(total_seconds),
        mode.video_url(&config.media.videos_base_url)
    );

    let mut input = spawn_stdin_reader();
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    if print_event(&event, &controller)? {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(line) = input.recv() => {
                if line.trim().eq_ignore_ascii_case("q") {
                    controller.request_exit().await;
                }
            }
        }
    }

    controller.flush_effects().await;
    Ok(())
}

/// Print one event. Returns true once the session has ended.
fn print_event(
    event: &Event,
    controller: &SessionController,
) -> Result<bool, Box<dyn std::error::Error>> {
    match event {
        Event::SessionTicked {
            seconds_remaining, ..
        } => {
            let state = controller.state();
            if state.is_locked {
                println!(
                    "{}  locked, exit in {}",
                    format_clock(*seconds_remaining),
                    state.unlock_wait_label()
                );
            } else {
                println!("{}", format_clock(*seconds_remaining));
            }
        }
        Event::SessionUnlocked { .. } => {
            println!("exit unlocked, type q + Enter to leave");
        }
        Event::ExitRefused {
            remaining_to_unlock_secs,
            ..
        } => {
            println!("still locked for {remaining_to_unlock_secs}s");
        }
        Event::SessionCompleted { .. } | Event::SessionExited { .. } => {
            println!("{}", serde_json::to_string_pretty(event)?);
            return Ok(true);
        }
        other => {
            println!("{}", serde_json::to_string_pretty(other)?);
        }
    }
    Ok(false)
}

/// Forward stdin lines from a dedicated thread; a blocked read must not
/// hold up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Terminal stand-in for a phone: grants everything and logs each call.
struct SimulatedDevice {
    inner: RecordingCapabilities,
}

impl SimulatedDevice {
    fn new() -> Self {
        Self {
            inner: RecordingCapabilities::granting_all(SIMULATED_BRIGHTNESS),
        }
    }
}

impl CapabilityProvider for SimulatedDevice {
    fn request_permission(&self, capability: Capability) -> Result<PermissionStatus, DeviceError> {
        self.inner.request_permission(capability)
    }

    fn brightness(&self) -> Result<f32, DeviceError> {
        self.inner.brightness()
    }

    fn set_brightness(&self, level: f32) -> Result<(), DeviceError> {
        info!(level, "screen brightness");
        self.inner.set_brightness(level)
    }

    fn schedule_notification(
        &self,
        notification: &CountdownNotification,
    ) -> Result<(), DeviceError> {
        debug!(id = %notification.id, body = %notification.body, "lockscreen notification");
        self.inner.schedule_notification(notification)
    }

    fn dismiss_all_notifications(&self) -> Result<(), DeviceError> {
        info!("lockscreen notification cleared");
        self.inner.dismiss_all_notifications()
    }

    fn set_radio_enabled(&self, enabled: bool) -> Result<(), DeviceError> {
        info!(enabled, "network radio");
        self.inner.set_radio_enabled(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_fields_replace_the_default_duration() {
        assert_eq!(resolve_duration(None, None, None, None).unwrap(), 25 * 60);
        assert_eq!(resolve_duration(None, None, Some(5), None).unwrap(), 5);
        assert_eq!(resolve_duration(Some(1), None, None, None).unwrap(), 3600);
        // out-of-range picker values clamp and wrap
        assert_eq!(
            resolve_duration(Some(30), Some(75), None, None).unwrap(),
            23 * 3600 + 15 * 60
        );
    }

    #[test]
    fn oversized_seconds_are_rejected() {
        let err = resolve_duration(Some(1), None, Some(u64::MAX), None).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn simulated_device_tracks_brightness() {
        let device = SimulatedDevice::new();
        assert_eq!(device.brightness().unwrap(), SIMULATED_BRIGHTNESS);
        device.set_brightness(0.01).unwrap();
        assert_eq!(device.brightness().unwrap(), 0.01);
    }
}
