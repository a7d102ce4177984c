use serde::{Deserialize, Serialize};

use crate::presets::Preset;

pub const MAX_HOURS: u32 = 23;

/// Hours/minutes picker shown before a session starts.
///
/// Hours clamp to `0..=23`; minutes wrap around (59 -> 0, 0 -> 59) without
/// carrying into hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationInput {
    hours: u32,
    minutes: u32,
}

impl Default for DurationInput {
    fn default() -> Self {
        Self {
            hours: 0,
            minutes: 25,
        }
    }
}

impl DurationInput {
    /// Out-of-range values are clamped (hours) or wrapped (minutes).
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self {
            hours: hours.min(MAX_HOURS),
            minutes: minutes % 60,
        }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn increment_hour(&mut self) {
        self.hours = (self.hours + 1).min(MAX_HOURS);
    }

    pub fn decrement_hour(&mut self) {
        self.hours = self.hours.saturating_sub(1);
    }

    pub fn increment_minute(&mut self) {
        self.minutes = (self.minutes + 1) % 60;
    }

    pub fn decrement_minute(&mut self) {
        self.minutes = (self.minutes + 59) % 60;
    }

    pub fn apply_preset(&mut self, preset: &Preset) {
        *self = Self::new(preset.hours, preset.minutes);
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_twenty_five_minutes() {
        assert_eq!(DurationInput::default().total_seconds(), 1500);
    }

    #[test]
    fn hours_clamp_at_both_ends() {
        let mut input = DurationInput::new(23, 0);
        input.increment_hour();
        assert_eq!(input.hours(), 23);

        let mut input = DurationInput::new(0, 0);
        input.decrement_hour();
        assert_eq!(input.hours(), 0);
    }

    #[test]
    fn minutes_wrap_without_carry() {
        let mut input = DurationInput::new(1, 59);
        input.increment_minute();
        assert_eq!((input.hours(), input.minutes()), (1, 0));

        input.decrement_minute();
        assert_eq!((input.hours(), input.minutes()), (1, 59));
    }

    #[test]
    fn new_normalizes_out_of_range_values() {
        let input = DurationInput::new(40, 75);
        assert_eq!((input.hours(), input.minutes()), (23, 15));
    }

    #[test]
    fn apply_preset_copies_duration() {
        let mut input = DurationInput::default();
        let preset = crate::presets::builtin_presets()
            .into_iter()
            .find(|p| p.id == "workout")
            .unwrap();
        input.apply_preset(&preset);
        assert_eq!(input.total_seconds(), 50 * 60);
    }
}
