//! Timer presets: compiled-in built-ins plus user-created custom presets.

mod store;

pub use store::{LoadState, NewPreset, PresetStore, CUSTOM_PRESETS_KEY, DEFAULT_PRESET_ICON};

use serde::{Deserialize, Serialize};

/// Number of presets shown on the home screen.
pub const QUICK_PRESET_COUNT: usize = 4;

/// A named, reusable duration shortcut. Presets are not tied to a mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub title: String,
    pub hours: u32,
    pub minutes: u32,
    pub icon: String,
    #[serde(default)]
    pub is_custom: bool,
}

impl Preset {
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60
    }

    /// `"1h 30m"`, or `"30m"` when under an hour.
    pub fn duration_label(&self) -> String {
        if self.hours > 0 {
            format!("{}h {}m", self.hours, self.minutes)
        } else {
            format!("{}m", self.minutes)
        }
    }
}

const BUILTINS: [(&str, &str, u32, &str); 4] = [
    ("cooking", "Cooking", 20, "pot-mix"),
    ("workout", "Workout", 50, "weight-lifter"),
    ("cleaning", "Cleaning", 50, "bucket"),
    ("laundry", "Laundry", 25, "washing-machine"),
];

/// Built-in presets in display order.
pub fn builtin_presets() -> Vec<Preset> {
    BUILTINS
        .iter()
        .map(|&(id, title, minutes, icon)| Preset {
            id: id.to_string(),
            title: title.to_string(),
            hours: 0,
            minutes,
            icon: icon.to_string(),
            is_custom: false,
        })
        .collect()
}

pub fn is_builtin_id(id: &str) -> bool {
    BUILTINS.iter().any(|&(builtin, ..)| builtin == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_not_custom() {
        let presets = builtin_presets();
        assert_eq!(presets.len(), 4);
        assert!(presets.iter().all(|p| !p.is_custom));
        assert_eq!(presets[0].id, "cooking");
    }

    #[test]
    fn duration_label_omits_zero_hours() {
        let mut preset = builtin_presets().remove(0);
        assert_eq!(preset.duration_label(), "20m");
        preset.hours = 1;
        preset.minutes = 5;
        assert_eq!(preset.duration_label(), "1h 5m");
        assert_eq!(preset.total_seconds(), 3900);
    }

    #[test]
    fn persisted_record_uses_camel_case() {
        let preset = Preset {
            id: "1700000000000".into(),
            title: "Yoga".into(),
            hours: 0,
            minutes: 30,
            icon: "star-outline".into(),
            is_custom: true,
        };
        let json = serde_json::to_value(&preset).unwrap();
        assert_eq!(json["isCustom"], true);
        assert_eq!(json["minutes"], 30);
    }
}
