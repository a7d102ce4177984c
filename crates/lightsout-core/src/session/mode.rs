use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the user is doing during a session.
///
/// The mode does not change timer behaviour; it selects the icon and the
/// background video the overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Mode {
    #[default]
    Work,
    Study,
    Sleep,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::Study, Mode::Sleep];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Work => "Work",
            Mode::Study => "Study",
            Mode::Sleep => "Sleep",
        }
    }

    /// Icon token understood by the presentation layer.
    pub fn icon(self) -> &'static str {
        match self {
            Mode::Work => "briefcase-outline",
            Mode::Study => "book-open-variant",
            Mode::Sleep => "moon-waning-crescent",
        }
    }

    /// Background video location under the configured videos bucket.
    pub fn video_url(self, videos_base_url: &str) -> String {
        format!(
            "{}/{}.mp4",
            videos_base_url.trim_end_matches('/'),
            self.label().to_lowercase()
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" => Ok(Mode::Work),
            "study" => Ok(Mode::Study),
            "sleep" => Ok(Mode::Sleep),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}
