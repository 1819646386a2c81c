//! Remaining-time display for the selected effect

use std::fmt;

pub const SECONDS_PER_DAY: u32 = 86_400;
pub const SECONDS_PER_HOUR: u32 = 3_600;

pub const KEY_PERMANENT: &str = "avatareditor.effects.active.permanent";
pub const KEY_DAYS_LEFT: &str = "avatareditor.effects.active.daysleft";
pub const KEY_TIME_LEFT: &str = "avatareditor.effects.active.timeleft";

/// Localization lookup, provided by the host
pub trait Localizer {
    fn localize(&self, key: &str, params: &[(&str, String)]) -> String;
}

/// Derived label for an effect's remaining time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectTimeDisplay {
    /// No effect selected, or the selection is not owned
    Empty,
    Permanent,
    /// Whole days left (at least one)
    DaysLeft(u32),
    TimeLeft { hours: u32, minutes: u32, seconds: u32 },
}

impl EffectTimeDisplay {
    pub fn from_remaining(seconds_left: u32, is_permanent: bool) -> Self {
        if is_permanent {
            return EffectTimeDisplay::Permanent;
        }

        let days = seconds_left / SECONDS_PER_DAY;
        if days > 0 {
            return EffectTimeDisplay::DaysLeft(days);
        }

        EffectTimeDisplay::TimeLeft {
            hours: seconds_left / SECONDS_PER_HOUR,
            minutes: (seconds_left % SECONDS_PER_HOUR) / 60,
            seconds: seconds_left % 60,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, EffectTimeDisplay::Empty)
    }

    /// Render through the host's localization table
    pub fn render(&self, localizer: &dyn Localizer) -> String {
        match self {
            EffectTimeDisplay::Empty => String::new(),
            EffectTimeDisplay::Permanent => localizer.localize(KEY_PERMANENT, &[]),
            EffectTimeDisplay::DaysLeft(days) => {
                localizer.localize(KEY_DAYS_LEFT, &[("days_left", days.to_string())])
            }
            EffectTimeDisplay::TimeLeft { .. } => {
                localizer.localize(KEY_TIME_LEFT, &[("time_left", self.to_string())])
            }
        }
    }
}

/// Untranslated rendering; the clock variant is the bare `HH:MM:SS`
impl fmt::Display for EffectTimeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectTimeDisplay::Empty => Ok(()),
            EffectTimeDisplay::Permanent => f.write_str("Active forever"),
            EffectTimeDisplay::DaysLeft(days) => write!(f, "{} days left", days),
            EffectTimeDisplay::TimeLeft {
                hours,
                minutes,
                seconds,
            } => write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds),
        }
    }
}
