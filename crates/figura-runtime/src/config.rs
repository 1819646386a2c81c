//! Editor configuration

use std::path::Path;
use std::time::Duration;

use figura_core::{FiguraError, FiguraResult, Gender};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MALE_FIGURE: &str =
    "hr-100.hd-180-7.ch-215-66.lg-270-79.sh-305-62.ha-1002-70.wa-2007";
pub const DEFAULT_FEMALE_FIGURE: &str = "hr-515-33.hd-600-1.ch-635-70.lg-716-66-62.sh-735-68";
pub const DEFAULT_RESTRICTED_MALE_FIGURE: &str = "ch-3109-92-1408.lg-3116-82-1408.sh-3115-1408-1408";
pub const DEFAULT_RESTRICTED_FEMALE_FIGURE: &str =
    "ch-3112-1408-1408.lg-3116-71-1408.sh-3115-1408-1408";

/// Avatar editor configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Wardrobe slots shown to the user
    pub max_wardrobe_slots: usize,
    /// Countdown period in milliseconds
    pub tick_interval_ms: u64,
    pub default_male_figure: String,
    pub default_female_figure: String,
    pub restricted_male_figure: String,
    pub restricted_female_figure: String,
    /// Club membership level used until the session reports one
    pub club_level: u8,
    /// Effect icon URL; `%id%` is replaced by the effect id
    pub effect_icon_url: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            max_wardrobe_slots: 10,
            tick_interval_ms: 1000,
            default_male_figure: DEFAULT_MALE_FIGURE.to_string(),
            default_female_figure: DEFAULT_FEMALE_FIGURE.to_string(),
            restricted_male_figure: DEFAULT_RESTRICTED_MALE_FIGURE.to_string(),
            restricted_female_figure: DEFAULT_RESTRICTED_FEMALE_FIGURE.to_string(),
            club_level: 0,
            effect_icon_url: "https://images.example.com/c_images/effect_icons/avatar_effect_%id%.png"
                .to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> FiguraResult<Self> {
        let config: EditorConfig = serde_json::from_str(json).map_err(FiguraError::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> FiguraResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> FiguraResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(FiguraError::InvalidConfig(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !self.effect_icon_url.contains("%id%") {
            return Err(FiguraError::InvalidConfig(
                "effect_icon_url must contain %id%".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn default_figure(&self, gender: Gender) -> &str {
        match gender {
            Gender::Male => &self.default_male_figure,
            Gender::Female => &self.default_female_figure,
        }
    }

    pub fn restricted_figure(&self, gender: Gender) -> &str {
        match gender {
            Gender::Male => &self.restricted_male_figure,
            Gender::Female => &self.restricted_female_figure,
        }
    }
}
