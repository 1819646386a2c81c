//! Protocol message definitions
//!
//! Inbound events arrive already parsed; Figura never sees wire bytes.
//! Outgoing messages are fire-and-forget requests handed to the transport.

use serde::{Deserialize, Serialize};

use crate::{EffectId, Gender, ObjectId};

/// One entry of the owned-effects snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedEffect {
    pub effect: EffectId,
    /// Seconds, 0 = not time-limited
    pub duration: u32,
    /// Remaining seconds when running, 0 when idle
    pub seconds_left_if_active: u32,
    pub is_permanent: bool,
}

/// Payload of effect-added and effect-activated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectGrant {
    pub effect: EffectId,
    pub duration: u32,
    pub is_permanent: bool,
}

/// A look stored in a wardrobe slot. Slots are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLook {
    pub slot: usize,
    pub figure: String,
    pub gender: Gender,
}

/// Inbound server events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// Full owned-effects set; authoritative
    EffectsSnapshot(Vec<OwnedEffect>),
    EffectAdded(EffectGrant),
    EffectActivated(EffectGrant),
    EffectExpired(EffectId),
    FigureSetIds {
        figure_set_ids: Vec<i32>,
        bound_furniture_names: Vec<String>,
    },
    WardrobePage(Vec<SavedLook>),
}

impl ServerEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::EffectsSnapshot(_) => "effects_snapshot",
            ServerEvent::EffectAdded(_) => "effect_added",
            ServerEvent::EffectActivated(_) => "effect_activated",
            ServerEvent::EffectExpired(_) => "effect_expired",
            ServerEvent::FigureSetIds { .. } => "figure_set_ids",
            ServerEvent::WardrobePage(_) => "wardrobe_page",
        }
    }
}

/// Outgoing protocol requests
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutgoingMessage {
    EffectSelected(EffectId),
    FigureUpdate {
        gender: Gender,
        figure: String,
    },
    RestrictedFigureUpdate {
        target: ObjectId,
        gender: Gender,
        figure: String,
    },
    WardrobeRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind() {
        assert_eq!(ServerEvent::EffectExpired(EffectId::new(3)).kind(), "effect_expired");
        assert_eq!(ServerEvent::EffectsSnapshot(vec![]).kind(), "effects_snapshot");
    }

    #[test]
    fn test_saved_look_serde_uses_gender_code() {
        let look = SavedLook {
            slot: 1,
            figure: "hd-180-7".to_string(),
            gender: Gender::Female,
        };
        let json = serde_json::to_string(&look).unwrap();
        assert!(json.contains("\"F\""));
        let back: SavedLook = serde_json::from_str(&json).unwrap();
        assert_eq!(back, look);
    }
}
