//! Editor link commands
//!
//! `avatar-editor/<show|hide|toggle>[/<gender>[/<objectId>]]`. A gender
//! segment opens restricted mode for that gender; the object id is the
//! gate the restricted look is saved to.

use std::str::FromStr;

use figura_core::{FiguraError, FiguraResult, Gender, ObjectId};

pub const LINK_PREFIX: &str = "avatar-editor/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Show,
    Hide,
    Toggle,
}

impl FromStr for LinkAction {
    type Err = FiguraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "show" => Ok(LinkAction::Show),
            "hide" => Ok(LinkAction::Hide),
            "toggle" => Ok(LinkAction::Toggle),
            other => Err(FiguraError::UnknownLinkCommand(other.to_string())),
        }
    }
}

/// Parsed editor link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorLink {
    pub action: LinkAction,
    pub restricted_gender: Option<Gender>,
    pub gate_object: Option<ObjectId>,
}

impl EditorLink {
    pub fn parse(url: &str) -> FiguraResult<Self> {
        let rest = url
            .strip_prefix(LINK_PREFIX)
            .ok_or_else(|| FiguraError::ForeignLink(url.to_string()))?;

        let mut segments = rest.split('/').filter(|s| !s.is_empty());
        let action = segments
            .next()
            .ok_or_else(|| FiguraError::UnknownLinkCommand(String::new()))?
            .parse()?;

        let restricted_gender = segments.next().map(Gender::normalize);
        let gate_object = segments
            .next()
            .map(|raw| {
                raw.parse::<i64>()
                    .map(ObjectId::new)
                    .map_err(|_| FiguraError::InvalidObjectId(raw.to_string()))
            })
            .transpose()?;

        Ok(EditorLink {
            action,
            restricted_gender,
            gate_object,
        })
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted_gender.is_some()
    }
}

impl FromStr for EditorLink {
    type Err = FiguraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditorLink::parse(s)
    }
}
