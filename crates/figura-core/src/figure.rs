//! Figure primitives
//!
//! A figure string is a `.`-separated list of parts, each
//! `settype-setid[-color...]`, e.g. `hr-100.hd-180-7.ch-215-66`.
//! Figura treats it as an opaque value with set-type accessors; it never
//! interprets what a set id looks like.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{FiguraError, FiguraResult};

/// Well-known set types
pub mod set_type {
    pub const FACE: &str = "hd";
    pub const HAIR: &str = "hr";
    pub const HAT: &str = "ha";
    pub const HEAD_ACCESSORY: &str = "he";
    pub const EYE_ACCESSORY: &str = "ea";
    pub const FACE_ACCESSORY: &str = "fa";
    pub const SHIRT: &str = "ch";
    pub const CHEST_ACCESSORY: &str = "ca";
    pub const CHEST_PRINT: &str = "cp";
    pub const COAT: &str = "cc";
    pub const TROUSERS: &str = "lg";
    pub const SHOES: &str = "sh";
    pub const WAIST: &str = "wa";
}

/// Avatar gender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Protocol code (`M` / `F`)
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    /// Lenient normalization used for server and link input.
    /// Anything unrecognized falls back to male.
    pub fn normalize(value: &str) -> Gender {
        value.parse().unwrap_or(Gender::Male)
    }
}

impl FromStr for Gender {
    type Err = FiguraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            _ => Err(FiguraError::UnknownGender(s.to_string())),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Avatar facing direction, always within `[MIN, MAX]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Direction(u8);

impl Direction {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 7;
    pub const DEFAULT: Direction = Direction(4);

    /// Normalize any integer direction with wraparound
    #[inline]
    pub fn wrap(value: i32) -> Self {
        let span = (Self::MAX - Self::MIN + 1) as i32;
        Direction((value - Self::MIN as i32).rem_euclid(span) as u8 + Self::MIN)
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Rotate by `step` with wraparound
    #[inline]
    pub fn rotate(self, step: i32) -> Self {
        let span = (Self::MAX - Self::MIN + 1) as i32;
        Self::wrap(self.0 as i32 + step.rem_euclid(span))
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One part of a figure string
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FigurePart {
    pub set_type: String,
    pub set_id: i32,
    pub colors: Vec<i32>,
}

impl FigurePart {
    pub fn new(set_type: impl Into<String>, set_id: i32, colors: Vec<i32>) -> Self {
        FigurePart {
            set_type: set_type.into(),
            set_id,
            colors,
        }
    }
}

impl FromStr for FigurePart {
    type Err = FiguraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FiguraError::MalformedFigurePart(s.to_string());
        let mut fields = s.split('-');

        let set_type = fields.next().filter(|t| !t.is_empty()).ok_or_else(malformed)?;
        if !set_type.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(malformed());
        }

        let set_id = fields
            .next()
            .and_then(|id| id.parse::<i32>().ok())
            .ok_or_else(malformed)?;

        let colors = fields
            .map(|c| c.parse::<i32>().map_err(|_| malformed()))
            .collect::<FiguraResult<Vec<_>>>()?;

        Ok(FigurePart::new(set_type, set_id, colors))
    }
}

impl fmt::Display for FigurePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.set_type, self.set_id)?;
        for color in &self.colors {
            write!(f, "-{}", color)?;
        }
        Ok(())
    }
}

/// Ordered figure composition; at most one part per set type
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FigureString {
    parts: Vec<FigurePart>,
}

impl FigureString {
    pub fn new() -> Self {
        FigureString::default()
    }

    /// Parse, dropping malformed parts instead of failing.
    /// Server-supplied looks go through here.
    pub fn parse_lenient(s: &str) -> Self {
        let mut figure = FigureString::new();
        for segment in s.split('.').filter(|seg| !seg.is_empty()) {
            match segment.parse::<FigurePart>() {
                Ok(part) => figure.set(part),
                Err(e) => warn!("dropping figure segment: {}", e),
            }
        }
        figure
    }

    /// Get the part for a set type
    pub fn get(&self, set_type: &str) -> Option<&FigurePart> {
        self.parts.iter().find(|p| p.set_type == set_type)
    }

    /// Insert or replace the part for its set type, keeping position
    pub fn set(&mut self, part: FigurePart) {
        match self.parts.iter_mut().find(|p| p.set_type == part.set_type) {
            Some(existing) => *existing = part,
            None => self.parts.push(part),
        }
    }

    /// Remove a set type
    pub fn remove(&mut self, set_type: &str) -> Option<FigurePart> {
        let index = self.parts.iter().position(|p| p.set_type == set_type)?;
        Some(self.parts.remove(index))
    }

    /// Replace the colors of an existing part. Returns false if the set type is absent.
    pub fn set_colors(&mut self, set_type: &str, colors: Vec<i32>) -> bool {
        match self.parts.iter_mut().find(|p| p.set_type == set_type) {
            Some(part) => {
                part.colors = colors;
                true
            }
            None => false,
        }
    }

    /// Keep only the given set types
    pub fn retain_set_types(&self, keep: &[&str]) -> FigureString {
        FigureString {
            parts: self
                .parts
                .iter()
                .filter(|p| keep.contains(&p.set_type.as_str()))
                .cloned()
                .collect(),
        }
    }

    pub fn contains(&self, set_type: &str) -> bool {
        self.get(set_type).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FigurePart> {
        self.parts.iter()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl FromStr for FigureString {
    type Err = FiguraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut figure = FigureString::new();
        for segment in s.split('.').filter(|seg| !seg.is_empty()) {
            figure.set(segment.parse()?);
        }
        Ok(figure)
    }
}

impl fmt::Display for FigureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}
