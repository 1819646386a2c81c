//! Figure structure catalog
//!
//! The renderer owns the real figure data; editors only need the part sets
//! and palettes per set type, which is what [`FigureStructure`] exposes.

use std::collections::HashMap;

use figura_core::Gender;

/// One selectable part set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartSet {
    pub id: i32,
    /// `None` for unisex sets
    pub gender: Option<Gender>,
    pub club_level: u8,
    pub selectable: bool,
    /// Sellable sets need to be owned before they can be picked
    pub sellable: bool,
    pub color_layers: usize,
}

impl PartSet {
    pub fn new(id: i32, gender: Option<Gender>) -> Self {
        PartSet {
            id,
            gender,
            club_level: 0,
            selectable: true,
            sellable: false,
            color_layers: 1,
        }
    }

    pub fn club(mut self, level: u8) -> Self {
        self.club_level = level;
        self
    }

    pub fn sellable(mut self) -> Self {
        self.sellable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.selectable = false;
        self
    }

    pub fn layers(mut self, layers: usize) -> Self {
        self.color_layers = layers;
        self
    }

    /// Whether this set may be offered to a user
    pub fn is_offered(&self, gender: Gender, club_level: u8, owned: &[i32]) -> bool {
        self.gender.map_or(true, |g| g == gender)
            && self.selectable
            && self.club_level <= club_level
            && (!self.sellable || owned.contains(&self.id))
    }
}

/// One palette entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteColor {
    pub id: i32,
    pub club_level: u8,
    pub selectable: bool,
}

impl PaletteColor {
    pub fn new(id: i32) -> Self {
        PaletteColor {
            id,
            club_level: 0,
            selectable: true,
        }
    }

    pub fn club(mut self, level: u8) -> Self {
        self.club_level = level;
        self
    }
}

/// Part sets and palettes per set type
pub trait FigureStructure: Send + Sync {
    fn part_sets(&self, set_type: &str) -> &[PartSet];

    fn palette(&self, set_type: &str) -> &[PaletteColor];

    /// Mandatory set types have no "clear" option
    fn is_mandatory(&self, set_type: &str, gender: Gender) -> bool;

    /// Every set type the catalog knows about
    fn set_types(&self) -> Vec<&str>;
}

#[derive(Clone, Debug, Default)]
struct SetTypeEntry {
    parts: Vec<PartSet>,
    palette: Vec<PaletteColor>,
    mandatory: Vec<Gender>,
}

/// In-memory catalog
#[derive(Clone, Debug, Default)]
pub struct StaticFigureStructure {
    entries: HashMap<String, SetTypeEntry>,
    order: Vec<String>,
}

impl StaticFigureStructure {
    pub fn new() -> Self {
        StaticFigureStructure::default()
    }

    fn entry(&mut self, set_type: &str) -> &mut SetTypeEntry {
        if !self.entries.contains_key(set_type) {
            self.order.push(set_type.to_string());
        }
        self.entries.entry(set_type.to_string()).or_default()
    }

    pub fn with_parts(mut self, set_type: &str, parts: Vec<PartSet>) -> Self {
        self.entry(set_type).parts.extend(parts);
        self
    }

    pub fn with_palette(mut self, set_type: &str, colors: Vec<PaletteColor>) -> Self {
        self.entry(set_type).palette.extend(colors);
        self
    }

    pub fn mandatory_for(mut self, set_type: &str, genders: &[Gender]) -> Self {
        self.entry(set_type).mandatory.extend_from_slice(genders);
        self
    }
}

impl FigureStructure for StaticFigureStructure {
    fn part_sets(&self, set_type: &str) -> &[PartSet] {
        self.entries
            .get(set_type)
            .map(|e| e.parts.as_slice())
            .unwrap_or(&[])
    }

    fn palette(&self, set_type: &str) -> &[PaletteColor] {
        self.entries
            .get(set_type)
            .map(|e| e.palette.as_slice())
            .unwrap_or(&[])
    }

    fn is_mandatory(&self, set_type: &str, gender: Gender) -> bool {
        self.entries
            .get(set_type)
            .map_or(false, |e| e.mandatory.contains(&gender))
    }

    fn set_types(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }
}
