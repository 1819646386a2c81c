//! Category model contract

use std::fmt;

use figura_core::{EffectId, FigureData};

use crate::{CategoryData, FigureStructure};

/// Editor tab identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CategoryName {
    Generic,
    Head,
    Torso,
    Legs,
    Effects,
}

impl CategoryName {
    /// Normal editing offers every tab
    pub const FULL: [CategoryName; 5] = [
        CategoryName::Generic,
        CategoryName::Head,
        CategoryName::Torso,
        CategoryName::Legs,
        CategoryName::Effects,
    ];

    /// Restricted (object gate) editing only offers clothing
    pub const RESTRICTED: [CategoryName; 2] = [CategoryName::Torso, CategoryName::Legs];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryName::Generic => "generic",
            CategoryName::Head => "head",
            CategoryName::Torso => "torso",
            CategoryName::Legs => "legs",
            CategoryName::Effects => "effects",
        }
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only inputs for a rebuild
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    /// The figure being edited; pre-selection follows it
    pub figure: Option<&'a FigureData>,
    /// Owned effect ids in server order
    pub available_effects: &'a [EffectId],
    pub structure: &'a dyn FigureStructure,
    pub club_level: u8,
    /// Figure sets the account owns (unlocks sellable sets)
    pub owned_figure_sets: &'a [i32],
}

/// Mutable handle a model writes its selection through
pub trait SelectionContext {
    /// The figure currently being edited
    fn current_figure(&mut self) -> Option<&mut FigureData>;

    /// Called after an effect grid click has been applied to the figure
    fn effect_selected(&mut self, effect: EffectId);
}

/// A tab of the editor
pub trait CategoryModel: Send {
    fn name(&self) -> CategoryName;

    /// Build the grids from scratch. Safe to call again on every refresh.
    fn init(&mut self, ctx: &BuildContext<'_>);

    fn is_initialized(&self) -> bool;

    fn categories(&self) -> &[CategoryData];

    fn category(&self, name: &str) -> Option<&CategoryData> {
        self.categories().iter().find(|c| c.name() == name)
    }

    /// Grid click. Unknown categories or indices are ignored.
    fn select_part(&mut self, category: &str, index: usize, editor: &mut dyn SelectionContext);

    /// Palette click on one color layer
    fn select_color(
        &mut self,
        category: &str,
        layer: usize,
        index: usize,
        editor: &mut dyn SelectionContext,
    );
}
