//! Random figure generation

use figura_category::FigureStructure;
use figura_core::{FigurePart, FigureString, Gender};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Builds random figures from what the catalog offers this user
pub struct FigureRandomizer<'a> {
    structure: &'a dyn FigureStructure,
    club_level: u8,
    owned_figure_sets: &'a [i32],
}

impl<'a> FigureRandomizer<'a> {
    pub fn new(structure: &'a dyn FigureStructure, club_level: u8, owned_figure_sets: &'a [i32]) -> Self {
        FigureRandomizer {
            structure,
            club_level,
            owned_figure_sets,
        }
    }

    /// Random figure for `gender`. Set types in `preserve` are copied from
    /// `current`; mandatory set types always get a part, optional ones
    /// half of the time.
    pub fn randomize<R: Rng>(
        &self,
        rng: &mut R,
        current: &FigureString,
        gender: Gender,
        preserve: &[&str],
    ) -> FigureString {
        let mut figure = current.retain_set_types(preserve);

        let mut set_types = self.structure.set_types();
        set_types.sort_unstable();

        for set_type in set_types {
            if preserve.contains(&set_type) {
                continue;
            }

            let offered: Vec<_> = self
                .structure
                .part_sets(set_type)
                .iter()
                .filter(|set| set.is_offered(gender, self.club_level, self.owned_figure_sets))
                .collect();
            let Some(set) = offered.choose(rng) else {
                continue;
            };

            if !self.structure.is_mandatory(set_type, gender) && !rng.gen_bool(0.5) {
                continue;
            }

            let palette: Vec<i32> = self
                .structure
                .palette(set_type)
                .iter()
                .filter(|c| c.selectable && c.club_level <= self.club_level)
                .map(|c| c.id)
                .collect();
            let colors = (0..set.color_layers)
                .filter_map(|_| palette.choose(rng).copied())
                .collect();

            figure.set(FigurePart::new(set_type, set.id, colors));
        }

        debug!(%gender, parts = figure.len(), "random figure generated");
        figure
    }
}
