//! Figure-part category models (generic, head, torso, legs)

use figura_core::{set_type, FigurePart, Gender};
use tracing::debug;

use crate::{
    BuildContext, CategoryData, CategoryModel, CategoryName, ColorItem, PartItem,
    SelectionContext,
};

const GENERIC_SETS: &[&str] = &[set_type::FACE];
const HEAD_SETS: &[&str] = &[
    set_type::HAIR,
    set_type::HAT,
    set_type::HEAD_ACCESSORY,
    set_type::EYE_ACCESSORY,
    set_type::FACE_ACCESSORY,
];
const TORSO_SETS: &[&str] = &[
    set_type::SHIRT,
    set_type::COAT,
    set_type::CHEST_ACCESSORY,
    set_type::CHEST_PRINT,
];
const LEGS_SETS: &[&str] = &[set_type::TROUSERS, set_type::SHOES, set_type::WAIST];

/// One grid per set type; a click rewrites that set type in the figure
#[derive(Debug)]
pub struct FigurePartModel {
    name: CategoryName,
    set_types: &'static [&'static str],
    categories: Vec<CategoryData>,
    initialized: bool,
}

impl FigurePartModel {
    fn with_sets(name: CategoryName, set_types: &'static [&'static str]) -> Self {
        FigurePartModel {
            name,
            set_types,
            categories: Vec::new(),
            initialized: false,
        }
    }

    pub fn generic() -> Self {
        Self::with_sets(CategoryName::Generic, GENERIC_SETS)
    }

    pub fn head() -> Self {
        Self::with_sets(CategoryName::Head, HEAD_SETS)
    }

    pub fn torso() -> Self {
        Self::with_sets(CategoryName::Torso, TORSO_SETS)
    }

    pub fn legs() -> Self {
        Self::with_sets(CategoryName::Legs, LEGS_SETS)
    }

    /// Part model for a tab; effects are not figure parts
    pub fn for_category(name: CategoryName) -> Option<Self> {
        match name {
            CategoryName::Generic => Some(Self::generic()),
            CategoryName::Head => Some(Self::head()),
            CategoryName::Torso => Some(Self::torso()),
            CategoryName::Legs => Some(Self::legs()),
            CategoryName::Effects => None,
        }
    }

    pub fn set_types(&self) -> &[&str] {
        self.set_types
    }

    fn build_category(set_type: &str, ctx: &BuildContext<'_>) -> CategoryData {
        let gender = ctx.figure.map(|f| f.gender()).unwrap_or(Gender::Male);
        let structure = ctx.structure;

        let mut parts = Vec::new();
        if !structure.is_mandatory(set_type, gender) {
            parts.push(PartItem::clear());
        }
        parts.extend(
            structure
                .part_sets(set_type)
                .iter()
                .filter(|set| set.is_offered(gender, ctx.club_level, ctx.owned_figure_sets))
                .map(|set| {
                    PartItem::new(set.id)
                        .with_club_level(set.club_level)
                        .with_color_layers(set.color_layers)
                }),
        );

        let layers = parts.iter().map(PartItem::color_layers).max().unwrap_or(0).max(1);
        let palette: Vec<ColorItem> = structure
            .palette(set_type)
            .iter()
            .filter(|c| c.selectable && c.club_level <= ctx.club_level)
            .map(|c| ColorItem {
                id: c.id,
                club_level: c.club_level,
            })
            .collect();

        let mut data = CategoryData::new(set_type, parts, vec![palette; layers]);

        match ctx.figure.and_then(|f| f.figure().get(set_type)) {
            Some(worn) => {
                if let Some(index) = data.find_part(worn.set_id) {
                    data.select_part_index(index);
                }
                for (layer, color) in worn.colors.iter().enumerate() {
                    if let Some(index) = data.find_color(layer, *color) {
                        data.select_color_index(layer, index);
                    }
                }
            }
            None => {
                if data.parts().first().map_or(false, PartItem::is_clear) {
                    data.select_part_index(0);
                }
            }
        }

        data
    }
}

/// Colors for a worn part: the selected palette entry per layer, else the first one
fn layer_colors(data: &CategoryData, layers: usize) -> Vec<i32> {
    (0..layers)
        .filter_map(|layer| {
            data.current_color(layer)
                .or_else(|| data.colors().get(layer).and_then(|palette| palette.first()))
                .map(|c| c.id)
        })
        .collect()
}

impl CategoryModel for FigurePartModel {
    fn name(&self) -> CategoryName {
        self.name
    }

    fn init(&mut self, ctx: &BuildContext<'_>) {
        self.categories = self
            .set_types
            .iter()
            .map(|set_type| Self::build_category(set_type, ctx))
            .collect();
        self.initialized = true;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn categories(&self) -> &[CategoryData] {
        &self.categories
    }

    fn select_part(&mut self, category: &str, index: usize, editor: &mut dyn SelectionContext) {
        let Some(data) = self.categories.iter_mut().find(|c| c.name() == category) else {
            return;
        };
        if !data.select_part_index(index) {
            return;
        }
        let Some(item) = data.get_current_part().cloned() else {
            return;
        };
        let Some(figure) = editor.current_figure() else {
            return;
        };

        debug!(category, part = item.id(), clear = item.is_clear(), "part selected");
        if item.is_clear() {
            figure.remove_part(category);
        } else {
            let colors = layer_colors(data, item.color_layers().max(1));
            figure.set_part(FigurePart::new(category, item.id(), colors));
        }
    }

    fn select_color(
        &mut self,
        category: &str,
        layer: usize,
        index: usize,
        editor: &mut dyn SelectionContext,
    ) {
        let Some(data) = self.categories.iter_mut().find(|c| c.name() == category) else {
            return;
        };
        if !data.select_color_index(layer, index) {
            return;
        }
        let layers = match data.get_current_part() {
            Some(item) if !item.is_clear() => item.color_layers().max(1),
            _ => return,
        };
        let Some(figure) = editor.current_figure() else {
            return;
        };

        figure.set_part_colors(category, layer_colors(data, layers));
    }
}
