//! Effects category model
//!
//! Effects have no figure parts. The model builds one pseudo-category
//! whose items are owned effect ids behind a "none" sentinel, and a click
//! applies an effect id instead of a part.

use figura_core::EffectId;
use tracing::{debug, warn};

use crate::{BuildContext, CategoryData, CategoryModel, CategoryName, PartItem, SelectionContext};

/// Name of the single effects grid
pub const EFFECTS_CATEGORY: &str = "effects";

/// Grid item id of an effect. Ids past `i32::MAX` have no grid slot.
fn grid_id(effect: EffectId) -> Option<i32> {
    i32::try_from(effect.get()).ok()
}

/// Avatar effects tab
#[derive(Debug, Default)]
pub struct EffectsModel {
    categories: Vec<CategoryData>,
    initialized: bool,
}

impl EffectsModel {
    pub fn new() -> Self {
        EffectsModel::default()
    }

    fn effects_category(&self) -> Option<&CategoryData> {
        self.categories.first()
    }

    /// Grid index of an effect, if it is listed
    pub fn index_of(&self, effect: EffectId) -> Option<usize> {
        if effect.is_none() {
            return Some(0);
        }
        self.effects_category()?.find_part(grid_id(effect)?)
    }

    fn build(available: &[EffectId], current: EffectId) -> CategoryData {
        let mut parts = vec![PartItem::clear()];
        for effect in available.iter().filter(|e| e.is_some()) {
            let Some(id) = grid_id(*effect) else {
                warn!(%effect, "effect id out of grid range, not listed");
                continue;
            };
            if !parts.iter().any(|p| !p.is_clear() && p.id() == id) {
                parts.push(PartItem::new(id));
            }
        }

        // Effects carry no color, but the palette structure is kept uniform
        let mut data = CategoryData::new(EFFECTS_CATEGORY, parts, vec![Vec::new(), Vec::new()]);

        if current.is_some() {
            // No match leaves nothing selected rather than guessing "none"
            if let Some(index) = grid_id(current).and_then(|id| data.find_part(id)) {
                data.select_part_index(index);
            }
        } else {
            data.select_part_index(0);
        }

        data
    }
}

impl CategoryModel for EffectsModel {
    fn name(&self) -> CategoryName {
        CategoryName::Effects
    }

    fn init(&mut self, ctx: &BuildContext<'_>) {
        let current = ctx
            .figure
            .map(|f| f.avatar_effect_type())
            .unwrap_or(EffectId::NONE);

        self.categories = vec![Self::build(ctx.available_effects, current)];
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
        let Some(item) = data.get_current_part() else {
            return;
        };

        let effect = match u32::try_from(item.id()) {
            Ok(id) if !item.is_clear() => EffectId::new(id),
            _ => EffectId::NONE,
        };
        debug!(%effect, index, "effect grid selection");

        if let Some(figure) = editor.current_figure() {
            figure.set_avatar_effect_type(effect);
            figure.update_view();
        }
        editor.effect_selected(effect);
    }

    fn select_color(
        &mut self,
        _category: &str,
        _layer: usize,
        _index: usize,
        _editor: &mut dyn SelectionContext,
    ) {
    }
}
