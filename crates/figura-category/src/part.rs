//! Grid items and category data

use figura_core::EffectId;

/// Icon lookup, provided by the host
pub trait IconResolver {
    fn effect_icon_url(&self, effect: EffectId) -> String;
}

/// Resolves icons by substituting `%id%` in a URL template
#[derive(Clone, Debug)]
pub struct UrlTemplateResolver {
    template: String,
}

impl UrlTemplateResolver {
    pub fn new(template: impl Into<String>) -> Self {
        UrlTemplateResolver {
            template: template.into(),
        }
    }
}

impl IconResolver for UrlTemplateResolver {
    fn effect_icon_url(&self, effect: EffectId) -> String {
        self.template.replace("%id%", &effect.to_string())
    }
}

/// One selectable option in a category grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartItem {
    id: i32,
    is_clear: bool,
    club_level: u8,
    color_layers: usize,
}

impl PartItem {
    /// The "nothing" option. Always id 0.
    pub fn clear() -> Self {
        PartItem {
            id: 0,
            is_clear: true,
            club_level: 0,
            color_layers: 0,
        }
    }

    pub fn new(id: i32) -> Self {
        PartItem {
            id,
            is_clear: false,
            club_level: 0,
            color_layers: 0,
        }
    }

    pub fn with_club_level(mut self, club_level: u8) -> Self {
        self.club_level = club_level;
        self
    }

    pub fn with_color_layers(mut self, layers: usize) -> Self {
        self.color_layers = layers;
        self
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn is_clear(&self) -> bool {
        self.is_clear
    }

    pub fn club_level(&self) -> u8 {
        self.club_level
    }

    pub fn color_layers(&self) -> usize {
        self.color_layers
    }

    /// Effect icon, resolved on demand. Clear items have none.
    pub fn image_url(&self, resolver: &dyn IconResolver) -> Option<String> {
        if self.is_clear || self.id <= 0 {
            return None;
        }
        let id = u32::try_from(self.id).ok()?;
        Some(resolver.effect_icon_url(EffectId::new(id)))
    }
}

/// One selectable palette entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorItem {
    pub id: i32,
    pub club_level: u8,
}

/// A category grid: parts, per-layer palettes and the current selection.
///
/// Items are fixed at construction; a changed option set means a new
/// `CategoryData`. Only the selection moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryData {
    name: String,
    parts: Vec<PartItem>,
    colors: Vec<Vec<ColorItem>>,
    selected: Option<usize>,
    selected_colors: Vec<Option<usize>>,
}

impl CategoryData {
    pub fn new(name: impl Into<String>, parts: Vec<PartItem>, colors: Vec<Vec<ColorItem>>) -> Self {
        let layers = colors.len();
        CategoryData {
            name: name.into(),
            parts,
            colors,
            selected: None,
            selected_colors: vec![None; layers],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parts(&self) -> &[PartItem] {
        &self.parts
    }

    pub fn colors(&self) -> &[Vec<ColorItem>] {
        &self.colors
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Select a part. Out-of-range indices leave the selection untouched.
    pub fn select_part_index(&mut self, index: usize) -> bool {
        if index >= self.parts.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn get_current_part(&self) -> Option<&PartItem> {
        self.selected.and_then(|i| self.parts.get(i))
    }

    /// Index of the first non-clear part with `id`
    pub fn find_part(&self, id: i32) -> Option<usize> {
        self.parts.iter().position(|p| !p.is_clear && p.id == id)
    }

    pub fn select_color_index(&mut self, layer: usize, index: usize) -> bool {
        let in_range = self.colors.get(layer).map_or(false, |palette| index < palette.len());
        if !in_range {
            return false;
        }
        self.selected_colors[layer] = Some(index);
        true
    }

    pub fn current_color(&self, layer: usize) -> Option<&ColorItem> {
        let index = (*self.selected_colors.get(layer)?)?;
        self.colors.get(layer)?.get(index)
    }

    pub fn find_color(&self, layer: usize, id: i32) -> Option<usize> {
        self.colors.get(layer)?.iter().position(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CategoryData {
        CategoryData::new(
            "hr",
            vec![PartItem::clear(), PartItem::new(100), PartItem::new(110)],
            vec![vec![ColorItem { id: 7, club_level: 0 }, ColorItem { id: 8, club_level: 1 }]],
        )
    }

    #[test]
    fn test_select_in_and_out_of_range() {
        let mut data = sample();
        assert!(data.get_current_part().is_none());

        assert!(data.select_part_index(1));
        assert_eq!(data.get_current_part().unwrap().id(), 100);

        assert!(!data.select_part_index(3));
        assert_eq!(data.selected_index(), Some(1));
    }

    #[test]
    fn test_find_part_skips_clear() {
        let data = sample();
        assert_eq!(data.find_part(0), None);
        assert_eq!(data.find_part(110), Some(2));
    }

    #[test]
    fn test_colors() {
        let mut data = sample();
        assert!(data.current_color(0).is_none());
        assert!(data.select_color_index(0, 1));
        assert_eq!(data.current_color(0).unwrap().id, 8);
        assert!(!data.select_color_index(0, 5));
        assert!(!data.select_color_index(2, 0));
        assert_eq!(data.find_color(0, 7), Some(0));
    }

    #[test]
    fn test_image_url() {
        let resolver = UrlTemplateResolver::new("https://cdn.example/fx/effect_%id%.png");
        assert_eq!(PartItem::clear().image_url(&resolver), None);
        assert_eq!(
            PartItem::new(12).image_url(&resolver).as_deref(),
            Some("https://cdn.example/fx/effect_12.png")
        );
    }
}
