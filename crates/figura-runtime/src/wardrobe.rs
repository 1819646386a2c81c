//! Wardrobe slots

use figura_core::SavedLook;
use tracing::{debug, warn};

/// Saved looks by 1-based slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wardrobe {
    slots: Vec<Option<SavedLook>>,
}

impl Wardrobe {
    pub fn new(max_slots: usize) -> Self {
        Wardrobe {
            slots: vec![None; max_slots],
        }
    }

    /// Replace all slots from a server page
    pub fn apply_page(&mut self, looks: &[SavedLook]) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }

        for look in looks {
            match look.slot.checked_sub(1).and_then(|i| self.slots.get_mut(i)) {
                Some(slot) => *slot = Some(look.clone()),
                None => warn!(slot = look.slot, max = self.slots.len(), "wardrobe slot out of range"),
            }
        }

        debug!(filled = self.filled(), "wardrobe page applied");
    }

    pub fn get(&self, slot: usize) -> Option<&SavedLook> {
        slot.checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    pub fn slots(&self) -> &[Option<SavedLook>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figura_core::Gender;

    fn look(slot: usize) -> SavedLook {
        SavedLook {
            slot,
            figure: format!("hd-18{}-7", slot),
            gender: Gender::Male,
        }
    }

    #[test]
    fn test_page_fills_one_based_slots() {
        let mut wardrobe = Wardrobe::new(3);
        wardrobe.apply_page(&[look(1), look(3)]);

        assert_eq!(wardrobe.get(1).unwrap().figure, "hd-181-7");
        assert!(wardrobe.get(2).is_none());
        assert_eq!(wardrobe.get(3).unwrap().slot, 3);
        assert!(wardrobe.get(0).is_none());
        assert_eq!(wardrobe.filled(), 2);
    }

    #[test]
    fn test_out_of_range_dropped() {
        let mut wardrobe = Wardrobe::new(2);
        wardrobe.apply_page(&[look(0), look(2), look(5)]);

        assert_eq!(wardrobe.filled(), 1);
        assert_eq!(wardrobe.len(), 2);
    }

    #[test]
    fn test_page_replaces_wholesale() {
        let mut wardrobe = Wardrobe::new(2);
        wardrobe.apply_page(&[look(1)]);
        wardrobe.apply_page(&[look(2)]);

        assert!(wardrobe.get(1).is_none());
        assert!(wardrobe.get(2).is_some());
    }
}
