//! Effect ledger - owned effects and their metadata

use std::collections::HashMap;

use figura_core::{EffectId, OwnedEffect};

/// Server-reported metadata of one owned effect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EffectMeta {
    /// Seconds, 0 = not time-limited
    pub duration: u32,
    /// Decremented locally once per second while active
    pub seconds_left_if_active: u32,
    pub is_permanent: bool,
}

impl EffectMeta {
    pub fn new(duration: u32, seconds_left_if_active: u32, is_permanent: bool) -> Self {
        EffectMeta {
            duration,
            seconds_left_if_active,
            is_permanent,
        }
    }

    /// Whether a local countdown applies to this effect
    pub fn is_counting_down(&self) -> bool {
        !self.is_permanent && self.seconds_left_if_active > 0
    }

    /// Remaining fraction of the duration, for progress bars.
    /// `None` for permanent or untimed effects.
    pub fn progress(&self) -> Option<f32> {
        if self.is_permanent || self.duration == 0 {
            return None;
        }
        Some((self.seconds_left_if_active as f32 / self.duration as f32).clamp(0.0, 1.0))
    }
}

impl From<&OwnedEffect> for EffectMeta {
    fn from(owned: &OwnedEffect) -> Self {
        EffectMeta::new(owned.duration, owned.seconds_left_if_active, owned.is_permanent)
    }
}

/// Effect ledger - the account's owned effects
///
/// `available` keeps server order for the editor grid; `metas` is keyed
/// by id. An id absent from `metas` is not owned.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EffectLedger {
    metas: HashMap<EffectId, EffectMeta>,
    available: Vec<EffectId>,
}

impl EffectLedger {
    pub fn new() -> Self {
        EffectLedger::default()
    }

    /// Replace everything from an owned-effects snapshot
    pub fn replace_from_snapshot(&mut self, effects: &[OwnedEffect]) {
        self.metas.clear();
        self.available.clear();

        for owned in effects {
            self.metas.insert(owned.effect, EffectMeta::from(owned));
            self.add_available(owned.effect);
        }
    }

    pub fn get(&self, id: EffectId) -> Option<&EffectMeta> {
        self.metas.get(&id)
    }

    pub fn get_mut(&mut self, id: EffectId) -> Option<&mut EffectMeta> {
        self.metas.get_mut(&id)
    }

    /// Insert or overwrite metadata; does not touch the available ids
    pub fn upsert(&mut self, id: EffectId, meta: EffectMeta) {
        self.metas.insert(id, meta);
    }

    /// Remove metadata and the available id
    pub fn remove(&mut self, id: EffectId) -> Option<EffectMeta> {
        self.remove_available(id);
        self.metas.remove(&id)
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.metas.contains_key(&id)
    }

    /// Union `id` into the available ids. Returns true if it was new.
    pub fn add_available(&mut self, id: EffectId) -> bool {
        if self.available.contains(&id) {
            return false;
        }
        self.available.push(id);
        true
    }

    pub fn remove_available(&mut self, id: EffectId) -> bool {
        let before = self.available.len();
        self.available.retain(|e| *e != id);
        self.available.len() != before
    }

    pub fn is_available(&self, id: EffectId) -> bool {
        self.available.contains(&id)
    }

    /// Owned ids in server order
    pub fn available_ids(&self) -> &[EffectId] {
        &self.available
    }

    /// First owned effect (in server order) with a running countdown
    pub fn first_running(&self) -> Option<EffectId> {
        self.available
            .iter()
            .copied()
            .find(|id| self.metas.get(id).map_or(false, |m| m.seconds_left_if_active > 0))
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EffectId, &EffectMeta)> {
        self.metas.iter()
    }
}
