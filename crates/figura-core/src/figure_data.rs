//! FigureData - the editable avatar of one gender
//!
//! The editor owns one instance per gender. A single observer may be
//! attached through [`FigureData::set_notify`]; it is a reference to the
//! preview, not ownership, and can be detached at any time.

use std::fmt;

use tracing::trace;

use crate::{set_type, Direction, EffectId, FigurePart, FigureString, Gender};

/// Observer invoked on every view refresh
pub type FigureObserver = Box<dyn FnMut(&PreviewKey) + Send>;

/// Composite render key. The preview re-renders whenever any field changes;
/// `update_id` grows on every refresh so identical figures still re-render.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewKey {
    pub figure: String,
    pub gender: Gender,
    pub direction: Direction,
    pub effect: EffectId,
    pub update_id: u64,
}

/// Editable figure of one gender
pub struct FigureData {
    figure: FigureString,
    gender: Gender,
    direction: Direction,
    avatar_effect_type: EffectId,
    update_id: u64,
    notify: Option<FigureObserver>,
}

impl FigureData {
    pub fn new(gender: Gender) -> Self {
        FigureData {
            figure: FigureString::new(),
            gender,
            direction: Direction::DEFAULT,
            avatar_effect_type: EffectId::NONE,
            update_id: 0,
            notify: None,
        }
    }

    /// Replace figure and gender. Does not touch the effect.
    pub fn load_avatar_data(&mut self, figure: &str, gender: Gender) {
        self.figure = FigureString::parse_lenient(figure);
        self.gender = gender;
        self.update_view();
    }

    pub fn figure(&self) -> &FigureString {
        &self.figure
    }

    pub fn figure_string(&self) -> String {
        self.figure.to_string()
    }

    /// Figure reduced to its face part. With `face_override` the face set id is replaced.
    pub fn figure_string_with_face(&self, face_override: Option<i32>) -> String {
        let mut face_only = self.figure.retain_set_types(&[set_type::FACE]);
        if let (Some(face_id), Some(face)) = (face_override, self.figure.get(set_type::FACE)) {
            face_only.set(FigurePart::new(set_type::FACE, face_id, face.colors.clone()));
        }
        face_only.to_string()
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Set direction; any integer is wrapped into range
    pub fn set_direction(&mut self, direction: i32) {
        self.direction = Direction::wrap(direction);
        self.update_view();
    }

    pub fn rotate(&mut self, step: i32) {
        self.direction = self.direction.rotate(step);
        self.update_view();
    }

    pub fn avatar_effect_type(&self) -> EffectId {
        self.avatar_effect_type
    }

    /// Set the effect field. Callers decide when to refresh the view.
    pub fn set_avatar_effect_type(&mut self, effect: EffectId) {
        self.avatar_effect_type = effect;
    }

    /// Insert or replace one part and refresh
    pub fn set_part(&mut self, part: FigurePart) {
        self.figure.set(part);
        self.update_view();
    }

    /// Remove one set type and refresh
    pub fn remove_part(&mut self, set_type: &str) {
        if self.figure.remove(set_type).is_some() {
            self.update_view();
        }
    }

    /// Recolor one set type and refresh
    pub fn set_part_colors(&mut self, set_type: &str, colors: Vec<i32>) {
        if self.figure.set_colors(set_type, colors) {
            self.update_view();
        }
    }

    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    pub fn preview_key(&self) -> PreviewKey {
        PreviewKey {
            figure: self.figure.to_string(),
            gender: self.gender,
            direction: self.direction,
            effect: self.avatar_effect_type,
            update_id: self.update_id,
        }
    }

    /// Bump the refresh counter and signal the observer
    pub fn update_view(&mut self) {
        self.update_id += 1;
        trace!(gender = %self.gender, update_id = self.update_id, "figure view update");

        if self.notify.is_some() {
            let key = self.preview_key();
            if let Some(notify) = self.notify.as_mut() {
                notify(&key);
            }
        }
    }

    pub fn set_notify(&mut self, observer: FigureObserver) {
        self.notify = Some(observer);
    }

    pub fn clear_notify(&mut self) {
        self.notify = None;
    }

    pub fn has_notify(&self) -> bool {
        self.notify.is_some()
    }
}

impl fmt::Debug for FigureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FigureData")
            .field("figure", &self.figure.to_string())
            .field("gender", &self.gender)
            .field("direction", &self.direction)
            .field("avatar_effect_type", &self.avatar_effect_type)
            .field("update_id", &self.update_id)
            .field("observed", &self.notify.is_some())
            .finish()
    }
}
