//! Figura Category - Editor category models
//!
//! A category model owns one or more [`CategoryData`] grids and turns a
//! grid click into a figure mutation:
//! - Figure-part models (generic, head, torso, legs) rewrite set types
//! - The effects model applies an effect id and reports the selection
//!
//! Models never reach for ambient state; everything they read comes in a
//! [`BuildContext`] and everything they mutate goes through a
//! [`SelectionContext`].

pub mod part;
pub mod model;
pub mod structure;
pub mod parts;
pub mod effects;

pub use part::*;
pub use model::*;
pub use structure::*;
pub use parts::*;
pub use effects::*;
