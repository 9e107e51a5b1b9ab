//! Scene crossfading.
//!
//! [`MorphEngine`] holds the scene roster, advances the morph clock and
//! sequences blend modes so two scenes can share the frame during a
//! transition. [`Easing`] shapes the transition curve.

pub mod easing;
pub mod engine;

pub use easing::Easing;
pub use engine::{MorphEngine, MorphState};
