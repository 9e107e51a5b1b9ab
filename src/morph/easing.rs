//! Easing curves mapping linear morph progress to a perceptual weight.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Curve applied to morph progress before blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    /// `4t³` below the midpoint, `1 - (-2t + 2)³ / 2` above it.
    #[default]
    CubicInOut,
    /// Overshoots and settles: `2^(-10t) · sin((10t - 0.75) · 2π/3) + 1`.
    ElasticOut,
}

impl Easing {
    /// Evaluate at `t`, clamped to `[0, 1]`. NaN evaluates as 0.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::ElasticOut => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    let c4 = 2.0 * PI / 3.0;
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::CubicInOut => "cubic-in-out",
            Self::ElasticOut => "elastic-out",
        }
    }
}
