//! Normalized scene parameters.

use std::collections::HashMap;

/// Parameter keys every built-in scene understands.
pub const INTENSITY: &str = "intensity";
pub const SPEED: &str = "speed";
pub const COLOR_SHIFT: &str = "colorShift";

/// Named scene controls, each held in `[0, 1]`.
///
/// Values are clamped on write. Reads of unknown keys resolve to a fallback
/// chosen by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    values: HashMap<String, f32>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map pre-populated from `(name, value)` pairs.
    pub fn with_defaults(defaults: &[(&str, f32)]) -> Self {
        let mut map = Self::new();
        for &(name, value) in defaults {
            map.set(name, value);
        }
        map
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    pub fn get_or(&self, name: &str, fallback: f32) -> f32 {
        self.get(name).unwrap_or(fallback)
    }

    /// Store `value` clamped to `[0, 1]`. NaN is stored as 0.
    pub fn set(&mut self, name: &str, value: f32) {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        match self.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.values.insert(name.to_string(), value);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
