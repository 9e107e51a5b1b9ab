//! Per-program uniform storage.

use super::backend::UniformValue;
use super::reflect::{ShaderReflection, UniformSlot};
use std::collections::HashMap;

/// CPU-side copy of a program's uniform block plus its resolved locations.
///
/// Lookups are memoized by name, misses included, for the lifetime of the
/// program. Dropping the program drops the cache with it.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    bytes: Vec<u8>,
    locations: HashMap<String, Option<UniformSlot>>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(reflection: &ShaderReflection) -> Self {
        // Uniform bindings are sized in 16-byte rows
        let size = (reflection.uniform_block_size as usize).next_multiple_of(16);
        Self {
            bytes: vec![0; size],
            locations: HashMap::new(),
            dirty: size > 0,
        }
    }

    /// Resolve a uniform name, consulting the cache first.
    pub fn location(&mut self, reflection: &ShaderReflection, name: &str) -> Option<UniformSlot> {
        if let Some(cached) = self.locations.get(name) {
            return *cached;
        }
        let slot = reflection.uniform(name);
        self.locations.insert(name.to_string(), slot);
        slot
    }

    /// Store a value. Returns `false` when the write was dropped.
    pub fn write(&mut self, reflection: &ShaderReflection, name: &str, value: UniformValue) -> bool {
        let Some(slot) = self.location(reflection, name) else {
            return false;
        };
        if slot.kind != value.kind() {
            return false;
        }
        let start = slot.offset as usize;
        let data = value.to_bytes();
        let Some(target) = self.bytes.get_mut(start..start + data.len()) else {
            return false;
        };
        target.copy_from_slice(&data);
        self.dirty = true;
        true
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes to upload if anything changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&[u8]> {
        if self.dirty {
            self.dirty = false;
            Some(&self.bytes)
        } else {
            None
        }
    }

    /// Number of memoized lookups, hits and misses alike.
    pub fn cached_locations(&self) -> usize {
        self.locations.len()
    }
}
