//! Biome registry: maps [`BiomeId`] to [`BiomeDef`] with name-based lookup.

use hashbrown::HashMap;
use nebula_chunk::BiomeId;

use super::BiomeDef;

/// Errors that can occur when registering biomes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BiomeRegistryError {
    /// A biome with this name is already registered.
    #[error("duplicate biome name: {0}")]
    DuplicateName(String),
    /// One of the biome's ranges is inverted or leaves `[0, 1]`.
    #[error("biome {name}: invalid {axis} range")]
    InvalidRange {
        /// Biome name.
        name: String,
        /// Offending axis.
        axis: &'static str,
    },
    /// No biomes were registered.
    #[error("biome table is empty")]
    Empty,
    /// No biome accepts the whole unit cube, so some inputs would have no match.
    #[error("biome table has no universally permissive fallback entry")]
    NoFallback,
}

/// Stores all registered biome definitions with O(1) lookup by ID.
///
/// IDs are assigned in registration order, which is also the classifier's
/// tie-break order.
#[derive(Clone, Debug)]
pub struct BiomeRegistry {
    biomes: Vec<BiomeDef>,
    name_to_id: HashMap<String, BiomeId>,
}

impl BiomeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            biomes: Vec::new(),
            name_to_id: HashMap::new(),
        }
    }

    /// Builds a registry from an ordered list of definitions.
    ///
    /// # Errors
    ///
    /// The first [`register`](Self::register) error encountered.
    pub fn from_defs(defs: impl IntoIterator<Item = BiomeDef>) -> Result<Self, BiomeRegistryError> {
        let mut reg = Self::new();
        for def in defs {
            reg.register(def)?;
        }
        Ok(reg)
    }

    /// Registers a new biome definition, returning its assigned [`BiomeId`].
    ///
    /// # Errors
    ///
    /// Returns [`BiomeRegistryError::DuplicateName`] if a biome with the same
    /// name exists, and [`BiomeRegistryError::InvalidRange`] if any range is
    /// inverted or outside `[0, 1]`.
    pub fn register(&mut self, def: BiomeDef) -> Result<BiomeId, BiomeRegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(BiomeRegistryError::DuplicateName(def.name.clone()));
        }
        for (axis, range) in [("height", def.height), ("temperature", def.temperature), ("moisture", def.moisture)] {
            if !range.is_valid() {
                return Err(BiomeRegistryError::InvalidRange {
                    name: def.name.clone(),
                    axis,
                });
            }
        }
        let id = BiomeId(self.biomes.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.biomes.push(def);
        Ok(id)
    }

    /// Returns the definition for the given biome ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn get(&self, id: BiomeId) -> &BiomeDef {
        &self.biomes[id.0 as usize]
    }

    /// Returns the definition for `id`, or `None` if it was never registered.
    pub fn try_get(&self, id: BiomeId) -> Option<&BiomeDef> {
        self.biomes.get(id.0 as usize)
    }

    /// Looks up a biome ID by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<BiomeId> {
        self.name_to_id.get(name).copied()
    }

    /// The first universally permissive biome, if any.
    pub fn fallback(&self) -> Option<BiomeId> {
        self.biomes
            .iter()
            .position(BiomeDef::is_universal)
            .map(|i| BiomeId(i as u16))
    }

    /// Iterates over `(id, def)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (BiomeId, &BiomeDef)> {
        self.biomes.iter().enumerate().map(|(i, d)| (BiomeId(i as u16), d))
    }

    /// Returns the number of registered biomes.
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Returns `true` if no biomes are registered.
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
