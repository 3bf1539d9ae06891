//! Catalog of default species and mogwais
//!
//! An explicit per-horde registry of the callbacks a horde falls back to
//! when nothing was registered by hand. Owned by the horde rather than
//! attached to process-global state, so multiple hordes stay independent.

use crate::callback::SharedCallback;

/// Ordered lookup table of default gremlin species and mogwais
#[derive(Default, Clone)]
pub struct Catalog {
    species: Vec<SharedCallback>,
    mogwais: Vec<SharedCallback>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gremlin species, chained
    pub fn species(&mut self, gremlin: SharedCallback) -> &mut Self {
        self.species.push(gremlin);
        self
    }

    /// Register a mogwai, chained
    pub fn mogwai(&mut self, mogwai: SharedCallback) -> &mut Self {
        self.mogwais.push(mogwai);
        self
    }

    /// Snapshot of every registered species, in registration order
    pub fn all_species(&self) -> Vec<SharedCallback> {
        self.species.clone()
    }

    /// Snapshot of every registered mogwai, in registration order
    pub fn all_mogwais(&self) -> Vec<SharedCallback> {
        self.mogwais.clone()
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn mogwai_count(&self) -> usize {
        self.mogwais.len()
    }
}
