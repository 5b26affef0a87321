//! Caller-owned cache of built cells, keyed by recipe name and parameters.
//!
//! There is no process-wide registry: whoever owns a [`ShapeCache`] decides
//! how long cells live. Cached shapes are handed out as `Arc<Shape>`, ready to
//! be placed as references by any number of parents.

use crate::errors::ValidationError;
use crate::float_types::Real;
use crate::shape::Shape;
use crate::technology::Technology;
use hashbrown::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A single recipe parameter.
#[derive(Clone, Debug)]
pub enum Param {
    Real(Real),
    Int(i64),
    Text(String),
}

impl Param {
    // -0.0 and 0.0 describe the same cell
    #[allow(clippy::useless_conversion)]
    fn real_bits(value: Real) -> u64 {
        let value = if value == 0.0 { 0.0 } else { value };
        u64::from(value.to_bits())
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Param::Real(a), Param::Real(b)) => Param::real_bits(*a) == Param::real_bits(*b),
            (Param::Int(a), Param::Int(b)) => a == b,
            (Param::Text(a), Param::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Param {}

impl Hash for Param {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Param::Real(v) => {
                0u8.hash(state);
                Param::real_bits(*v).hash(state);
            },
            Param::Int(v) => {
                1u8.hash(state);
                v.hash(state);
            },
            Param::Text(v) => {
                2u8.hash(state);
                v.hash(state);
            },
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Real(v) => write!(f, "{v}"),
            Param::Int(v) => write!(f, "{v}"),
            Param::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Canonical identity of a cell: recipe name plus parameters sorted by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellKey {
    recipe: String,
    params: Vec<(String, Param)>,
}

impl CellKey {
    pub fn new(recipe: impl Into<String>) -> Self {
        Self {
            recipe: recipe.into(),
            params: Vec::new(),
        }
    }

    /// Adds or replaces a parameter, keeping the list sorted by name.
    pub fn with(mut self, name: impl Into<String>, value: Param) -> Self {
        let name = name.into();
        match self.params.binary_search_by(|(n, _)| n.as_str().cmp(&name)) {
            Ok(i) => self.params[i].1 = value,
            Err(i) => self.params.insert(i, (name, value)),
        }
        self
    }

    pub fn real(self, name: impl Into<String>, value: Real) -> Self {
        self.with(name, Param::Real(value))
    }

    pub fn int(self, name: impl Into<String>, value: i64) -> Self {
        self.with(name, Param::Int(value))
    }

    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, Param::Text(value.into()))
    }

    /// Folds the technology profile into the key, so the same recipe under two
    /// processes yields two cells.
    pub fn technology(self, tech: &Technology) -> Self {
        let cladding = tech
            .cladding_layers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.real("tech.nominal_width", tech.nominal_width)
            .text("tech.drawing_layer", tech.drawing_layer.to_string())
            .text("tech.cladding_layers", cladding)
            .real("tech.cladding_offset", tech.cladding_offset)
    }

    /// Readable cell name: the recipe followed by its non-technology
    /// parameters, e.g. `bend_s_height20_length10_sample_count99`.
    pub fn cell_name(&self) -> String {
        let mut name = self.recipe.clone();
        for (k, v) in self.params.iter().filter(|(k, _)| !k.starts_with("tech.")) {
            name.push('_');
            name.push_str(k);
            name.push_str(&v.to_string());
        }
        name
    }
}

/// Built cells, shared by `Arc`.
#[derive(Debug, Default)]
pub struct ShapeCache {
    cells: HashMap<CellKey, Arc<Shape>>,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CellKey) -> Option<Arc<Shape>> {
        self.cells.get(key).cloned()
    }

    /// Returns the cached cell for `key`, building it with `build` on a miss.
    /// A failed build caches nothing.
    pub fn get_or_try_insert_with<F>(&mut self, key: CellKey, build: F) -> Result<Arc<Shape>, ValidationError>
    where
        F: FnOnce() -> Result<Shape, ValidationError>,
    {
        if let Some(shape) = self.cells.get(&key) {
            tracing::trace!(cell = %key.cell_name(), "cache hit");
            return Ok(Arc::clone(shape));
        }
        let shape = Arc::new(build()?);
        tracing::trace!(cell = %key.cell_name(), "cache miss");
        self.cells.insert(key, Arc::clone(&shape));
        Ok(shape)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_is_order_independent_and_zero_sign_blind() {
        let a = CellKey::new("r").real("b", 1.0).real("a", 0.0);
        let b = CellKey::new("r").real("a", -0.0).real("b", 1.0);
        assert_eq!(a, b);
        assert_eq!(a.cell_name(), "r_a0_b1");
    }

    #[test]
    fn failed_build_is_not_cached() {
        let mut cache = ShapeCache::new();
        let key = CellKey::new("broken");
        let err = cache.get_or_try_insert_with(key.clone(), || Err(ValidationError::TooFewSamples(0)));
        assert!(err.is_err());
        assert!(cache.is_empty());

        let first = cache.get_or_try_insert_with(key.clone(), || Ok(Shape::new("ok"))).unwrap();
        let second = cache
            .get_or_try_insert_with(key, || panic!("must not rebuild"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
