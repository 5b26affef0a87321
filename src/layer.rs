use serde::{Deserialize, Serialize};
use std::fmt;

/// GDS-style drawing layer: a `(layer, datatype)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Layer {
    pub layer: u16,
    pub datatype: u16,
}

impl Layer {
    pub const fn new(layer: u16, datatype: u16) -> Self {
        Self { layer, datatype }
    }
}

impl From<(u16, u16)> for Layer {
    fn from((layer, datatype): (u16, u16)) -> Self {
        Self::new(layer, datatype)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.layer, self.datatype)
    }
}
