//! Parametric cells assembled from curves, primitives and references.

mod bend_s;
mod mmi2x2;

pub use bend_s::{bend_s, bend_s_key};
pub use mmi2x2::{mmi2x2, mmi2x2_key};
