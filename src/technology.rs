//! Technology profile: the process constants every recipe draws with.
//!
//! Profiles are plain serde records, so a process can be described in JSON:
//! ```json
//! {
//!   "nominal_width": 0.5,
//!   "drawing_layer": { "layer": 1, "datatype": 0 },
//!   "cladding_layers": [{ "layer": 111, "datatype": 0 }],
//!   "cladding_offset": 3.0
//! }
//! ```

use crate::errors::ValidationError;
use crate::float_types::Real;
use crate::layer::Layer;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    /// Single-mode waveguide width
    pub nominal_width: Real,
    /// Layer the waveguide core is drawn on
    pub drawing_layer: Layer,
    /// Layers that receive a cladding outline, in drawing order (may be empty)
    #[serde(default)]
    pub cladding_layers: Vec<Layer>,
    /// Distance the cladding extends past the core
    #[serde(default)]
    pub cladding_offset: Real,
}

impl Default for Technology {
    fn default() -> Self {
        Self::silicon_c()
    }
}

impl Technology {
    /// Silicon photonics, C-band: 500 nm strip waveguides on layer 1/0 with a
    /// 3 µm cladding on 111/0.
    pub fn silicon_c() -> Self {
        Self {
            nominal_width: 0.5,
            drawing_layer: Layer::new(1, 0),
            cladding_layers: vec![Layer::new(111, 0)],
            cladding_offset: 3.0,
        }
    }

    /// Checks `nominal_width > 0` and `cladding_offset >= 0`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_positive("nominal_width", self.nominal_width)?;
        ValidationError::check_non_negative("cladding_offset", self.cladding_offset)?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        let tech: Self = serde_json::from_str(json)
            .map_err(|e| ValidationError::Config(format!("technology profile: {e}")))?;
        tech.validate()?;
        Ok(tech)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loading technology profile");
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ValidationError> {
        serde_json::to_string_pretty(self).map_err(|e| ValidationError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_profile_without_cladding() {
        let tech = Technology::from_json_str(
            r#"{ "nominal_width": 0.45, "drawing_layer": { "layer": 2, "datatype": 0 } }"#,
        )
        .unwrap();
        assert_eq!(tech.drawing_layer, Layer::new(2, 0));
        assert!(tech.cladding_layers.is_empty());
        assert_eq!(tech.cladding_offset, 0.0);
    }

    #[test]
    fn rejects_invalid_profiles() {
        let err = Technology::from_json_str(
            r#"{ "nominal_width": 0.0, "drawing_layer": { "layer": 1, "datatype": 0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::NonPositive { name: "nominal_width", .. }));
        assert!(matches!(
            Technology::from_json_str("not json"),
            Err(ValidationError::Config(_))
        ));
    }

    #[test]
    fn loads_profile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sin.json");
        std::fs::write(
            &path,
            r#"{
                "nominal_width": 1.0,
                "drawing_layer": { "layer": 34, "datatype": 0 },
                "cladding_layers": [{ "layer": 36, "datatype": 0 }, { "layer": 111, "datatype": 0 }],
                "cladding_offset": 2.0
            }"#,
        )
        .unwrap();
        let tech = Technology::from_json_file(&path).unwrap();
        assert_eq!(tech.cladding_layers, vec![Layer::new(36, 0), Layer::new(111, 0)]);
        assert!(matches!(
            Technology::from_json_file(dir.path().join("missing.json")),
            Err(ValidationError::Config(_))
        ));
    }

    #[test]
    fn json_round_trip_of_default() {
        let tech = Technology::default();
        let back = Technology::from_json_str(&tech.to_json().unwrap()).unwrap();
        assert_eq!(tech, back);
    }
}
