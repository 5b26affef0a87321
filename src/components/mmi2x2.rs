use crate::cache::CellKey;
use crate::errors::ValidationError;
use crate::float_types::Real;
use crate::primitives::{RectPort, Side, TaperFactory, rectangle};
use crate::shape::Shape;
use crate::technology::Technology;
use crate::transform::Transform;
use std::sync::Arc;

/// Cache key and cell name of [`mmi2x2`]. The taper factory is not part of
/// the key; callers mixing factories should add their own `text` parameter.
pub fn mmi2x2_key(
    width_taper: Real,
    length_taper: Real,
    length_mmi: Real,
    width_mmi: Real,
    gap_mmi: Real,
    tech: &Technology,
) -> CellKey {
    CellKey::new("mmi2x2")
        .real("width_taper", width_taper)
        .real("length_taper", length_taper)
        .real("length_mmi", length_mmi)
        .real("width_mmi", width_mmi)
        .real("gap_mmi", gap_mmi)
        .technology(tech)
}

/// 2×2 multimode interference coupler.
///
/// ```text
///                length_mmi
///                 <------>
///                 ________
///                |        |
///             __/          \__
///         W1  __            __  E1
///               \          /_ _ _ _
///               |         | _ _ _ _| gap_mmi
///             __/          \__
///         W0  __            __  E0
///               \          /
///                |________|
///
///              <->
///         length_taper
/// ```
///
/// # Parameters
/// - `width_taper`: wide end of each taper, where it meets the multimode region
/// - `length_taper`: taper length
/// - `length_mmi`: multimode region length (x)
/// - `width_mmi`: multimode region width (y)
/// - `gap_mmi`: gap between the two tapers on one side
/// - `taper`: builds each taper from the nominal width up to `width_taper`
/// - `tech`: width, layers and cladding
///
/// The tapers on each side sit at `y = ±(gap_mmi + width_taper) / 2`. The
/// returned shape is fully flattened and exposes `E0`, `E1`, `W0`, `W1` at the
/// tapers' narrow ends.
pub fn mmi2x2<T: TaperFactory + ?Sized>(
    width_taper: Real,
    length_taper: Real,
    length_mmi: Real,
    width_mmi: Real,
    gap_mmi: Real,
    taper: &T,
    tech: &Technology,
) -> Result<Shape, ValidationError> {
    tech.validate()?;
    ValidationError::check_positive("width_taper", width_taper)?;
    ValidationError::check_positive("length_taper", length_taper)?;
    ValidationError::check_positive("length_mmi", length_mmi)?;
    ValidationError::check_positive("width_mmi", width_mmi)?;
    ValidationError::check_non_negative("gap_mmi", gap_mmi)?;
    tracing::debug!(
        width_taper,
        length_taper,
        length_mmi,
        width_mmi,
        gap_mmi,
        "building mmi2x2"
    );

    let key = mmi2x2_key(width_taper, length_taper, length_mmi, width_mmi, gap_mmi, tech);
    let mut component = Shape::new(key.cell_name());

    // one taper cell, shared by all four references
    let taper_cell = Arc::new(taper.build(length_taper, tech.nominal_width, width_taper, tech)?);

    let a = gap_mmi / 2.0 + width_taper / 2.0;
    let x = length_mmi / 2.0;
    let mmi = rectangle(
        [length_mmi, width_mmi],
        tech.drawing_layer,
        true,
        &[
            RectPort::new(Side::East, x, -a, width_taper),
            RectPort::new(Side::East, x, a, width_taper),
            RectPort::new(Side::West, -x, -a, width_taper),
            RectPort::new(Side::West, -x, a, width_taper),
        ],
    )?;

    for &layer in &tech.cladding_layers {
        let clad = rectangle(
            [length_mmi, width_mmi + 2.0 * tech.cladding_offset],
            layer,
            true,
            &[],
        )?;
        let id = component.place(Arc::new(clad), Transform::identity());
        component.absorb(id)?;
    }

    let mmi_section = component.place(Arc::new(mmi), Transform::identity());

    let mmi_ports = component.reference(mmi_section)?.ports();
    for port in mmi_ports {
        let taper_ref = component.place(Arc::clone(&taper_cell), Transform::identity());
        component.connect(taper_ref, taper.wide_port(), &port, false)?;
        let narrow = component.reference(taper_ref)?.port(taper.narrow_port())?;
        component.add_port(port.name.clone(), narrow)?;
        component.absorb(taper_ref)?;
    }
    component.absorb(mmi_section)?;

    component.set_info("width_taper", width_taper);
    component.set_info("length_taper", length_taper);
    component.set_info("length_mmi", length_mmi);
    component.set_info("width_mmi", width_mmi);
    component.set_info("gap_mmi", gap_mmi);
    component.set_info("simulation.port_width", 1.5e-6);
    Ok(component)
}
