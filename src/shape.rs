//! `Shape` container: layered polygons, named ports and placed references.
//!
//! Shapes are built mutably by a recipe and then handed out as read-only
//! values, typically behind an [`Arc`]. A [`Reference`] places a shared shape
//! inside a parent under a [`Transform`]; it never mutates the shape it points
//! to. [`Shape::absorb`] flattens a reference into the parent's own polygon set.

use crate::errors::{GeometryHazard, ValidationError};
use crate::float_types::Real;
use crate::layer::Layer;
use crate::port::Port;
use crate::transform::{Transform, solve_connection};
use geo::{BoundingRect, Coord, LineString, Polygon as GeoPolygon, Rect};
use indexmap::IndexMap;
use nalgebra::{Point2, Vector2};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A polygon tagged with the layer it is drawn on.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonRecord {
    pub layer: Layer,
    pub polygon: GeoPolygon<Real>,
}

impl PolygonRecord {
    /// Boundary vertices in order, without the repeated closing vertex.
    pub fn points(&self) -> Vec<Point2<Real>> {
        let ring = &self.polygon.exterior().0;
        let open = ring.len().saturating_sub(usize::from(self.polygon.exterior().is_closed()));
        ring[..open].iter().map(|c| Point2::new(c.x, c.y)).collect()
    }

    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            layer: self.layer,
            polygon: transform.apply_polygon(&self.polygon),
        }
    }

    pub fn bounding_box(&self) -> Option<Rect<Real>> {
        self.polygon.bounding_rect()
    }
}

/// Handle to a reference placed in a [`Shape`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefId(usize);

impl RefId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A shared shape placed under a rigid transform.
#[derive(Clone, Debug)]
pub struct Reference {
    shape: Arc<Shape>,
    pub transform: Transform,
}

impl Reference {
    pub fn new(shape: Arc<Shape>, transform: Transform) -> Self {
        Self { shape, transform }
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// The referenced shape's port `name`, in the parent's frame.
    pub fn port(&self, name: &str) -> Result<Port, ValidationError> {
        self.shape.port(name).map(|p| self.transform.apply_port(p))
    }

    /// All ports of the referenced shape, in the parent's frame.
    pub fn ports(&self) -> Vec<Port> {
        self.shape
            .ports()
            .map(|p| self.transform.apply_port(p))
            .collect()
    }

    /// Moves this reference so its port `port_name` mates with `target`.
    ///
    /// The connection is solved against the port as currently placed and
    /// pre-composed onto the existing transform (`new = solve ∘ old`), so
    /// successive connects accumulate regardless of how the reference was
    /// placed before.
    pub fn connect(
        &mut self,
        port_name: &str,
        target: &Port,
        mirror: bool,
    ) -> Result<Option<GeometryHazard>, ValidationError> {
        let moving = self.port(port_name)?;
        let connection = solve_connection(target, &moving, mirror);
        self.transform = connection.transform.compose(&self.transform);
        Ok(connection.hazard)
    }

    /// Applies `transform` after the current placement.
    pub fn transform_by(&mut self, transform: &Transform) -> &mut Self {
        self.transform = transform.compose(&self.transform);
        self
    }

    pub fn translate(&mut self, dx: Real, dy: Real) -> &mut Self {
        self.transform_by(&Transform::translation(dx, dy))
    }

    pub fn rotate(&mut self, angle: Real, center: Point2<Real>) -> &mut Self {
        self.transform_by(&Transform::rotation_about(angle, center))
    }

    /// Reflects about the parent's x-axis.
    pub fn mirror_x(&mut self) -> &mut Self {
        self.transform_by(&Transform::mirror_x())
    }

    /// The referenced geometry, flattened and mapped into the parent's frame.
    pub fn render(&self) -> Vec<PolygonRecord> {
        self.shape
            .flattened_polygons()
            .iter()
            .map(|record| record.transformed(&self.transform))
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Shape {
    pub name: String,
    polygons: BTreeMap<Layer, Vec<PolygonRecord>>,
    ports: IndexMap<String, Port>,
    references: IndexMap<RefId, Reference>,
    next_ref: usize,
    info: BTreeMap<String, Real>,
    hazards: Vec<GeometryHazard>,
}

impl Shape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
    // Polygons
    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

    /// Appends a polygon on `layer`. Simplicity is the caller's responsibility;
    /// only the vertex count and finiteness are checked.
    pub fn add_polygon(&mut self, points: &[[Real; 2]], layer: Layer) -> Result<(), ValidationError> {
        if points.len() < 3 {
            return Err(ValidationError::TooFewPoints(points.len()));
        }
        if let Some(&[x, y]) = points.iter().find(|[x, y]| !x.is_finite() || !y.is_finite()) {
            return Err(ValidationError::InvalidCoordinate(Point2::new(x, y)));
        }
        let ring: Vec<Coord<Real>> = points.iter().map(|&[x, y]| Coord { x, y }).collect();
        self.add_record(PolygonRecord {
            layer,
            polygon: GeoPolygon::new(LineString::new(ring), vec![]),
        });
        Ok(())
    }

    /// Appends an axis-aligned rectangle spanning `rect` on `layer`.
    pub fn add_rect(&mut self, rect: Rect<Real>, layer: Layer) {
        self.add_record(PolygonRecord {
            layer,
            polygon: rect.to_polygon(),
        });
    }

    pub fn add_record(&mut self, record: PolygonRecord) {
        self.polygons.entry(record.layer).or_default().push(record);
    }

    /// This shape's own polygons, grouped by layer in layer order.
    pub fn polygons(&self) -> impl Iterator<Item = &PolygonRecord> {
        self.polygons.values().flatten()
    }

    /// This shape's own polygons on `layer`.
    pub fn polygons_on(&self, layer: Layer) -> &[PolygonRecord] {
        self.polygons.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Own polygons followed by every placed reference's rendered polygons.
    pub fn flattened_polygons(&self) -> Vec<PolygonRecord> {
        self.polygons()
            .cloned()
            .chain(self.references.values().flat_map(Reference::render))
            .collect()
    }

    /// Layers that carry geometry, including placed references.
    pub fn layers(&self) -> Vec<Layer> {
        let mut layers: Vec<Layer> = self.flattened_polygons().iter().map(|r| r.layer).collect();
        layers.sort();
        layers.dedup();
        layers
    }

    pub fn bounding_box(&self) -> Option<Rect<Real>> {
        self.flattened_polygons()
            .iter()
            .filter_map(PolygonRecord::bounding_box)
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            })
    }

    pub fn xmin(&self) -> Option<Real> {
        self.bounding_box().map(|r| r.min().x)
    }

    pub fn xmax(&self) -> Option<Real> {
        self.bounding_box().map(|r| r.max().x)
    }

    pub fn ymin(&self) -> Option<Real> {
        self.bounding_box().map(|r| r.min().y)
    }

    pub fn ymax(&self) -> Option<Real> {
        self.bounding_box().map(|r| r.max().y)
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
    // Ports
    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

    /// Adds `port` under `name`. Fails if the name is taken.
    pub fn add_port(&mut self, name: impl Into<String>, port: Port) -> Result<(), ValidationError> {
        let name = name.into();
        if self.ports.contains_key(&name) {
            return Err(ValidationError::DuplicatePort(name));
        }
        let port = port.renamed(name.clone());
        self.ports.insert(name, port);
        Ok(())
    }

    pub fn port(&self, name: &str) -> Result<&Port, ValidationError> {
        self.ports.get(name).ok_or_else(|| ValidationError::MissingPort {
            shape: self.name.clone(),
            port: name.to_owned(),
        })
    }

    /// Ports in insertion order.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    pub fn port_names(&self) -> Vec<&str> {
        self.ports.keys().map(String::as_str).collect()
    }

    pub fn remove_port(&mut self, name: &str) -> Result<Port, ValidationError> {
        self.ports.shift_remove(name).ok_or_else(|| ValidationError::MissingPort {
            shape: self.name.clone(),
            port: name.to_owned(),
        })
    }

    /// Moves port `from` to the key `to`, keeping its position in the port order.
    /// Both checks run before anything changes, so a failed rename leaves the
    /// ports untouched.
    pub fn rename_port(&mut self, from: &str, to: impl Into<String>) -> Result<(), ValidationError> {
        let to = to.into();
        let Some(index) = self.ports.get_index_of(from) else {
            return Err(ValidationError::MissingPort {
                shape: self.name.clone(),
                port: from.to_owned(),
            });
        };
        if from != to && self.ports.contains_key(&to) {
            return Err(ValidationError::DuplicatePort(to));
        }
        if let Some(port) = self.ports.shift_remove(from) {
            self.ports.shift_insert(index, to.clone(), port.renamed(to));
        }
        Ok(())
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
    // References
    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

    /// Places `child` under `transform`. `child` itself is never modified.
    pub fn place(&mut self, child: Arc<Shape>, transform: Transform) -> RefId {
        self.add_ref(Reference::new(child, transform))
    }

    pub fn add_ref(&mut self, reference: Reference) -> RefId {
        let id = RefId(self.next_ref);
        self.next_ref += 1;
        self.references.insert(id, reference);
        id
    }

    pub fn reference(&self, id: RefId) -> Result<&Reference, ValidationError> {
        self.references
            .get(&id)
            .ok_or(ValidationError::UnknownReference(id.0))
    }

    pub fn reference_mut(&mut self, id: RefId) -> Result<&mut Reference, ValidationError> {
        self.references
            .get_mut(&id)
            .ok_or(ValidationError::UnknownReference(id.0))
    }

    /// References still placed (not yet absorbed), in placement order.
    pub fn references(&self) -> impl Iterator<Item = (RefId, &Reference)> {
        self.references.iter().map(|(id, r)| (*id, r))
    }

    /// Connects port `port_name` of reference `id` onto `target`.
    /// A width mismatch is recorded on this shape and also returned.
    pub fn connect(
        &mut self,
        id: RefId,
        port_name: &str,
        target: &Port,
        mirror: bool,
    ) -> Result<Option<GeometryHazard>, ValidationError> {
        let hazard = self.reference_mut(id)?.connect(port_name, target, mirror)?;
        if let Some(hazard) = &hazard {
            self.record_hazard(hazard.clone());
        }
        Ok(hazard)
    }

    /// Flattens reference `id` into this shape: its rendered polygons join
    /// this shape's own layers and the reference is dropped. Ports are not
    /// carried over; expose the ones you need with [`Shape::add_port`].
    pub fn absorb(&mut self, id: RefId) -> Result<(), ValidationError> {
        let reference = self
            .references
            .shift_remove(&id)
            .ok_or(ValidationError::UnknownReference(id.0))?;
        self.absorb_reference(&reference);
        Ok(())
    }

    /// Absorbs every reference still placed, in placement order.
    pub fn flatten(&mut self) {
        for (_, reference) in std::mem::take(&mut self.references) {
            self.absorb_reference(&reference);
        }
    }

    fn absorb_reference(&mut self, reference: &Reference) {
        for record in reference.render() {
            self.add_record(record);
        }
        self.hazards.extend(reference.shape().hazards());
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
    // Info & hazards
    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

    pub fn set_info(&mut self, key: impl Into<String>, value: Real) {
        self.info.insert(key.into(), value);
    }

    pub fn info(&self, key: &str) -> Option<Real> {
        self.info.get(key).copied()
    }

    pub fn record_hazard(&mut self, hazard: GeometryHazard) {
        tracing::warn!(shape = %self.name, %hazard, "geometry hazard");
        self.hazards.push(hazard);
    }

    /// Hazards of this shape and of every reference still placed in it.
    pub fn hazards(&self) -> Vec<GeometryHazard> {
        self.hazards
            .iter()
            .cloned()
            .chain(self.references.values().flat_map(|r| r.shape().hazards()))
            .collect()
    }

    pub fn is_flagged(&self) -> bool {
        !self.hazards().is_empty()
    }

    /// Translates every own polygon and port by `offset`. References keep
    /// their placement relative to the moved geometry.
    pub fn translate(&mut self, offset: Vector2<Real>) {
        let t = Transform::translation(offset.x, offset.y);
        for record in self.polygons.values_mut().flatten() {
            *record = record.transformed(&t);
        }
        for port in self.ports.values_mut() {
            *port = t.apply_port(port);
        }
        for reference in self.references.values_mut() {
            reference.transform_by(&t);
        }
    }
}
