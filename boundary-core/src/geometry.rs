//! Conversion between stored boundary geometry and GeoJSON geometry objects.
//!
//! Storage hands back geometry as GeoJSON text. Conversion never fails from
//! the caller's point of view: anything that cannot be turned into a supported
//! GeoJSON shape degrades to a placeholder point at the origin, and the
//! [`GeometryResolution`] records why.

use std::fmt;

use geo::{Geometry, SimplifyVwPreserve};
use geojson::Value;
use log::warn;
use serde::{Deserialize, Serialize};

/// GeoJSON geometry object as emitted on the wire.
pub type GeoJsonGeometry = geojson::Geometry;

/// Geometry exactly as the storage engine holds it.
///
/// The payload is GeoJSON geometry text in EPSG:4326. It is not validated on
/// construction; [`StoredGeometry::decode`] reports problems lazily so that a
/// single bad row cannot prevent the rest of a result set from loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredGeometry(String);

impl StoredGeometry {
    /// Wrap already-encoded geometry text.
    pub fn from_encoded(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Encode a `geo` shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::{Geometry, point};
    /// use boundary_core::StoredGeometry;
    ///
    /// let stored = StoredGeometry::from_shape(&Geometry::Point(point!(x: 1.5, y: 2.0)))?;
    /// assert_eq!(stored.decode(), Ok(Geometry::Point(point!(x: 1.5, y: 2.0))));
    /// # Ok::<(), serde_json::Error>(())
    /// ```
    pub fn from_shape(shape: &Geometry<f64>) -> Result<Self, serde_json::Error> {
        let geometry = GeoJsonGeometry::new(Value::from(shape));
        serde_json::to_string(&geometry).map(Self)
    }

    /// Borrow the encoded text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into a supported `geo` shape.
    pub fn decode(&self) -> Result<Geometry<f64>, DegradeReason> {
        let geometry: GeoJsonGeometry = serde_json::from_str(&self.0)
            .map_err(|err| DegradeReason::Malformed(err.to_string()))?;
        let value = geometry.value;
        match &value {
            Value::Point(_) | Value::Polygon(_) | Value::MultiPolygon(_) => {}
            other => return Err(DegradeReason::Unsupported(value_type_name(other))),
        }
        if !positions_are_well_formed(&value) {
            return Err(DegradeReason::Malformed(
                "positions need two finite ordinates and polygons need a ring".to_owned(),
            ));
        }
        Geometry::try_from(value).map_err(|err| DegradeReason::Malformed(err.to_string()))
    }
}

/// Why a geometry was replaced with the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// No geometry was available.
    Missing,
    /// The stored text was not a usable GeoJSON geometry.
    Malformed(String),
    /// The geometry type is not served by this API.
    Unsupported(&'static str),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("geometry missing"),
            Self::Malformed(detail) => write!(f, "malformed geometry: {detail}"),
            Self::Unsupported(kind) => write!(f, "unsupported geometry type {kind}"),
        }
    }
}

/// Outcome of converting stored geometry for the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryResolution {
    /// Conversion succeeded.
    Resolved(GeoJsonGeometry),
    /// Conversion failed; the placeholder stands in.
    Degraded(DegradeReason),
}

impl GeometryResolution {
    /// Collapse to the geometry sent to clients.
    #[must_use]
    pub fn into_geometry(self) -> GeoJsonGeometry {
        match self {
            Self::Resolved(geometry) => geometry,
            Self::Degraded(_) => placeholder_geometry(),
        }
    }

    /// The degradation reason, if conversion failed.
    #[must_use]
    pub const fn degraded_reason(&self) -> Option<&DegradeReason> {
        match self {
            Self::Resolved(_) => None,
            Self::Degraded(reason) => Some(reason),
        }
    }
}

/// The neutral stand-in: a point at `[0, 0]`.
#[must_use]
pub fn placeholder_geometry() -> GeoJsonGeometry {
    GeoJsonGeometry::new(Value::Point(vec![0.0, 0.0]))
}

/// Convert stored geometry to a GeoJSON geometry object.
///
/// # Examples
///
/// ```
/// use boundary_core::{DegradeReason, StoredGeometry, geometry::{placeholder_geometry, to_geojson}};
///
/// let missing = to_geojson(None);
/// assert_eq!(missing.degraded_reason(), Some(&DegradeReason::Missing));
/// assert_eq!(missing.into_geometry(), placeholder_geometry());
///
/// let line = StoredGeometry::from_encoded(r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#);
/// assert!(to_geojson(Some(&line)).degraded_reason().is_some());
/// ```
#[must_use]
pub fn to_geojson(stored: Option<&StoredGeometry>) -> GeometryResolution {
    let Some(stored) = stored else {
        return GeometryResolution::Degraded(DegradeReason::Missing);
    };
    match stored.decode() {
        Ok(shape) => GeometryResolution::Resolved(GeoJsonGeometry::new(Value::from(&shape))),
        Err(reason) => GeometryResolution::Degraded(reason),
    }
}

/// Reduce vertex count without introducing self-intersections.
///
/// Uses the topology-preserving Visvalingam–Whyatt variant. The tolerance is a
/// distance in degrees and is squared into the algorithm's area threshold.
/// Shapes without area or length, and non-positive tolerances, are returned
/// unchanged.
#[must_use]
pub fn simplify_preserving_topology(shape: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return shape.clone();
    }
    let epsilon = tolerance * tolerance;
    match shape {
        Geometry::Polygon(polygon) => Geometry::Polygon(polygon.simplify_vw_preserve(&epsilon)),
        Geometry::MultiPolygon(polygons) => {
            Geometry::MultiPolygon(polygons.simplify_vw_preserve(&epsilon))
        }
        Geometry::LineString(line) => Geometry::LineString(line.simplify_vw_preserve(&epsilon)),
        Geometry::MultiLineString(lines) => {
            Geometry::MultiLineString(lines.simplify_vw_preserve(&epsilon))
        }
        other => other.clone(),
    }
}

/// Simplify stored geometry text.
///
/// Text that cannot be decoded is returned untouched; interpreting it is the
/// codec's job.
#[must_use]
pub fn simplify_stored(stored: &StoredGeometry, tolerance: f64) -> StoredGeometry {
    let Ok(shape) = stored.decode() else {
        return stored.clone();
    };
    let simplified = simplify_preserving_topology(&shape, tolerance);
    match StoredGeometry::from_shape(&simplified) {
        Ok(encoded) => encoded,
        Err(err) => {
            warn!("Failed to encode simplified geometry, keeping original: {err}");
            stored.clone()
        }
    }
}

fn position_is_well_formed(position: &[f64]) -> bool {
    position.len() >= 2 && position.iter().all(|ordinate| ordinate.is_finite())
}

fn positions_are_well_formed(value: &Value) -> bool {
    match value {
        Value::Point(position) => position_is_well_formed(position),
        Value::Polygon(rings) => {
            !rings.is_empty() && rings.iter().flatten().all(|p| position_is_well_formed(p))
        }
        Value::MultiPolygon(polygons) => polygons.iter().all(|rings| {
            !rings.is_empty() && rings.iter().flatten().all(|p| position_is_well_formed(p))
        }),
        _ => false,
    }
}

const fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
