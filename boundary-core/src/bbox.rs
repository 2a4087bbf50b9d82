//! Bounding-box filters for entity retrieval.

use geo::{Geometry, Intersects, Rect, coord};
use serde::{Deserialize, Serialize};

/// Spatial reference identifier for longitude/latitude on WGS 84.
pub const WGS84_SRID: u32 = 4326;

/// The four optional viewport coordinates a caller may supply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BboxBounds {
    /// Western edge.
    pub min_lon: Option<f64>,
    /// Southern edge.
    pub min_lat: Option<f64>,
    /// Eastern edge.
    pub max_lon: Option<f64>,
    /// Northern edge.
    pub max_lat: Option<f64>,
}

impl BboxBounds {
    /// Build the predicate these bounds describe, if they are complete.
    #[must_use]
    pub const fn predicate(&self) -> Option<SpatialPredicate> {
        bbox_predicate(self.min_lon, self.min_lat, self.max_lon, self.max_lat)
    }
}

/// A fully specified axis-aligned rectangle in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western edge.
    pub min_lon: f64,
    /// Southern edge.
    pub min_lat: f64,
    /// Eastern edge.
    pub max_lon: f64,
    /// Northern edge.
    pub max_lat: f64,
}

/// Filter applied by storage when listing entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialPredicate {
    /// Entity geometry intersects the rectangle, boundary inclusive.
    Intersects(BoundingBox),
}

impl SpatialPredicate {
    /// Spatial reference the rectangle is expressed in.
    #[must_use]
    pub const fn srid(&self) -> u32 {
        WGS84_SRID
    }

    /// The rectangle as a `geo` envelope.
    ///
    /// Corners are normalised, so a box given with swapped edges selects the
    /// same area as its well-ordered counterpart.
    #[must_use]
    pub fn envelope(&self) -> Rect<f64> {
        let Self::Intersects(bbox) = self;
        Rect::new(
            coord! { x: bbox.min_lon, y: bbox.min_lat },
            coord! { x: bbox.max_lon, y: bbox.max_lat },
        )
    }

    /// Whether `shape` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, shape: &Geometry<f64>) -> bool {
        shape.intersects(&Geometry::Rect(self.envelope()))
    }
}

/// Build an intersection predicate from four optional coordinates.
///
/// Returns `None` unless every coordinate is present; a partial box means
/// "no spatial filter" rather than an error.
///
/// # Examples
///
/// ```
/// use boundary_core::bbox_predicate;
///
/// assert!(bbox_predicate(Some(-161.0), Some(18.0), Some(-154.0), Some(23.0)).is_some());
/// assert!(bbox_predicate(Some(1.0), Some(2.0), Some(3.0), None).is_none());
/// ```
#[must_use]
pub const fn bbox_predicate(
    min_lon: Option<f64>,
    min_lat: Option<f64>,
    max_lon: Option<f64>,
    max_lat: Option<f64>,
) -> Option<SpatialPredicate> {
    match (min_lon, min_lat, max_lon, max_lat) {
        (Some(min_lon), Some(min_lat), Some(max_lon), Some(max_lat)) => {
            Some(SpatialPredicate::Intersects(BoundingBox {
                min_lon,
                min_lat,
                max_lon,
                max_lat,
            }))
        }
        _ => None,
    }
}
