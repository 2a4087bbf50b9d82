//! Request orchestration: from a request descriptor to GeoJSON features.
//!
//! [`GeoQueryService`] resolves the tolerance and bounding box for a request,
//! reads matching entities from a [`BoundaryStore`], converts each geometry
//! and assembles one feature per entity. Geometry conversion problems degrade
//! a single feature; storage failures abort the request.

use std::fmt;

use log::{debug, info, warn};
use thiserror::Error;

use crate::bbox::BboxBounds;
use crate::entity::{EntityId, EntityKind, GeographicEntity};
use crate::feature::{Feature, FeatureCollection, assemble_feature};
use crate::geometry::{GeometryResolution, placeholder_geometry, to_geojson};
use crate::store::{BoundaryStore, EntityQuery, StoreError};
use crate::tolerance::tolerance_for_zoom;

/// Parameters of a single boundary query.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Which entities to return.
    pub kind: EntityKind,
    /// Owning state; county queries only.
    pub state_filter: Option<EntityId>,
    /// Whether to send real geometry. When `false` every feature carries the
    /// placeholder point.
    pub include_geometry: bool,
    /// Explicit simplification tolerance in degrees.
    pub tolerance: Option<f64>,
    /// Map zoom level, consulted only when `tolerance` is absent.
    pub zoom_level: Option<i32>,
    /// Viewport filter; ignored unless all four coordinates are set.
    pub bbox: BboxBounds,
}

impl RequestDescriptor {
    /// A descriptor for `kind` with geometry included and no filters.
    #[must_use]
    pub const fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            state_filter: None,
            include_geometry: true,
            tolerance: None,
            zoom_level: None,
            bbox: BboxBounds {
                min_lon: None,
                min_lat: None,
                max_lon: None,
                max_lat: None,
            },
        }
    }

    /// Query every state.
    #[must_use]
    pub const fn states() -> Self {
        Self::new(EntityKind::State)
    }

    /// Query every county.
    #[must_use]
    pub const fn counties() -> Self {
        Self::new(EntityKind::County)
    }

    /// Restrict a county query to one state.
    #[must_use]
    pub fn with_state_filter(mut self, state_id: EntityId) -> Self {
        self.state_filter = Some(state_id);
        self
    }

    /// Set the viewport filter.
    #[must_use]
    pub fn with_bbox(mut self, bbox: BboxBounds) -> Self {
        self.bbox = bbox;
        self
    }

    /// Set an explicit tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set the zoom level.
    #[must_use]
    pub fn with_zoom_level(mut self, zoom_level: i32) -> Self {
        self.zoom_level = Some(zoom_level);
        self
    }

    /// Choose between real geometry and the placeholder.
    #[must_use]
    pub fn with_geometry(mut self, include_geometry: bool) -> Self {
        self.include_geometry = include_geometry;
        self
    }

    /// Tolerance to simplify with, or `None` for raw geometry.
    ///
    /// An explicit tolerance wins over the zoom level. A tolerance that is
    /// zero, negative or not a number disables simplification, as does a
    /// request that supplies neither value.
    ///
    /// # Examples
    ///
    /// ```
    /// use boundary_core::RequestDescriptor;
    ///
    /// assert_eq!(RequestDescriptor::states().effective_tolerance(), None);
    /// assert_eq!(RequestDescriptor::states().with_zoom_level(7).effective_tolerance(), Some(0.02));
    /// let explicit_zero = RequestDescriptor::states().with_zoom_level(7).with_tolerance(0.0);
    /// assert_eq!(explicit_zero.effective_tolerance(), None);
    /// ```
    #[must_use]
    pub fn effective_tolerance(&self) -> Option<f64> {
        let tolerance = match (self.tolerance, self.zoom_level) {
            (Some(tolerance), _) => tolerance,
            (None, Some(zoom)) => tolerance_for_zoom(Some(zoom)),
            (None, None) => return None,
        };
        (tolerance.is_finite() && tolerance > 0.0).then_some(tolerance)
    }
}

/// Failure of a boundary query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A state filter was supplied on a state query.
    #[error("state_filter applies to county queries only")]
    StateFilterNotApplicable,
}

/// Request summary attached to every log line of one query.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    kind: EntityKind,
    parent: Option<&'a EntityId>,
    bbox: bool,
    tolerance: Option<f64>,
    include_geometry: bool,
}

impl<'a> QueryContext<'a> {
    /// Summarise `descriptor`.
    #[must_use]
    pub fn new(descriptor: &'a RequestDescriptor) -> Self {
        Self {
            kind: descriptor.kind,
            parent: descriptor.state_filter.as_ref(),
            bbox: descriptor.bbox.predicate().is_some(),
            tolerance: descriptor.effective_tolerance(),
            include_geometry: descriptor.include_geometry,
        }
    }
}

impl fmt::Display for QueryContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind={}", self.kind)?;
        if let Some(parent) = self.parent {
            write!(f, " parent={parent}")?;
        }
        write!(f, " bbox={}", if self.bbox { "on" } else { "off" })?;
        match self.tolerance {
            Some(tolerance) => write!(f, " tolerance={tolerance}")?,
            None => f.write_str(" tolerance=none")?,
        }
        write!(f, " geometry={}", self.include_geometry)
    }
}

/// Serves GeoJSON features for states and counties from a store.
///
/// # Examples
///
/// ```
/// use boundary_core::{
///     EntityAttributes, EntityId, GeoQueryService, GeographicEntity, RequestDescriptor,
///     StateBoundary, StoredGeometry, test_support::MemoryStore,
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let geometry = StoredGeometry::from_encoded(r#"{"type":"Point","coordinates":[-157.8,21.3]}"#);
/// let hawaii = StateBoundary::new(EntityAttributes::new(EntityId::new("S1")?, "Hawaii", geometry)?);
/// let service = GeoQueryService::new(MemoryStore::with_entities([GeographicEntity::from(hawaii)]));
///
/// let collection = service.query_collection(&RequestDescriptor::states())?;
/// assert_eq!(collection.features[0].properties["name"], "Hawaii");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GeoQueryService<S> {
    store: S,
}

impl<S> GeoQueryService<S>
where
    S: BoundaryStore,
{
    /// Create a service reading from `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Run a query and return features in storage order.
    ///
    /// An unknown state in the filter, or no matches at all, yields an empty
    /// list rather than an error.
    pub fn query(&self, descriptor: &RequestDescriptor) -> Result<Vec<Feature>, QueryError> {
        if descriptor.kind == EntityKind::State && descriptor.state_filter.is_some() {
            return Err(QueryError::StateFilterNotApplicable);
        }

        let context = QueryContext::new(descriptor);
        debug!("Boundary query started ({context})");

        let mut entity_query = EntityQuery::all(descriptor.kind);
        if let Some(parent) = &descriptor.state_filter {
            entity_query = entity_query.with_parent(parent.clone());
        }
        if let Some(predicate) = descriptor.bbox.predicate() {
            entity_query = entity_query.with_predicate(predicate);
        }

        let entities = self.store.list_entities(&entity_query)?;
        let tolerance = descriptor.effective_tolerance();
        let mut degraded = 0_usize;
        let mut features = Vec::with_capacity(entities.len());
        for entity in &entities {
            let geometry = if descriptor.include_geometry {
                let resolution = self.resolve_geometry(entity, tolerance)?;
                if let Some(reason) = resolution.degraded_reason() {
                    degraded += 1;
                    warn!(
                        "Serving placeholder geometry for {} {} ({context}): {reason}",
                        entity.kind(),
                        entity.id()
                    );
                }
                resolution.into_geometry()
            } else {
                placeholder_geometry()
            };
            features.push(assemble_feature(entity, geometry));
        }

        info!(
            "Boundary query returned {} features, {degraded} degraded ({context})",
            features.len()
        );
        Ok(features)
    }

    /// Run a query and wrap the features in a collection.
    pub fn query_collection(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<FeatureCollection, QueryError> {
        self.query(descriptor).map(FeatureCollection::new)
    }

    /// Convert one entity's geometry, simplifying it first when a tolerance
    /// is given.
    ///
    /// Simplification is requested from the store once per entity.
    pub fn resolve_geometry(
        &self,
        entity: &GeographicEntity,
        tolerance: Option<f64>,
    ) -> Result<GeometryResolution, StoreError> {
        match tolerance {
            Some(tolerance) => {
                let simplified =
                    self.store
                        .simplify_geometry(entity.id(), entity.kind(), tolerance)?;
                Ok(to_geojson(simplified.as_ref()))
            }
            None => Ok(to_geojson(Some(entity.geometry()))),
        }
    }
}
