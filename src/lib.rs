//! Facade crate for the boundary engine.
//!
//! This crate re-exports the query pipeline that turns stored state and county
//! boundaries into GeoJSON, and exposes the SQLite store behind a feature flag.

#![forbid(unsafe_code)]

pub use boundary_core::{
    BboxBounds, BoundaryStore, BoundingBox, CountyBoundary, DegradeReason, EntityAttributes,
    EntityId, EntityKind, EntityQuery, Feature, FeatureCollection, GeoQueryService,
    GeographicEntity, GeometryResolution, QueryError, RequestDescriptor, SpatialPredicate,
    StateBoundary, StoreError, StoredGeometry, bbox_predicate, tolerance_for_zoom,
};

#[cfg(feature = "store-sqlite")]
pub use boundary_core::{SqliteBoundaryStore, SqliteBoundaryStoreError};
