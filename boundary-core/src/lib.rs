//! Core domain types and query pipeline for the boundary engine.
//!
//! The crate turns stored state and county boundaries into GeoJSON features.
//! A [`GeoQueryService`] picks a simplification tolerance for the requested
//! zoom level, narrows the result set with an optional bounding box, reads
//! entities from a [`BoundaryStore`] and assembles one [`Feature`] per entity.
#![forbid(unsafe_code)]

pub mod bbox;
pub mod entity;
pub mod feature;
pub mod geometry;
pub mod query;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tolerance;

pub use bbox::{BboxBounds, BoundingBox, SpatialPredicate, WGS84_SRID, bbox_predicate};
pub use entity::{
    CountyBoundary, EntityAttributes, EntityError, EntityId, EntityIdError, EntityKind,
    ExtraProperties, GeographicEntity, StateBoundary, UnknownEntityKind,
};
pub use feature::{
    Feature, FeatureCollection, FeatureCollectionType, FeatureType, assemble_feature,
};
pub use geometry::{
    DegradeReason, GeoJsonGeometry, GeometryResolution, StoredGeometry, placeholder_geometry,
    simplify_preserving_topology, simplify_stored, to_geojson,
};
pub use query::{GeoQueryService, QueryContext, QueryError, RequestDescriptor};
pub use store::{BoundaryStore, EntityQuery, StoreError};
#[cfg(feature = "store-sqlite")]
pub use store::{SQLITE_SCHEMA, SqliteBoundaryStore, SqliteBoundaryStoreError};
pub use tolerance::tolerance_for_zoom;
