//! In-memory `BoundaryStore` implementations used by unit and behaviour
//! tests.

use std::sync::{Mutex, PoisonError};

use crate::{
    BoundaryStore, EntityId, EntityKind, EntityQuery, GeographicEntity, StoreError,
    StoredGeometry, geometry::simplify_stored,
};

/// One call to [`BoundaryStore::simplify_geometry`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifyRequest {
    /// Entity whose geometry was requested.
    pub id: EntityId,
    /// Kind passed alongside the id.
    pub kind: EntityKind,
    /// Requested tolerance in degrees.
    pub tolerance: f64,
}

/// In-memory `BoundaryStore` that records simplification requests.
///
/// The store performs a linear scan and is intended only for small datasets.
#[derive(Default, Debug)]
pub struct MemoryStore {
    entities: Vec<GeographicEntity>,
    simplify_requests: Mutex<Vec<SimplifyRequest>>,
}

impl MemoryStore {
    /// Create a store from a collection of entities, kept in the given order.
    pub fn with_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = GeographicEntity>,
    {
        Self {
            entities: entities.into_iter().collect(),
            simplify_requests: Mutex::new(Vec::new()),
        }
    }

    /// Every simplification request received so far, oldest first.
    pub fn simplify_requests(&self) -> Vec<SimplifyRequest> {
        self.simplify_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BoundaryStore for MemoryStore {
    fn list_entities(&self, query: &EntityQuery) -> Result<Vec<GeographicEntity>, StoreError> {
        Ok(self
            .entities
            .iter()
            .filter(|entity| query.selects(entity))
            .filter(|entity| {
                query.predicate.as_ref().is_none_or(|predicate| {
                    entity
                        .geometry()
                        .decode()
                        .map_or(true, |shape| predicate.matches(&shape))
                })
            })
            .cloned()
            .collect())
    }

    fn simplify_geometry(
        &self,
        id: &EntityId,
        kind: EntityKind,
        tolerance: f64,
    ) -> Result<Option<StoredGeometry>, StoreError> {
        self.simplify_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SimplifyRequest {
                id: id.clone(),
                kind,
                tolerance,
            });
        Ok(self
            .entities
            .iter()
            .find(|entity| entity.kind() == kind && entity.id() == id)
            .map(|entity| simplify_stored(entity.geometry(), tolerance)))
    }
}

/// `BoundaryStore` whose every call fails as if the backend were down.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl BoundaryStore for FailingStore {
    fn list_entities(&self, _query: &EntityQuery) -> Result<Vec<GeographicEntity>, StoreError> {
        Err(unavailable())
    }

    fn simplify_geometry(
        &self,
        _id: &EntityId,
        _kind: EntityKind,
        _tolerance: f64,
    ) -> Result<Option<StoredGeometry>, StoreError> {
        Err(unavailable())
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable {
        reason: "connection refused".to_owned(),
    }
}
