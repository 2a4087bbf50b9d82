//! Read-only storage access for boundary entities.
//!
//! The [`BoundaryStore`] trait is the seam between the query pipeline and
//! whatever holds the boundary rows. Stores return entities in their own
//! stable iteration order and perform simplification on request.

use std::{error::Error as StdError, sync::Arc};

use thiserror::Error;

use crate::bbox::SpatialPredicate;
use crate::entity::{EntityId, EntityKind, GeographicEntity};
use crate::geometry::StoredGeometry;

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SQLITE_SCHEMA, SqliteBoundaryStore, SqliteBoundaryStoreError};

/// Selection passed to [`BoundaryStore::list_entities`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    /// Which table to read.
    pub kind: EntityKind,
    /// Owning state; only meaningful for counties.
    pub parent: Option<EntityId>,
    /// Optional spatial filter.
    pub predicate: Option<SpatialPredicate>,
}

impl EntityQuery {
    /// Select every entity of `kind`.
    #[must_use]
    pub const fn all(kind: EntityKind) -> Self {
        Self {
            kind,
            parent: None,
            predicate: None,
        }
    }

    /// Restrict to children of `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Restrict to entities matching `predicate`.
    #[must_use]
    pub fn with_predicate(mut self, predicate: SpatialPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Whether `entity` satisfies the kind and parent parts of the query.
    ///
    /// The spatial predicate is left to the store, which may evaluate it
    /// against an index rather than decoded geometry.
    #[must_use]
    pub fn selects(&self, entity: &GeographicEntity) -> bool {
        entity.kind() == self.kind
            && self
                .parent
                .as_ref()
                .is_none_or(|parent| entity.parent_id() == Some(parent))
    }
}

/// Failure raised by a storage backend.
///
/// Any of these aborts the request; the query pipeline does not retry.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend reported an error while executing a read.
    #[error("storage backend failed: {source}")]
    Backend {
        /// Underlying driver error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The backend could not be reached.
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// Human-readable explanation.
        reason: String,
    },
    /// A stored row could not be turned into an entity.
    #[error("malformed {kind} row {id}: {reason}")]
    MalformedRow {
        /// Table the row came from.
        kind: EntityKind,
        /// Identifier as stored.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl StoreError {
    /// Wrap a backend error.
    pub fn backend<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(source),
        }
    }
}

/// Read-only access to persisted state and county boundaries.
///
/// Geometry uses EPSG:4326 with axis order (longitude, latitude).
///
/// # Examples
///
/// ```rust
/// use boundary_core::{
///     BoundaryStore, EntityAttributes, EntityId, EntityKind, EntityQuery,
///     GeographicEntity, StateBoundary, StoreError, StoredGeometry,
/// };
///
/// struct SingleState(GeographicEntity);
///
/// impl BoundaryStore for SingleState {
///     fn list_entities(&self, query: &EntityQuery) -> Result<Vec<GeographicEntity>, StoreError> {
///         Ok(std::iter::once(&self.0)
///             .filter(|entity| query.selects(entity))
///             .cloned()
///             .collect())
///     }
///
///     fn simplify_geometry(
///         &self,
///         id: &EntityId,
///         _kind: EntityKind,
///         _tolerance: f64,
///     ) -> Result<Option<StoredGeometry>, StoreError> {
///         Ok((self.0.id() == id).then(|| self.0.geometry().clone()))
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let geometry = StoredGeometry::from_encoded(r#"{"type":"Point","coordinates":[0,0]}"#);
/// let state = StateBoundary::new(EntityAttributes::new(EntityId::new("S1")?, "Hawaii", geometry)?);
/// let store = SingleState(state.into());
/// assert_eq!(store.list_entities(&EntityQuery::all(EntityKind::State))?.len(), 1);
/// assert!(store.list_entities(&EntityQuery::all(EntityKind::County))?.is_empty());
/// # Ok(())
/// # }
/// ```
pub trait BoundaryStore {
    /// Return the entities selected by `query` in stable storage order.
    ///
    /// An empty result is not an error. Raw geometry is included.
    fn list_entities(&self, query: &EntityQuery) -> Result<Vec<GeographicEntity>, StoreError>;

    /// Return a topology-preserving simplification of one entity's geometry.
    ///
    /// `Ok(None)` means the entity no longer exists.
    fn simplify_geometry(
        &self,
        id: &EntityId,
        kind: EntityKind,
        tolerance: f64,
    ) -> Result<Option<StoredGeometry>, StoreError>;
}

impl<S> BoundaryStore for Arc<S>
where
    S: BoundaryStore + ?Sized,
{
    fn list_entities(&self, query: &EntityQuery) -> Result<Vec<GeographicEntity>, StoreError> {
        (**self).list_entities(query)
    }

    fn simplify_geometry(
        &self,
        id: &EntityId,
        kind: EntityKind,
        tolerance: f64,
    ) -> Result<Option<StoredGeometry>, StoreError> {
        (**self).simplify_geometry(id, kind, tolerance)
    }
}
