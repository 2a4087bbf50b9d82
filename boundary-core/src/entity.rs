//! Geographic entities served by the query pipeline.
//!
//! States and counties share a common attribute set and differ only in their
//! identifying codes and, for counties, the back-reference to the owning
//! state. The query path treats every entity as read-only.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::geometry::StoredGeometry;

/// Free-form properties carried over from the source data feed.
pub type ExtraProperties = Map<String, Value>;

/// Opaque, stable identifier of a state or county.
///
/// # Examples
///
/// ```
/// use boundary_core::EntityId;
///
/// # fn main() -> Result<(), boundary_core::EntityIdError> {
/// let id = EntityId::new("b2785b90-a07d-4f9a-90d7-10edc3a6fe00")?;
/// assert_eq!(id.as_str(), "b2785b90-a07d-4f9a-90d7-10edc3a6fe00");
/// assert!(EntityId::new("  ").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

/// Errors returned by [`EntityId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityIdError {
    /// The identifier was empty.
    #[error("entity id must not be empty")]
    Empty,
    /// The identifier contained whitespace.
    #[error("entity id {0:?} must not contain whitespace")]
    Whitespace(String),
}

impl EntityId {
    /// Validate and wrap an identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, EntityIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EntityIdError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(EntityIdError::Whitespace(value));
        }
        Ok(Self(value))
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The two entity variants served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A US state (or state-equivalent).
    State,
    /// A county (or county-equivalent) belonging to a state.
    County,
}

/// Error returned when parsing an unknown entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity kind {0:?}; expected \"state\" or \"county\"")]
pub struct UnknownEntityKind(pub String);

impl EntityKind {
    /// Lowercase singular name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::County => "county",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" | "states" => Ok(Self::State),
            "county" | "counties" => Ok(Self::County),
            _ => Err(UnknownEntityKind(s.to_owned())),
        }
    }
}

/// Errors returned when constructing entity attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The display name was empty.
    #[error("entity {id} must have a non-empty name")]
    EmptyName {
        /// Identifier of the rejected entity.
        id: EntityId,
    },
}

/// Attributes shared by states and counties.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAttributes {
    /// Stable identifier.
    pub id: EntityId,
    /// Display name, never empty.
    pub name: String,
    /// Population count, when known.
    pub population: Option<i64>,
    /// Land area in square miles, when known.
    pub area_sq_miles: Option<f64>,
    /// Free-form properties from the source feed.
    pub extra_properties: Option<ExtraProperties>,
    /// Multi-polygon boundary in EPSG:4326.
    pub geometry: StoredGeometry,
    /// Centroid computed at ingestion, if any.
    pub centroid: Option<StoredGeometry>,
}

impl EntityAttributes {
    /// Validate and construct the shared attributes.
    ///
    /// # Examples
    ///
    /// ```
    /// use boundary_core::{EntityAttributes, EntityId, StoredGeometry};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let geometry = StoredGeometry::from_encoded(r#"{"type":"Point","coordinates":[1.0,2.0]}"#);
    /// let attributes = EntityAttributes::new(EntityId::new("S1")?, "Hawaii", geometry)?
    ///     .with_population(1_455_271);
    /// assert_eq!(attributes.population, Some(1_455_271));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        geometry: StoredGeometry,
    ) -> Result<Self, EntityError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EntityError::EmptyName { id });
        }
        Ok(Self {
            id,
            name,
            population: None,
            area_sq_miles: None,
            extra_properties: None,
            geometry,
            centroid: None,
        })
    }

    /// Attach a population count.
    #[must_use]
    pub fn with_population(mut self, population: i64) -> Self {
        self.population = Some(population);
        self
    }

    /// Attach a land area in square miles.
    #[must_use]
    pub fn with_area_sq_miles(mut self, area: f64) -> Self {
        self.area_sq_miles = Some(area);
        self
    }

    /// Attach free-form properties.
    #[must_use]
    pub fn with_extra_properties(mut self, properties: ExtraProperties) -> Self {
        self.extra_properties = Some(properties);
        self
    }

    /// Attach a precomputed centroid.
    #[must_use]
    pub fn with_centroid(mut self, centroid: StoredGeometry) -> Self {
        self.centroid = Some(centroid);
        self
    }
}

/// A state boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct StateBoundary {
    /// Shared attributes.
    pub attributes: EntityAttributes,
    /// Two-letter postal abbreviation.
    pub abbreviation: Option<String>,
    /// Two-digit FIPS code.
    pub fips_code: Option<String>,
}

impl StateBoundary {
    /// Construct a state without identifying codes.
    #[must_use]
    pub const fn new(attributes: EntityAttributes) -> Self {
        Self {
            attributes,
            abbreviation: None,
            fips_code: None,
        }
    }

    /// Attach the postal abbreviation.
    #[must_use]
    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    /// Attach the FIPS code.
    #[must_use]
    pub fn with_fips_code(mut self, fips_code: impl Into<String>) -> Self {
        self.fips_code = Some(fips_code.into());
        self
    }
}

/// A county boundary owned by a state.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyBoundary {
    /// Shared attributes.
    pub attributes: EntityAttributes,
    /// Combined state and county FIPS code.
    pub fips_code: Option<String>,
    /// Identifier of the owning state.
    pub state_id: EntityId,
}

impl CountyBoundary {
    /// Construct a county belonging to `state_id`.
    #[must_use]
    pub const fn new(attributes: EntityAttributes, state_id: EntityId) -> Self {
        Self {
            attributes,
            fips_code: None,
            state_id,
        }
    }

    /// Attach the combined FIPS code.
    #[must_use]
    pub fn with_fips_code(mut self, fips_code: impl Into<String>) -> Self {
        self.fips_code = Some(fips_code.into());
        self
    }
}

/// A state or county as returned by a [`BoundaryStore`](crate::BoundaryStore).
#[derive(Debug, Clone, PartialEq)]
pub enum GeographicEntity {
    /// A state boundary.
    State(StateBoundary),
    /// A county boundary.
    County(CountyBoundary),
}

impl GeographicEntity {
    /// Which variant this entity is.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::State(_) => EntityKind::State,
            Self::County(_) => EntityKind::County,
        }
    }

    /// Attributes shared by both variants.
    #[must_use]
    pub const fn attributes(&self) -> &EntityAttributes {
        match self {
            Self::State(state) => &state.attributes,
            Self::County(county) => &county.attributes,
        }
    }

    /// Identifier of the entity.
    #[must_use]
    pub const fn id(&self) -> &EntityId {
        &self.attributes().id
    }

    /// Display name of the entity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.attributes().name
    }

    /// Raw stored boundary.
    #[must_use]
    pub const fn geometry(&self) -> &StoredGeometry {
        &self.attributes().geometry
    }

    /// Owning state for counties; `None` for states.
    #[must_use]
    pub const fn parent_id(&self) -> Option<&EntityId> {
        match self {
            Self::State(_) => None,
            Self::County(county) => Some(&county.state_id),
        }
    }
}

impl From<StateBoundary> for GeographicEntity {
    fn from(state: StateBoundary) -> Self {
        Self::State(state)
    }
}

impl From<CountyBoundary> for GeographicEntity {
    fn from(county: CountyBoundary) -> Self {
        Self::County(county)
    }
}
