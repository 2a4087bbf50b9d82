//! SQLite persistence for ingested state and county boundaries.

use std::collections::HashSet;

use boundary_core::{
    DegradeReason, EntityAttributes, EntityKind, GeographicEntity, SQLITE_SCHEMA, StoredGeometry,
};
use camino::{Utf8Path, Utf8PathBuf};
use geo::{BoundingRect, Rect};
use log::{info, warn};
use rusqlite::{Connection, Error as SqliteError, Statement, Transaction, params};
use thiserror::Error;

const UPSERT_STATE: &str = "
INSERT INTO states (
    id, name, abbreviation, fips_code, population, area_sq_miles, properties,
    geometry, centroid, min_lon, min_lat, max_lon, max_lat
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    abbreviation = excluded.abbreviation,
    fips_code = excluded.fips_code,
    population = excluded.population,
    area_sq_miles = excluded.area_sq_miles,
    properties = excluded.properties,
    geometry = excluded.geometry,
    centroid = excluded.centroid,
    min_lon = excluded.min_lon,
    min_lat = excluded.min_lat,
    max_lon = excluded.max_lon,
    max_lat = excluded.max_lat";

const UPSERT_COUNTY: &str = "
INSERT INTO counties (
    id, name, fips_code, state_id, population, area_sq_miles, properties,
    geometry, centroid, min_lon, min_lat, max_lon, max_lat
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    fips_code = excluded.fips_code,
    state_id = excluded.state_id,
    population = excluded.population,
    area_sq_miles = excluded.area_sq_miles,
    properties = excluded.properties,
    geometry = excluded.geometry,
    centroid = excluded.centroid,
    min_lon = excluded.min_lon,
    min_lat = excluded.min_lat,
    max_lon = excluded.max_lon,
    max_lat = excluded.max_lat";

/// Counts reported by [`persist_entities_to_sqlite`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    /// States written or updated.
    pub states: usize,
    /// Counties written or updated.
    pub counties: usize,
    /// Counties skipped because their state is unknown.
    pub skipped_orphans: usize,
}

/// Errors raised when persisting boundaries to SQLite.
#[derive(Debug, Error)]
pub enum PersistEntitiesError {
    /// Failed to create the parent directory for the SQLite artefact.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Path of the directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Enabling SQLite foreign keys failed.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the transaction failed.
    #[error("failed to begin boundary persistence transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating the boundary tables failed.
    #[error("failed to create boundary tables")]
    CreateSchema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Reading the identifiers of already persisted states failed.
    #[error("failed to read persisted state identifiers")]
    LoadStateIds {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Preparing an upsert statement failed.
    #[error("failed to prepare {kind} upsert statement")]
    PrepareUpsert {
        /// Table the statement targets.
        kind: EntityKind,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// An entity's geometry could not be decoded or has no extent.
    #[error("invalid geometry for {kind} {id}: {reason}")]
    InvalidGeometry {
        /// Kind of the rejected entity.
        kind: EntityKind,
        /// Identifier of the rejected entity.
        id: String,
        /// Why the geometry was rejected.
        reason: DegradeReason,
    },
    /// Serializing extra properties to JSON failed.
    #[error("failed to serialize properties for {kind} {id}")]
    SerializeProperties {
        /// Kind of the entity being persisted.
        kind: EntityKind,
        /// Identifier of the entity being persisted.
        id: String,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Writing a row failed, for example on a duplicate FIPS code.
    #[error("failed to persist {kind} {id}")]
    PersistRow {
        /// Kind of the entity being persisted.
        kind: EntityKind,
        /// Identifier of the entity being persisted.
        id: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the transaction failed.
    #[error("failed to commit boundary persistence transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Persist state and county boundaries to a SQLite database on disk.
///
/// Rows are upserted by identifier, so re-running an import updates rows in
/// place and keeps their storage order. Parent directories are created and
/// the tables initialised when missing. States are written before counties.
/// A county whose state is neither in `entities` nor already persisted is
/// skipped with a warning and counted in [`PersistSummary::skipped_orphans`].
pub fn persist_entities_to_sqlite(
    path: &Utf8Path,
    entities: &[GeographicEntity],
) -> Result<PersistSummary, PersistEntitiesError> {
    boundary_fs::ensure_parent_dir(path).map_err(|source| {
        PersistEntitiesError::CreateDirectory {
            path: path.parent().unwrap_or(path).to_path_buf(),
            source,
        }
    })?;
    let mut connection =
        Connection::open(path.as_std_path()).map_err(|source| PersistEntitiesError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| PersistEntitiesError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| PersistEntitiesError::BeginTransaction { source })?;
    transaction
        .execute_batch(SQLITE_SCHEMA)
        .map_err(|source| PersistEntitiesError::CreateSchema { source })?;

    let summary = persist_rows(&transaction, entities)?;

    transaction
        .commit()
        .map_err(|source| PersistEntitiesError::Commit { source })?;
    info!(
        "Persisted {} states and {} counties to {path}, skipped {} orphaned counties",
        summary.states, summary.counties, summary.skipped_orphans
    );
    Ok(summary)
}

fn persist_rows(
    transaction: &Transaction<'_>,
    entities: &[GeographicEntity],
) -> Result<PersistSummary, PersistEntitiesError> {
    let mut summary = PersistSummary::default();
    if entities.is_empty() {
        return Ok(summary);
    }

    let mut known_states = load_state_ids(transaction)?;
    let mut upsert_state = prepare(transaction, EntityKind::State)?;
    for entity in entities {
        if let GeographicEntity::State(state) = entity {
            let row = RowValues::new(entity)?;
            upsert_state
                .execute(params![
                    row.id,
                    row.name,
                    state.abbreviation,
                    state.fips_code,
                    row.population,
                    row.area_sq_miles,
                    row.properties,
                    row.geometry,
                    row.centroid,
                    row.envelope.min().x,
                    row.envelope.min().y,
                    row.envelope.max().x,
                    row.envelope.max().y,
                ])
                .map_err(|source| row_error(entity, source))?;
            known_states.insert(row.id.to_owned());
            summary.states += 1;
        }
    }

    let mut upsert_county = prepare(transaction, EntityKind::County)?;
    for entity in entities {
        if let GeographicEntity::County(county) = entity {
            if !known_states.contains(county.state_id.as_str()) {
                warn!(
                    "Skipping county {} ({}): state {} is unknown",
                    county.attributes.id, county.attributes.name, county.state_id
                );
                summary.skipped_orphans += 1;
                continue;
            }
            let row = RowValues::new(entity)?;
            upsert_county
                .execute(params![
                    row.id,
                    row.name,
                    county.fips_code,
                    county.state_id.as_str(),
                    row.population,
                    row.area_sq_miles,
                    row.properties,
                    row.geometry,
                    row.centroid,
                    row.envelope.min().x,
                    row.envelope.min().y,
                    row.envelope.max().x,
                    row.envelope.max().y,
                ])
                .map_err(|source| row_error(entity, source))?;
            summary.counties += 1;
        }
    }

    Ok(summary)
}

fn load_state_ids(transaction: &Transaction<'_>) -> Result<HashSet<String>, PersistEntitiesError> {
    let mut statement = transaction
        .prepare("SELECT id FROM states")
        .map_err(|source| PersistEntitiesError::LoadStateIds { source })?;
    let ids = statement
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|source| PersistEntitiesError::LoadStateIds { source })?
        .collect::<Result<HashSet<_>, _>>()
        .map_err(|source| PersistEntitiesError::LoadStateIds { source })?;
    Ok(ids)
}

fn prepare<'conn>(
    transaction: &'conn Transaction<'_>,
    kind: EntityKind,
) -> Result<Statement<'conn>, PersistEntitiesError> {
    let sql = match kind {
        EntityKind::State => UPSERT_STATE,
        EntityKind::County => UPSERT_COUNTY,
    };
    transaction
        .prepare(sql)
        .map_err(|source| PersistEntitiesError::PrepareUpsert { kind, source })
}

fn row_error(entity: &GeographicEntity, source: SqliteError) -> PersistEntitiesError {
    PersistEntitiesError::PersistRow {
        kind: entity.kind(),
        id: entity.id().to_string(),
        source,
    }
}

/// Columns shared by both tables, ready to bind.
struct RowValues<'a> {
    id: &'a str,
    name: &'a str,
    population: Option<i64>,
    area_sq_miles: Option<f64>,
    properties: Option<String>,
    geometry: &'a str,
    centroid: Option<&'a str>,
    envelope: Rect<f64>,
}

impl<'a> RowValues<'a> {
    fn new(entity: &'a GeographicEntity) -> Result<Self, PersistEntitiesError> {
        let attributes: &'a EntityAttributes = entity.attributes();
        let envelope = envelope_of(&attributes.geometry).map_err(|reason| {
            PersistEntitiesError::InvalidGeometry {
                kind: entity.kind(),
                id: attributes.id.to_string(),
                reason,
            }
        })?;
        let properties = attributes
            .extra_properties
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|source| PersistEntitiesError::SerializeProperties {
                kind: entity.kind(),
                id: attributes.id.to_string(),
                source,
            })?;
        Ok(Self {
            id: attributes.id.as_str(),
            name: attributes.name.as_str(),
            population: attributes.population,
            area_sq_miles: attributes.area_sq_miles,
            properties,
            geometry: attributes.geometry.as_str(),
            centroid: attributes.centroid.as_ref().map(StoredGeometry::as_str),
            envelope,
        })
    }
}

fn envelope_of(geometry: &StoredGeometry) -> Result<Rect<f64>, DegradeReason> {
    geometry
        .decode()?
        .bounding_rect()
        .ok_or_else(|| DegradeReason::Malformed("geometry has no extent".to_owned()))
}
