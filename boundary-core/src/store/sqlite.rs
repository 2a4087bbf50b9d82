//! SQLite-backed store for persisted state and county boundaries.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use log::debug;
use rstar::{AABB, RTree, RTreeObject};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params_from_iter};
use thiserror::Error;

use crate::bbox::SpatialPredicate;
use crate::entity::{
    CountyBoundary, EntityAttributes, EntityId, EntityKind, ExtraProperties, GeographicEntity,
    StateBoundary,
};
use crate::geometry::{StoredGeometry, simplify_stored};

use super::{BoundaryStore, EntityQuery, StoreError};

/// SQLite limits bound parameters per statement to 999 by default. The store
/// chunks `IN` queries to remain below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Tables read by [`SqliteBoundaryStore`] and written by the ingestion side.
///
/// Geometry columns hold GeoJSON geometry text in EPSG:4326. The envelope
/// columns are the geometry's bounding rectangle and feed the in-memory
/// R\*-trees the store builds from them.
pub const SQLITE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS states (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    abbreviation TEXT UNIQUE,
    fips_code TEXT UNIQUE,
    population INTEGER,
    area_sq_miles REAL,
    properties TEXT,
    geometry TEXT NOT NULL,
    centroid TEXT,
    min_lon REAL NOT NULL,
    min_lat REAL NOT NULL,
    max_lon REAL NOT NULL,
    max_lat REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS counties (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    fips_code TEXT UNIQUE,
    state_id TEXT NOT NULL REFERENCES states(id),
    population INTEGER,
    area_sq_miles REAL,
    properties TEXT,
    geometry TEXT NOT NULL,
    centroid TEXT,
    min_lon REAL NOT NULL,
    min_lat REAL NOT NULL,
    max_lon REAL NOT NULL,
    max_lat REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS counties_state_id ON counties(state_id);
";

/// Error raised when opening a boundary database.
#[derive(Debug, Error)]
pub enum SqliteBoundaryStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Reading the envelopes for the spatial index failed.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Bounding rectangle of one stored row.
#[derive(Debug, Clone, PartialEq)]
struct IndexedEnvelope {
    rowid: i64,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Envelope trees for both tables, tagged with the `data_version` they were
/// read at.
struct SpatialIndex {
    data_version: i64,
    states: RTree<IndexedEnvelope>,
    counties: RTree<IndexedEnvelope>,
}

impl SpatialIndex {
    fn load(connection: &Connection) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            data_version: data_version(connection)?,
            states: RTree::bulk_load(load_envelopes(connection, EntityKind::State)?),
            counties: RTree::bulk_load(load_envelopes(connection, EntityKind::County)?),
        })
    }

    const fn tree(&self, kind: EntityKind) -> &RTree<IndexedEnvelope> {
        match kind {
            EntityKind::State => &self.states,
            EntityKind::County => &self.counties,
        }
    }

    fn candidate_rowids(&self, kind: EntityKind, predicate: &SpatialPredicate) -> Vec<i64> {
        let rect = predicate.envelope();
        let envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        let mut rowids: Vec<i64> = self
            .tree(kind)
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.rowid)
            .collect();
        rowids.sort_unstable();
        rowids
    }
}

struct Inner {
    connection: Connection,
    index: SpatialIndex,
}

/// Read-only boundary store backed by SQLite and in-memory R\*-trees.
///
/// Rows are returned in `rowid` order, which is the order they were
/// inserted unless the table has been rebuilt.
///
/// The ingestion job may write to the same file while the store is open.
/// The trees are rebuilt before a spatial lookup whenever SQLite reports
/// that another connection has committed since they were loaded.
pub struct SqliteBoundaryStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl fmt::Debug for SqliteBoundaryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBoundaryStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteBoundaryStore {
    /// Open a boundary database read-only and index its envelopes.
    pub fn open<P>(database_path: P) -> Result<Self, SqliteBoundaryStoreError>
    where
        P: AsRef<Path>,
    {
        let database_path = database_path.as_ref();
        let connection =
            Connection::open_with_flags(database_path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
                |source| SqliteBoundaryStoreError::OpenDatabase {
                    path: database_path.to_path_buf(),
                    source,
                },
            )?;

        let index = SpatialIndex::load(&connection)?;
        debug!(
            "Opened boundary database {} with {} states and {} counties",
            database_path.display(),
            index.states.size(),
            index.counties.size()
        );

        Ok(Self {
            path: database_path.to_path_buf(),
            inner: Mutex::new(Inner { connection, index }),
        })
    }

    /// Number of rows of `kind` currently stored.
    pub fn len(&self, kind: EntityKind) -> Result<usize, StoreError> {
        let inner = self.refreshed()?;
        Ok(inner.index.tree(kind).size())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Unavailable {
            reason: "SQLite connection lock was poisoned".to_owned(),
        })
    }

    /// Lock the connection, rebuilding the trees if the file changed.
    fn refreshed(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let mut inner = self.lock()?;
        let current = data_version(&inner.connection).map_err(StoreError::backend)?;
        if current != inner.index.data_version {
            debug!(
                "Boundary database {} changed; rebuilding spatial index",
                self.path.display()
            );
            let index = SpatialIndex::load(&inner.connection).map_err(StoreError::backend)?;
            inner.index = index;
        }
        Ok(inner)
    }
}

impl BoundaryStore for SqliteBoundaryStore {
    fn list_entities(&self, query: &EntityQuery) -> Result<Vec<GeographicEntity>, StoreError> {
        if query.kind == EntityKind::State && query.parent.is_some() {
            return Ok(Vec::new());
        }
        let Some(predicate) = query.predicate else {
            let inner = self.lock()?;
            return scan_rows(&inner.connection, query.kind, query.parent.as_ref());
        };

        let inner = self.refreshed()?;
        let rowids = inner.index.candidate_rowids(query.kind, &predicate);
        debug!(
            "Spatial index yielded {} candidate {} rows",
            rowids.len(),
            query.kind
        );
        let mut entities = Vec::with_capacity(rowids.len());
        for chunk in rowids.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
            entities.extend(load_rows_chunk(&inner.connection, query.kind, chunk)?);
        }
        // Undecodable geometry is kept so that the codec can degrade it visibly.
        entities.retain(|entity| {
            query.selects(entity)
                && entity
                    .geometry()
                    .decode()
                    .map_or(true, |shape| predicate.matches(&shape))
        });
        Ok(entities)
    }

    fn simplify_geometry(
        &self,
        id: &EntityId,
        kind: EntityKind,
        tolerance: f64,
    ) -> Result<Option<StoredGeometry>, StoreError> {
        let inner = self.lock()?;
        let sql = format!("SELECT geometry FROM {} WHERE id = ?1", table_name(kind));
        let geometry: Option<String> = inner
            .connection
            .query_row(&sql, [id.as_str()], |row| row.get(0))
            .optional()
            .map_err(StoreError::backend)?;
        Ok(geometry.map(|text| simplify_stored(&StoredGeometry::from_encoded(text), tolerance)))
    }
}

const fn table_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::State => "states",
        EntityKind::County => "counties",
    }
}

// Both tables are read through the same column layout; the columns a kind
// lacks are selected as NULL.
const fn select_columns(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::State => {
            "rowid, id, name, abbreviation, fips_code, NULL, population, area_sq_miles, \
             properties, geometry, centroid"
        }
        EntityKind::County => {
            "rowid, id, name, NULL, fips_code, state_id, population, area_sq_miles, \
             properties, geometry, centroid"
        }
    }
}

/// Counter that changes whenever another connection commits to the file.
fn data_version(connection: &Connection) -> Result<i64, rusqlite::Error> {
    connection.query_row("PRAGMA data_version", [], |row| row.get(0))
}

fn load_envelopes(
    connection: &Connection,
    kind: EntityKind,
) -> Result<Vec<IndexedEnvelope>, rusqlite::Error> {
    let sql = format!(
        "SELECT rowid, min_lon, min_lat, max_lon, max_lat FROM {}",
        table_name(kind)
    );
    let mut statement = connection.prepare(&sql)?;
    let entries = statement
        .query_map([], |row| {
            let min: [f64; 2] = [row.get(1)?, row.get(2)?];
            let max: [f64; 2] = [row.get(3)?, row.get(4)?];
            Ok(IndexedEnvelope {
                rowid: row.get(0)?,
                envelope: AABB::from_corners(min, max),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

fn scan_rows(
    connection: &Connection,
    kind: EntityKind,
    parent: Option<&EntityId>,
) -> Result<Vec<GeographicEntity>, StoreError> {
    let mut sql = format!("SELECT {} FROM {}", select_columns(kind), table_name(kind));
    let mut params = Vec::new();
    if let Some(parent) = parent {
        sql.push_str(" WHERE state_id = ?1");
        params.push(parent.as_str());
    }
    sql.push_str(" ORDER BY rowid");
    let mut statement = connection.prepare(&sql).map_err(StoreError::backend)?;
    let raw_rows = statement
        .query_map(params_from_iter(params), RawRow::from_row)
        .map_err(StoreError::backend)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::backend)?;
    raw_rows
        .into_iter()
        .map(|raw| raw.into_entity(kind))
        .collect()
}

fn load_rows_chunk(
    connection: &Connection,
    kind: EntityKind,
    rowids: &[i64],
) -> Result<Vec<GeographicEntity>, StoreError> {
    if rowids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; rowids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM {} WHERE rowid IN ({placeholders}) ORDER BY rowid",
        select_columns(kind),
        table_name(kind)
    );
    let mut statement = connection.prepare(&sql).map_err(StoreError::backend)?;
    let raw_rows = statement
        .query_map(params_from_iter(rowids.iter()), RawRow::from_row)
        .map_err(StoreError::backend)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::backend)?;
    raw_rows
        .into_iter()
        .map(|raw| raw.into_entity(kind))
        .collect()
}

/// Column values exactly as SQLite returned them.
struct RawRow {
    id: String,
    name: String,
    abbreviation: Option<String>,
    fips_code: Option<String>,
    state_id: Option<String>,
    population: Option<i64>,
    area_sq_miles: Option<f64>,
    properties: Option<String>,
    geometry: String,
    centroid: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(1)?,
            name: row.get(2)?,
            abbreviation: row.get(3)?,
            fips_code: row.get(4)?,
            state_id: row.get(5)?,
            population: row.get(6)?,
            area_sq_miles: row.get(7)?,
            properties: row.get(8)?,
            geometry: row.get(9)?,
            centroid: row.get(10)?,
        })
    }

    fn into_entity(self, kind: EntityKind) -> Result<GeographicEntity, StoreError> {
        let malformed = |reason: String| StoreError::MalformedRow {
            kind,
            id: self.id.clone(),
            reason,
        };

        let id = EntityId::new(self.id.as_str()).map_err(|err| malformed(err.to_string()))?;
        let mut attributes = EntityAttributes::new(
            id,
            self.name.as_str(),
            StoredGeometry::from_encoded(self.geometry.as_str()),
        )
        .map_err(|err| malformed(err.to_string()))?;
        if let Some(population) = self.population {
            attributes = attributes.with_population(population);
        }
        if let Some(area) = self.area_sq_miles {
            attributes = attributes.with_area_sq_miles(area);
        }
        if let Some(text) = self.properties.as_deref() {
            let properties: ExtraProperties = serde_json::from_str(text)
                .map_err(|err| malformed(format!("invalid properties: {err}")))?;
            attributes = attributes.with_extra_properties(properties);
        }
        if let Some(centroid) = self.centroid.as_deref() {
            attributes = attributes.with_centroid(StoredGeometry::from_encoded(centroid));
        }

        let entity = match kind {
            EntityKind::State => {
                let mut state = StateBoundary::new(attributes);
                state.abbreviation = self.abbreviation.clone();
                state.fips_code = self.fips_code.clone();
                GeographicEntity::State(state)
            }
            EntityKind::County => {
                let state_id = self
                    .state_id
                    .as_deref()
                    .ok_or_else(|| malformed("missing state_id".to_owned()))
                    .and_then(|text| {
                        EntityId::new(text).map_err(|err| malformed(format!("state_id: {err}")))
                    })?;
                let mut county = CountyBoundary::new(attributes, state_id);
                county.fips_code = self.fips_code.clone();
                GeographicEntity::County(county)
            }
        };
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::bbox_predicate;
    use geo::CoordsIter;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const SQUARE: &str =
        r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;

    struct Fixture {
        _dir: TempDir,
        path: PathBuf,
    }

    impl Fixture {
        fn connection(&self) -> Connection {
            Connection::open(&self.path).expect("open writable database")
        }

        fn insert_state(&self, id: &str, name: &str, geometry: &str, bounds: [f64; 4]) {
            self.connection()
                .execute(
                    "INSERT INTO states (id, name, geometry, min_lon, min_lat, max_lon, max_lat)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![id, name, geometry, bounds[0], bounds[1], bounds[2], bounds[3]],
                )
                .expect("insert state");
        }

        fn insert_county(&self, id: &str, state_id: &str, geometry: &str, bounds: [f64; 4]) {
            self.connection()
                .execute(
                    "INSERT INTO counties
                        (id, name, state_id, geometry, min_lon, min_lat, max_lon, max_lat)
                     VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        id, state_id, geometry, bounds[0], bounds[1], bounds[2], bounds[3]
                    ],
                )
                .expect("insert county");
        }

        fn open(&self) -> SqliteBoundaryStore {
            SqliteBoundaryStore::open(&self.path).expect("open store")
        }
    }

    fn point(x: f64, y: f64) -> String {
        format!(r#"{{"type":"Point","coordinates":[{x},{y}]}}"#)
    }

    #[fixture]
    fn database() -> Fixture {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("boundaries.db");
        Connection::open(&path)
            .expect("create database")
            .execute_batch(SQLITE_SCHEMA)
            .expect("apply schema");
        Fixture { _dir: dir, path }
    }

    fn ids(entities: &[GeographicEntity]) -> Vec<&str> {
        entities.iter().map(|entity| entity.id().as_str()).collect()
    }

    #[rstest]
    fn scans_return_rows_in_insertion_order(database: Fixture) {
        database.insert_state("S2", "Oregon", &point(-120.0, 44.0), [-120.0, 44.0, -120.0, 44.0]);
        database.insert_state("S1", "Hawaii", &point(-157.0, 21.0), [-157.0, 21.0, -157.0, 21.0]);
        let store = database.open();

        let states = store
            .list_entities(&EntityQuery::all(EntityKind::State))
            .expect("list states");
        assert_eq!(ids(&states), vec!["S2", "S1"]);
        assert_eq!(store.len(EntityKind::State).expect("count states"), 2);
    }

    #[rstest]
    fn parent_filter_selects_children(database: Fixture) {
        database.insert_state("S1", "Hawaii", SQUARE, [0.0, 0.0, 1.0, 1.0]);
        database.insert_state("S2", "Oregon", SQUARE, [0.0, 0.0, 1.0, 1.0]);
        database.insert_county("C1", "S1", &point(0.1, 0.1), [0.1, 0.1, 0.1, 0.1]);
        database.insert_county("C2", "S2", &point(0.2, 0.2), [0.2, 0.2, 0.2, 0.2]);
        database.insert_county("C3", "S1", &point(0.3, 0.3), [0.3, 0.3, 0.3, 0.3]);
        let store = database.open();

        let query = EntityQuery::all(EntityKind::County)
            .with_parent(EntityId::new("S1").expect("valid id"));
        let counties = store.list_entities(&query).expect("list counties");
        assert_eq!(ids(&counties), vec!["C1", "C3"]);
        assert!(counties
            .iter()
            .all(|county| county.parent_id().map(EntityId::as_str) == Some("S1")));
    }

    #[rstest]
    fn bbox_uses_exact_geometry_after_the_index(database: Fixture) {
        // The envelope of this L-shaped polygon covers (0.9, 0.9) but the shape does not.
        let l_shape = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,0.2],[0.2,0.2],[0.2,1],[0,1],[0,0]]]}"#;
        database.insert_state("S1", "Ell", l_shape, [0.0, 0.0, 1.0, 1.0]);
        database.insert_state("S2", "Dot", &point(0.95, 0.95), [0.95, 0.95, 0.95, 0.95]);
        database.insert_state("S3", "Far", &point(5.0, 5.0), [5.0, 5.0, 5.0, 5.0]);
        let store = database.open();

        let predicate = bbox_predicate(Some(0.8), Some(0.8), Some(1.0), Some(1.0)).expect("box");
        let query = EntityQuery::all(EntityKind::State).with_predicate(predicate);
        let states = store.list_entities(&query).expect("list states");
        assert_eq!(ids(&states), vec!["S2"]);
    }

    #[rstest]
    fn bbox_sees_rows_written_after_open(database: Fixture) {
        database.insert_state("S1", "Drifter", &point(50.0, 50.0), [50.0, 50.0, 50.0, 50.0]);
        let store = database.open();

        database
            .connection()
            .execute(
                "UPDATE states SET geometry = ?1, min_lon = 0.5, min_lat = 0.5,
                     max_lon = 0.5, max_lat = 0.5 WHERE id = 'S1'",
                [point(0.5, 0.5)],
            )
            .expect("move state");
        database.insert_state("S2", "Newcomer", &point(0.6, 0.6), [0.6, 0.6, 0.6, 0.6]);

        let predicate = bbox_predicate(Some(0.0), Some(0.0), Some(1.0), Some(1.0)).expect("box");
        let query = EntityQuery::all(EntityKind::State).with_predicate(predicate);
        let states = store.list_entities(&query).expect("list states");
        assert_eq!(ids(&states), vec!["S1", "S2"]);
        assert_eq!(store.len(EntityKind::State).expect("count states"), 2);

        let far = bbox_predicate(Some(49.0), Some(49.0), Some(51.0), Some(51.0)).expect("box");
        let stale = store
            .list_entities(&EntityQuery::all(EntityKind::State).with_predicate(far))
            .expect("list states");
        assert!(stale.is_empty(), "moved row still matched its old envelope");
    }

    #[rstest]
    fn bbox_keeps_rows_with_undecodable_geometry(database: Fixture) {
        database.insert_state("S1", "Broken", "not geojson", [0.0, 0.0, 1.0, 1.0]);
        let store = database.open();

        let predicate = bbox_predicate(Some(0.0), Some(0.0), Some(2.0), Some(2.0)).expect("box");
        let query = EntityQuery::all(EntityKind::State).with_predicate(predicate);
        let states = store.list_entities(&query).expect("list states");
        assert_eq!(ids(&states), vec!["S1"]);
    }

    #[rstest]
    fn bbox_queries_chunk_large_candidate_sets(database: Fixture) {
        database.insert_state("S1", "Grid", SQUARE, [0.0, 0.0, 1.0, 1.0]);
        {
            let mut connection = database.connection();
            let tx = connection.transaction().expect("begin transaction");
            for i in 0..1_200_u32 {
                let x = f64::from(i) / 10_000.0;
                tx.execute(
                    "INSERT INTO counties
                        (id, name, state_id, geometry, min_lon, min_lat, max_lon, max_lat)
                     VALUES (?1, ?1, 'S1', ?2, ?3, 0.5, ?3, 0.5)",
                    rusqlite::params![format!("C{i:04}"), point(x, 0.5), x],
                )
                .expect("insert county");
            }
            tx.commit().expect("commit");
        }
        let store = database.open();

        let predicate = bbox_predicate(Some(0.0), Some(0.0), Some(1.0), Some(1.0)).expect("box");
        let query = EntityQuery::all(EntityKind::County).with_predicate(predicate);
        let counties = store.list_entities(&query).expect("list counties");
        assert_eq!(counties.len(), 1_200);
        assert_eq!(counties.first().map(|c| c.id().as_str()), Some("C0000"));
        assert_eq!(counties.last().map(|c| c.id().as_str()), Some("C1199"));
    }

    #[rstest]
    fn simplify_reduces_vertices_and_reports_missing_rows(database: Fixture) {
        let jagged = r#"{"type":"Polygon","coordinates":[[[0,0],[0.5,0.0001],[1,0],[1,1],[0,1],[0,0]]]}"#;
        database.insert_state("S1", "Jagged", jagged, [0.0, 0.0, 1.0, 1.0]);
        let store = database.open();
        let id = EntityId::new("S1").expect("valid id");

        let simplified = store
            .simplify_geometry(&id, EntityKind::State, 0.01)
            .expect("simplify")
            .expect("row exists");
        let before = StoredGeometry::from_encoded(jagged).decode().expect("decode");
        let after = simplified.decode().expect("decode simplified");
        assert!(after.coords_count() < before.coords_count());

        let ghost = EntityId::new("S9").expect("valid id");
        assert_eq!(
            store
                .simplify_geometry(&ghost, EntityKind::State, 0.01)
                .expect("simplify"),
            None
        );
    }

    #[rstest]
    fn invalid_properties_are_reported(database: Fixture) {
        database
            .connection()
            .execute(
                "INSERT INTO states (id, name, properties, geometry, min_lon, min_lat, max_lon, max_lat)
                 VALUES ('S1', 'Hawaii', 'not-json', ?1, 0, 0, 0, 0)",
                [point(0.0, 0.0)],
            )
            .expect("insert state");
        let store = database.open();

        let error = store
            .list_entities(&EntityQuery::all(EntityKind::State))
            .expect_err("invalid properties should fail");
        assert!(matches!(
            error,
            StoreError::MalformedRow { kind: EntityKind::State, ref id, .. } if id == "S1"
        ));
    }

    #[rstest]
    fn opening_a_missing_file_fails() {
        let dir = TempDir::new().expect("create temp dir");
        let error = SqliteBoundaryStore::open(dir.path().join("absent.db"))
            .expect_err("missing database should fail");
        assert!(matches!(error, SqliteBoundaryStoreError::OpenDatabase { .. }));
    }

    #[rstest]
    fn opening_a_database_without_tables_fails() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .expect("create database")
            .execute_batch("CREATE TABLE unrelated (x INTEGER);")
            .expect("create table");
        let error = SqliteBoundaryStore::open(&path).expect_err("missing tables should fail");
        assert!(matches!(error, SqliteBoundaryStoreError::Database(_)));
    }
}
