//! Fixture boundaries and database builders shared by the CLI tests.

use boundary_core::{
    CountyBoundary, EntityAttributes, EntityId, GeographicEntity, StateBoundary, StoredGeometry,
};
use boundary_data::persist_entities_to_sqlite;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

const HAWAII: &str = r#"{"type":"MultiPolygon","coordinates":[[[[-160.2,18.9],[-154.8,18.9],[-154.8,22.2],[-160.2,22.2],[-160.2,18.9]]]]}"#;
const OREGON: &str = r#"{"type":"Polygon","coordinates":[[[-124.6,42.0],[-116.5,42.0],[-116.5,46.3],[-124.6,46.3],[-124.6,42.0]]]}"#;
const HONOLULU: &str = r#"{"type":"Polygon","coordinates":[[[-158.3,21.2],[-157.6,21.2],[-157.6,21.7],[-158.3,21.7],[-158.3,21.2]]]}"#;
const MULTNOMAH: &str = r#"{"type":"Polygon","coordinates":[[[-122.9,45.4],[-121.8,45.4],[-121.8,45.7],[-122.9,45.7],[-122.9,45.4]]]}"#;

pub(super) fn id(text: &str) -> EntityId {
    EntityId::new(text).expect("valid id")
}

fn attributes(key: &str, name: &str, geometry: &str) -> EntityAttributes {
    EntityAttributes::new(id(key), name, StoredGeometry::from_encoded(geometry))
        .expect("valid attributes")
}

/// Hawaii, Oregon and one county in each, in import order.
pub(super) fn sample_entities() -> Vec<GeographicEntity> {
    vec![
        StateBoundary::new(attributes("S15", "Hawaii", HAWAII))
            .with_abbreviation("HI")
            .with_fips_code("15")
            .into(),
        StateBoundary::new(attributes("S41", "Oregon", OREGON))
            .with_abbreviation("OR")
            .with_fips_code("41")
            .into(),
        CountyBoundary::new(attributes("C15003", "Honolulu", HONOLULU), id("S15"))
            .with_fips_code("15003")
            .into(),
        CountyBoundary::new(attributes("C41051", "Multnomah", MULTNOMAH), id("S41"))
            .with_fips_code("41051")
            .into(),
    ]
}

pub(super) fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 temp dir")
}

pub(super) fn write_boundary_db(path: &Utf8Path) {
    persist_entities_to_sqlite(path, &sample_entities()).expect("persist sample boundaries");
}

pub(super) fn names(collection: &serde_json::Value) -> Vec<String> {
    collection["features"]
        .as_array()
        .expect("features array")
        .iter()
        .map(|feature| {
            feature["properties"]["name"]
                .as_str()
                .expect("name property")
                .to_owned()
        })
        .collect()
}
