//! GeoJSON `Feature` and `FeatureCollection` assembly.
//!
//! Properties are built in two tiers. The entity's free-form extras are
//! written first and the reserved attributes are written over them, so a
//! reserved key can never be shadowed by the property bag.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{EntityAttributes, GeographicEntity};
use crate::geometry::GeoJsonGeometry;

/// Literal `type` tag of a feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    /// `"Feature"`.
    #[default]
    Feature,
}

/// Literal `type` tag of a feature collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionType {
    /// `"FeatureCollection"`.
    #[default]
    FeatureCollection,
}

/// One GeoJSON feature as sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Always [`FeatureType::Feature`].
    #[serde(rename = "type")]
    pub kind: FeatureType,
    /// String form of the entity identifier.
    pub id: String,
    /// Resolved geometry or the placeholder point.
    pub geometry: GeoJsonGeometry,
    /// Merged property bag.
    pub properties: Map<String, Value>,
}

/// An ordered list of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always [`FeatureCollectionType::FeatureCollection`].
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    /// Features in storage order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Wrap features without reordering them.
    #[must_use]
    pub const fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: FeatureCollectionType::FeatureCollection,
            features,
        }
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self::new(features)
    }
}

/// Build a feature from an entity and its already-resolved geometry.
///
/// # Examples
///
/// ```
/// use boundary_core::{
///     EntityAttributes, EntityId, StateBoundary, StoredGeometry,
///     feature::assemble_feature, geometry::placeholder_geometry,
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let attributes = EntityAttributes::new(
///     EntityId::new("S1")?,
///     "Hawaii",
///     StoredGeometry::from_encoded(r#"{"type":"Point","coordinates":[0,0]}"#),
/// )?;
/// let state = StateBoundary::new(attributes).with_abbreviation("HI");
/// let feature = assemble_feature(&state.into(), placeholder_geometry());
/// assert_eq!(feature.id, "S1");
/// assert_eq!(feature.properties["abbreviation"], "HI");
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn assemble_feature(entity: &GeographicEntity, geometry: GeoJsonGeometry) -> Feature {
    let attributes = entity.attributes();
    let mut properties = attributes.extra_properties.clone().unwrap_or_default();

    properties.insert("name".to_owned(), Value::from(attributes.name.as_str()));
    properties.insert("id".to_owned(), Value::from(attributes.id.as_str()));
    match entity {
        GeographicEntity::State(state) => {
            insert_present(&mut properties, "abbreviation", state.abbreviation.as_deref());
            insert_present(&mut properties, "fips_code", state.fips_code.as_deref());
        }
        GeographicEntity::County(county) => {
            insert_present(&mut properties, "fips_code", county.fips_code.as_deref());
            properties.insert("state_id".to_owned(), Value::from(county.state_id.as_str()));
        }
    }
    insert_measures(&mut properties, attributes);

    Feature {
        kind: FeatureType::Feature,
        id: attributes.id.to_string(),
        geometry,
        properties,
    }
}

fn insert_measures(properties: &mut Map<String, Value>, attributes: &EntityAttributes) {
    if let Some(population) = attributes.population {
        properties.insert("population".to_owned(), Value::from(population));
    }
    // Non-finite floats have no JSON form and are treated as missing.
    if let Some(area) = attributes.area_sq_miles.filter(|area| area.is_finite()) {
        properties.insert("area_sq_miles".to_owned(), Value::from(area));
    }
}

fn insert_present(properties: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        properties.insert(key.to_owned(), Value::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CountyBoundary, EntityId, StateBoundary};
    use crate::geometry::{StoredGeometry, placeholder_geometry};
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn attributes(id: &str, name: &str) -> EntityAttributes {
        EntityAttributes::new(
            EntityId::new(id).expect("valid id"),
            name,
            StoredGeometry::from_encoded(r#"{"type":"Point","coordinates":[1.0,2.0]}"#),
        )
        .expect("valid attributes")
    }

    fn extras(value: serde_json::Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[fixture]
    fn hawaii() -> GeographicEntity {
        StateBoundary::new(attributes("S1", "Hawaii"))
            .with_abbreviation("HI")
            .into()
    }

    #[rstest]
    fn reserved_keys_win_over_extras() {
        let state: GeographicEntity = StateBoundary::new(
            attributes("S1", "Hawaii").with_extra_properties(extras(json!({
                "name": "should-not-appear",
                "id": "bogus",
                "abbreviation": "XX",
                "nickname": "Aloha State",
            }))),
        )
        .with_abbreviation("HI")
        .into();

        let feature = assemble_feature(&state, placeholder_geometry());
        assert_eq!(feature.properties["name"], json!("Hawaii"));
        assert_eq!(feature.properties["id"], json!("S1"));
        assert_eq!(feature.properties["abbreviation"], json!("HI"));
        assert_eq!(feature.properties["nickname"], json!("Aloha State"));
        let wire = serde_json::to_string(&feature).expect("serialise");
        assert!(!wire.contains("should-not-appear"));
    }

    #[rstest]
    fn extras_fill_reserved_keys_without_values() {
        let state: GeographicEntity = StateBoundary::new(
            attributes("S1", "Hawaii").with_extra_properties(extras(json!({
                "fips_code": "99",
                "population": "lots",
            }))),
        )
        .into();

        let feature = assemble_feature(&state, placeholder_geometry());
        assert_eq!(feature.properties["fips_code"], json!("99"));
        assert_eq!(feature.properties["population"], json!("lots"));
    }

    #[rstest]
    fn state_without_codes_omits_them(hawaii: GeographicEntity) {
        let feature = assemble_feature(&hawaii, placeholder_geometry());
        assert!(!feature.properties.contains_key("fips_code"));
        assert!(!feature.properties.contains_key("population"));
        assert!(!feature.properties.contains_key("area_sq_miles"));
    }

    #[rstest]
    fn county_carries_parent_and_measures() {
        let county: GeographicEntity = CountyBoundary::new(
            attributes("C1", "Honolulu")
                .with_population(1_016_508)
                .with_area_sq_miles(600.7),
            EntityId::new("S1").expect("valid id"),
        )
        .with_fips_code("15003")
        .into();

        let feature = assemble_feature(&county, placeholder_geometry());
        assert_eq!(
            serde_json::Value::Object(feature.properties),
            json!({
                "name": "Honolulu",
                "id": "C1",
                "fips_code": "15003",
                "state_id": "S1",
                "population": 1_016_508,
                "area_sq_miles": 600.7,
            })
        );
    }

    #[rstest]
    fn wire_shape_has_literal_type_tags(hawaii: GeographicEntity) {
        let feature = assemble_feature(&hawaii, placeholder_geometry());
        let collection = FeatureCollection::new(vec![feature]);
        let wire = serde_json::to_value(&collection).expect("serialise");
        assert_eq!(wire["type"], json!("FeatureCollection"));
        assert_eq!(wire["features"][0]["type"], json!("Feature"));
        assert_eq!(wire["features"][0]["id"], json!("S1"));
        assert_eq!(
            wire["features"][0]["geometry"],
            json!({"type": "Point", "coordinates": [0.0, 0.0]})
        );
    }
}
