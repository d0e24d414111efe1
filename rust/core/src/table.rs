// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tabular geometry sets built from GeoJSON feature collections.
//!
//! A [`TabularGeometrySet`] holds one row per feature, in feature order. Its
//! columns are the union of all property names (in order of first
//! appearance) plus the geometry column. A row that lacks a property reads
//! as `null` in that column.

use crate::crs::Epsg;
use crate::error::{Error, Result};
use geo::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use rustc_hash::FxHashSet;
use serde_json::Value;

/// Name of the geometry column.
pub const GEOMETRY_COLUMN: &str = "geometry";

static NULL: Value = Value::Null;

/// A single feature: its geometry plus its property mapping.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub geometry: Geometry<f64>,
    pub properties: JsonObject,
}

impl FeatureRow {
    /// Value of a property column, `null` when the feature does not carry it.
    #[inline]
    pub fn get(&self, column: &str) -> &Value {
        self.properties.get(column).unwrap_or(&NULL)
    }
}

/// One row per feature, columns = property names ∪ {geometry}.
#[derive(Debug, Clone, Default)]
pub struct TabularGeometrySet {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
    crs: Option<Epsg>,
    name: Option<String>,
}

impl TabularGeometrySet {
    /// Build a table from any GeoJSON value.
    ///
    /// Accepts a `FeatureCollection` or a single `Feature` (treated as a
    /// one-row collection). A bare geometry is rejected.
    pub fn from_json_value(value: Value) -> Result<Self> {
        match GeoJson::from_json_value(value)? {
            GeoJson::FeatureCollection(collection) => Self::from_feature_collection(collection),
            GeoJson::Feature(feature) => Self::from_features(vec![feature], None),
            GeoJson::Geometry(_) => Err(Error::InvalidGeoJson(
                "expected a FeatureCollection or Feature, found a bare geometry".to_string(),
            )),
        }
    }

    /// Build a table from a parsed feature collection.
    pub fn from_feature_collection(collection: FeatureCollection) -> Result<Self> {
        let name = collection
            .foreign_members
            .as_ref()
            .and_then(|members| members.get("metadata"))
            .and_then(|metadata| metadata.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self::from_features(collection.features, name)
    }

    fn from_features(features: Vec<Feature>, name: Option<String>) -> Result<Self> {
        let mut columns = vec![GEOMETRY_COLUMN.to_string()];
        let mut seen: FxHashSet<String> = FxHashSet::default();
        seen.insert(GEOMETRY_COLUMN.to_string());

        let mut rows = Vec::with_capacity(features.len());

        for (index, feature) in features.into_iter().enumerate() {
            let geometry = feature
                .geometry
                .ok_or_else(|| Error::Geometry(format!("feature {index} has no geometry")))?;

            let geometry = Geometry::<f64>::try_from(geometry)
                .map_err(|e| Error::Geometry(format!("feature {index}: {e}")))?;

            let properties = feature.properties.unwrap_or_default();
            for key in properties.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }

            rows.push(FeatureRow {
                geometry,
                properties,
            });
        }

        tracing::debug!(
            rows = rows.len(),
            columns = columns.len(),
            name = ?name,
            "Built tabular geometry set"
        );

        Ok(Self {
            columns,
            rows,
            crs: None,
            name,
        })
    }

    /// Column names, geometry first, then properties in first-seen order.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    #[inline]
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&FeatureRow> {
        self.rows.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `metadata.name` member of the source collection, when it is a string.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Currently assigned coordinate reference system.
    #[inline]
    pub fn crs(&self) -> Option<Epsg> {
        self.crs
    }

    pub(crate) fn set_crs_tag(&mut self, crs: Epsg) {
        self.crs = Some(crs);
    }

    pub(crate) fn geometries_mut(&mut self) -> impl Iterator<Item = &mut Geometry<f64>> {
        self.rows.iter_mut().map(|row| &mut row.geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(x: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]
        })
    }

    #[test]
    fn test_columns_follow_first_appearance() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": square(0.0), "properties": { "b": 1, "a": 2 } },
                { "type": "Feature", "geometry": square(2.0), "properties": { "c": 3, "a": 4 } }
            ]
        });

        let table = TabularGeometrySet::from_json_value(collection).unwrap();
        let columns: Vec<&str> = table.columns().iter().map(String::as_str).collect();

        assert_eq!(table.len(), 2);
        assert_eq!(columns[0], GEOMETRY_COLUMN);
        assert_eq!(columns.len(), 4);
        assert!(table.has_column("a"));
        assert!(table.has_column("b"));
        assert!(table.has_column("c"));
    }

    #[test]
    fn test_missing_property_reads_null() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": square(0.0), "properties": { "a": 1 } },
                { "type": "Feature", "geometry": square(2.0), "properties": null }
            ]
        });

        let table = TabularGeometrySet::from_json_value(collection).unwrap();

        assert_eq!(table.rows()[0].get("a"), &json!(1));
        assert!(table.rows()[1].get("a").is_null());
    }

    #[test]
    fn test_metadata_name() {
        let collection = json!({
            "type": "FeatureCollection",
            "metadata": { "name": "parks" },
            "features": []
        });

        let table = TabularGeometrySet::from_json_value(collection).unwrap();
        assert_eq!(table.name(), Some("parks"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_non_string_metadata_name_is_ignored() {
        let collection = json!({
            "type": "FeatureCollection",
            "metadata": { "name": 7 },
            "features": []
        });

        let table = TabularGeometrySet::from_json_value(collection).unwrap();
        assert_eq!(table.name(), None);
    }

    #[test]
    fn test_single_feature_is_one_row() {
        let feature = json!({ "type": "Feature", "geometry": square(0.0), "properties": { "a": 1 } });

        let table = TabularGeometrySet::from_json_value(feature).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_feature_without_geometry_is_rejected() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [ { "type": "Feature", "geometry": null, "properties": {} } ]
        });

        let result = TabularGeometrySet::from_json_value(collection);
        assert!(matches!(result, Err(Error::Geometry(_))));
    }

    #[test]
    fn test_bare_geometry_is_rejected() {
        let result = TabularGeometrySet::from_json_value(square(0.0));
        assert!(matches!(result, Err(Error::InvalidGeoJson(_))));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let result = TabularGeometrySet::from_json_value(json!({ "type": "FeatureCollection" }));
        assert!(result.is_err());
    }
}
