// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projection of feature attributes onto mesh vertices.
//!
//! Every row that owns a mesh entry gets a [`VertexSpan`]: the run of
//! vertices its values are written to. Columns are then projected span by
//! span, so the output of every column has exactly one value per vertex.

use crate::error::{Error, Result};
use crate::mesh_builder::MeshObject;
use crate::types::JoinedAttributeSet;
use geolayers_core::schema::BUILDING_ID;
use geolayers_core::{LayerKind, TabularGeometrySet};
use rayon::prelude::*;
use serde_json::Value;

/// The vertices of mesh entry `entry`, fed by row `row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexSpan {
    pub row: usize,
    pub entry: usize,
    pub len: usize,
}

/// Fail unless rows and mesh entries pair up one to one.
pub fn assert_aligned(rows: usize, entries: usize) -> Result<()> {
    if rows != entries {
        return Err(Error::SchemaMismatch(format!(
            "{rows} features but {entries} mesh entries"
        )));
    }
    Ok(())
}

/// Pair rows with mesh entries according to the kind's walk policy.
pub fn vertex_spans(
    kind: LayerKind,
    table: &TabularGeometrySet,
    mesh: &MeshObject,
) -> Result<Vec<VertexSpan>> {
    match kind {
        LayerKind::Buildings => building_spans(table, mesh),
        LayerKind::Surface | LayerKind::Generic => {
            assert_aligned(table.len(), mesh.len())?;
            Ok(mesh
                .iter()
                .enumerate()
                .map(|(index, entry)| VertexSpan {
                    row: index,
                    entry: index,
                    len: entry.vertex_count(),
                })
                .collect())
        }
    }
}

#[derive(Default)]
struct BuildingWalk<'a> {
    previous: Option<&'a Value>,
    next_entry: usize,
    spans: Vec<VertexSpan>,
}

/// Consecutive rows with the same `building_id` share one entry; only the
/// first row of each run feeds it.
fn building_spans(table: &TabularGeometrySet, mesh: &MeshObject) -> Result<Vec<VertexSpan>> {
    let walk = table
        .rows()
        .iter()
        .enumerate()
        .try_fold(BuildingWalk::default(), |mut walk, (row, feature)| {
            let id = feature.get(BUILDING_ID);
            if walk.previous == Some(id) {
                return Ok(walk);
            }

            let entry = mesh.get(walk.next_entry).ok_or_else(|| {
                Error::SchemaMismatch(format!(
                    "row {row} opens building {id} but all {} mesh entries are used",
                    mesh.len()
                ))
            })?;

            walk.spans.push(VertexSpan {
                row,
                entry: walk.next_entry,
                len: entry.vertex_count(),
            });
            walk.previous = Some(id);
            walk.next_entry += 1;
            Ok::<_, Error>(walk)
        })?;

    if walk.next_entry != mesh.len() {
        return Err(Error::SchemaMismatch(format!(
            "{} building runs but {} mesh entries",
            walk.next_entry,
            mesh.len()
        )));
    }

    Ok(walk.spans)
}

/// One column's values, one per vertex of every span.
///
/// Scalars (objects and null included) are repeated over the span; list
/// element k lands on vertex k, missing elements read as null and surplus
/// elements are dropped.
pub fn project_column(table: &TabularGeometrySet, column: &str, spans: &[VertexSpan]) -> Vec<Value> {
    let total = spans.iter().map(|span| span.len).sum();
    let mut values = Vec::with_capacity(total);

    for span in spans {
        match table.rows()[span.row].get(column) {
            Value::Array(items) => values.extend(
                (0..span.len).map(|k| items.get(k).cloned().unwrap_or(Value::Null)),
            ),
            scalar => values.extend(std::iter::repeat(scalar).take(span.len).cloned()),
        }
    }

    values
}

/// Project every non-reserved column of `table` onto `mesh`.
///
/// Rows and entries are only paired when there is a column to project, so
/// a layer without attributes renders whatever the generator returned.
pub fn project_attributes(
    id: &str,
    kind: LayerKind,
    table: &TabularGeometrySet,
    mesh: &MeshObject,
) -> Result<JoinedAttributeSet> {
    let columns = kind.attribute_columns(table);
    let spans = if columns.is_empty() {
        Vec::new()
    } else {
        vertex_spans(kind, table, mesh)?
    };

    let in_values = columns
        .par_iter()
        .map(|column| vec![project_column(table, column, &spans)])
        .collect();

    tracing::debug!(
        layer = id,
        columns = columns.len(),
        spans = spans.len(),
        vertices = mesh.vertex_count(),
        "Projected attributes"
    );

    Ok(JoinedAttributeSet {
        id: id.to_string(),
        incoming_id: columns,
        in_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geolayers_geometry::MeshEntry;
    use serde_json::json;

    fn table(properties: Vec<Value>) -> TabularGeometrySet {
        let features: Vec<Value> = properties
            .into_iter()
            .map(|props| {
                json!({
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                    "properties": props
                })
            })
            .collect();

        TabularGeometrySet::from_json_value(json!({
            "type": "FeatureCollection",
            "features": features
        }))
        .unwrap()
    }

    fn mesh(vertex_counts: &[usize]) -> MeshObject {
        MeshObject::new(
            vertex_counts
                .iter()
                .map(|&n| MeshEntry::from_coordinates(vec![0.0; n * 3]))
                .collect(),
        )
    }

    #[test]
    fn test_assert_aligned() {
        assert!(assert_aligned(2, 2).is_ok());
        assert!(matches!(assert_aligned(3, 2), Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_building_runs_share_an_entry() {
        let table = table(vec![
            json!({"building_id": 1}),
            json!({"building_id": 1}),
            json!({"building_id": 2}),
        ]);

        let spans = vertex_spans(LayerKind::Buildings, &table, &mesh(&[4, 6])).unwrap();
        assert_eq!(
            spans,
            vec![
                VertexSpan { row: 0, entry: 0, len: 4 },
                VertexSpan { row: 2, entry: 1, len: 6 },
            ]
        );
    }

    #[test]
    fn test_building_walk_past_last_entry() {
        let table = table(vec![json!({"building_id": 1}), json!({"building_id": 2})]);

        let result = vertex_spans(LayerKind::Buildings, &table, &mesh(&[4]));
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_building_walk_leaves_entries_unused() {
        let table = table(vec![json!({"building_id": 1})]);

        let result = vertex_spans(LayerKind::Buildings, &table, &mesh(&[4, 4]));
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_non_adjacent_repeat_opens_new_run() {
        // Only the previous row is compared, so 1, 2, 1 is three runs
        let table = table(vec![
            json!({"building_id": 1}),
            json!({"building_id": 2}),
            json!({"building_id": 1}),
        ]);

        let spans = vertex_spans(LayerKind::Buildings, &table, &mesh(&[1, 1, 1])).unwrap();
        assert_eq!(spans.len(), 3);
    }

    #[test]
    fn test_scalar_replicated_over_span() {
        let table = table(vec![json!({"height": 10}), json!({"height": "tall"})]);
        let spans = vertex_spans(LayerKind::Generic, &table, &mesh(&[2, 3])).unwrap();

        let values = project_column(&table, "height", &spans);
        assert_eq!(values, vec![json!(10), json!(10), json!("tall"), json!("tall"), json!("tall")]);
    }

    #[test]
    fn test_list_padded_and_truncated() {
        let table = table(vec![
            json!({"shadow": [0.1, 0.2]}),
            json!({"shadow": [1, 2, 3, 4]}),
        ]);
        let spans = vertex_spans(LayerKind::Generic, &table, &mesh(&[3, 2])).unwrap();

        let values = project_column(&table, "shadow", &spans);
        assert_eq!(values, vec![json!(0.1), json!(0.2), Value::Null, json!(1), json!(2)]);
    }

    #[test]
    fn test_missing_column_projects_null() {
        let table = table(vec![json!({"a": 1}), json!({"b": {"nested": true}})]);
        let spans = vertex_spans(LayerKind::Generic, &table, &mesh(&[1, 1])).unwrap();

        assert_eq!(project_column(&table, "a", &spans), vec![json!(1), Value::Null]);
        assert_eq!(
            project_column(&table, "b", &spans),
            vec![Value::Null, json!({"nested": true})]
        );
    }

    #[test]
    fn test_project_attributes_skips_reserved_columns() {
        let table = table(vec![json!({
            "building_id": 7,
            "id": 3,
            "interacted": false,
            "linked": [],
            "height": 12
        })]);

        let joined = project_attributes("layer0", LayerKind::Buildings, &table, &mesh(&[2])).unwrap();
        assert_eq!(joined.id, "layer0");
        assert_eq!(joined.incoming_id, vec!["height".to_string()]);
        assert_eq!(joined.in_values, vec![vec![vec![json!(12), json!(12)]]]);
    }

    #[test]
    fn test_no_attributes_skips_alignment() {
        let table = table(vec![json!({"surface_id": 1}), json!({"surface_id": 2})]);

        let joined = project_attributes("layer0", LayerKind::Surface, &table, &mesh(&[9])).unwrap();
        assert!(joined.incoming_id.is_empty());
        assert!(joined.in_values.is_empty());

        let table = table_with_shadow();
        let result = project_attributes("layer0", LayerKind::Surface, &table, &mesh(&[9]));
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));
    }

    fn table_with_shadow() -> TabularGeometrySet {
        table(vec![
            json!({"surface_id": 1, "shadow": 0.5}),
            json!({"surface_id": 2, "shadow": 0.7}),
        ])
    }
}
