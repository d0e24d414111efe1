// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layer metadata: id, type and render style.

use crate::mesh_builder::MeshObject;
use crate::types::{LayerType, RenderLayer, RenderStyle};
use geolayers_core::{LayerKind, TabularGeometrySet};

/// Style key shared by every layer
pub const STYLE_KEY: &str = "surface";

/// Styles for a layer; picking is only offered when there is data to pick.
pub fn render_style(kind: LayerKind, has_attributes: bool) -> Vec<RenderStyle> {
    match (kind, has_attributes) {
        (LayerKind::Buildings, true) => vec![RenderStyle::SmoothColorMapTex, RenderStyle::Picking],
        (LayerKind::Buildings, false) => vec![RenderStyle::SmoothColorMapTex],
        (_, true) => vec![RenderStyle::SmoothColorMap, RenderStyle::Picking],
        (_, false) => vec![RenderStyle::SmoothColor],
    }
}

#[inline]
pub fn layer_type(kind: LayerKind) -> LayerType {
    match kind {
        LayerKind::Buildings => LayerType::Buildings,
        LayerKind::Surface | LayerKind::Generic => LayerType::Triangles3d,
    }
}

/// `metadata.name` of the collection, or `layer{index}`.
pub fn layer_name(table: &TabularGeometrySet, index: usize) -> String {
    table
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("layer{index}"))
}

pub fn assemble(id: String, kind: LayerKind, has_attributes: bool, data: MeshObject) -> RenderLayer {
    RenderLayer {
        id,
        layer_type: layer_type(kind),
        render_style: render_style(kind, has_attributes),
        style_key: STYLE_KEY.to_string(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_style_table() {
        use RenderStyle::*;

        assert_eq!(render_style(LayerKind::Buildings, true), vec![SmoothColorMapTex, Picking]);
        assert_eq!(render_style(LayerKind::Buildings, false), vec![SmoothColorMapTex]);
        assert_eq!(render_style(LayerKind::Surface, true), vec![SmoothColorMap, Picking]);
        assert_eq!(render_style(LayerKind::Generic, false), vec![SmoothColor]);
    }

    #[test]
    fn test_layer_type() {
        assert_eq!(layer_type(LayerKind::Buildings), LayerType::Buildings);
        assert_eq!(layer_type(LayerKind::Surface), LayerType::Triangles3d);
        assert_eq!(layer_type(LayerKind::Generic), LayerType::Triangles3d);
    }

    #[test]
    fn test_layer_name() {
        let named = TabularGeometrySet::from_json_value(json!({
            "type": "FeatureCollection",
            "features": [],
            "metadata": {"name": "parks"}
        }))
        .unwrap();
        let unnamed = TabularGeometrySet::from_json_value(json!({
            "type": "FeatureCollection",
            "features": [],
            "metadata": {"name": 42}
        }))
        .unwrap();

        assert_eq!(layer_name(&named, 3), "parks");
        assert_eq!(layer_name(&unnamed, 3), "layer3");
    }

    #[test]
    fn test_assemble() {
        let layer = assemble("layer1".to_string(), LayerKind::Surface, false, MeshObject::default());
        assert_eq!(layer.id, "layer1");
        assert_eq!(layer.style_key, "surface");
        assert_eq!(layer.render_style, vec![RenderStyle::SmoothColor]);
    }
}
