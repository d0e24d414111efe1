// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layer classification by column presence.

use crate::error::{Error, Result};
use crate::table::{TabularGeometrySet, GEOMETRY_COLUMN};
use std::fmt;

/// Identifier column of building footprints.
pub const BUILDING_ID: &str = "building_id";

/// Identifier column of ground surfaces.
pub const SURFACE_ID: &str = "surface_id";

/// Bookkeeping columns that are never projected, whatever the kind.
const COMMON_RESERVED: [&str; 4] = [GEOMETRY_COLUMN, "id", "interacted", "linked"];

/// The three schema families a collection can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Extruded building footprints, keyed by `building_id`.
    Buildings,
    /// A ground surface, keyed by `surface_id`.
    Surface,
    /// Anything else, meshed one entry per row.
    Generic,
}

impl LayerKind {
    /// Pick the kind of a table: `building_id` wins over `surface_id`,
    /// neither means `Generic`.
    pub fn classify(table: &TabularGeometrySet) -> Self {
        if table.has_column(BUILDING_ID) {
            LayerKind::Buildings
        } else if table.has_column(SURFACE_ID) {
            LayerKind::Surface
        } else {
            LayerKind::Generic
        }
    }

    /// The kind-specific identifier column, if any.
    #[inline]
    pub fn id_column(self) -> Option<&'static str> {
        match self {
            LayerKind::Buildings => Some(BUILDING_ID),
            LayerKind::Surface => Some(SURFACE_ID),
            LayerKind::Generic => None,
        }
    }

    #[inline]
    pub fn is_reserved(self, column: &str) -> bool {
        COMMON_RESERVED.contains(&column) || self.id_column() == Some(column)
    }

    /// Columns to project onto vertices, in table column order.
    pub fn attribute_columns(self, table: &TabularGeometrySet) -> Vec<String> {
        table
            .columns()
            .iter()
            .filter(|column| !self.is_reserved(column))
            .cloned()
            .collect()
    }

    /// Check that every row carries the kind's identifier.
    ///
    /// The identifier column only needs to appear on one feature for the
    /// classification to fire, so rows without it are caught here.
    pub fn validate(self, table: &TabularGeometrySet) -> Result<()> {
        let Some(id_column) = self.id_column() else {
            return Ok(());
        };

        if let Some(index) = table.rows().iter().position(|row| row.get(id_column).is_null()) {
            return Err(Error::SchemaMismatch(format!(
                "{self} layer row {index} has no `{id_column}`"
            )));
        }

        Ok(())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Buildings => "buildings",
            LayerKind::Surface => "surface",
            LayerKind::Generic => "generic",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
