//! Shared boundary types for the UTFGrid renderer.
//!
//! This module defines the two key data contracts:
//! - Host → Encoder (in-memory): `Shape`s carrying `Geometry` and fields
//! - Rasterizer → Grid (in-memory): `Cell` sets within a `GridSpace`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 1-based feature identifier. `WATER` (0) marks a cell with no feature.
pub type FeatureId = u32;

pub const WATER: FeatureId = 0;

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

/// A point in source-image pixel coordinates. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Closed rings; holes are expressed through the fill rule.
    Polygon { rings: Vec<Vec<Point>> },
    /// Open polylines stroked to `width` pixels.
    Line {
        paths: Vec<Vec<Point>>,
        #[serde(default = "default_stroke_width")]
        width: f64,
    },
}

fn default_stroke_width() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        StrokeStyle {
            width: default_stroke_width(),
        }
    }
}

// ---------------------------------------------------------------------------
// Host → Encoder boundary
// ---------------------------------------------------------------------------

/// A feature as handed over by the rendering pipeline: geometry plus the
/// source record's fields, all values already in text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default, deserialize_with = "deserialize_field_values")]
    pub fields: BTreeMap<String, String>,
}

impl Shape {
    pub fn polygon(rings: Vec<Vec<Point>>) -> Self {
        Shape {
            geometry: Geometry::Polygon { rings },
            fields: BTreeMap::new(),
        }
    }

    pub fn line(paths: Vec<Vec<Point>>, width: f64) -> Self {
        Shape {
            geometry: Geometry::Line { paths, width },
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Serde deserializer for a field map whose values may be strings, numbers,
/// booleans or null. Everything is stored as text, the way record fields
/// arrive from a data source; null becomes an empty string.
pub fn deserialize_field_values<'de, D>(d: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let raw = BTreeMap::<String, Value>::deserialize(d)?;
    raw.into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                other => {
                    return Err(D::Error::custom(format!(
                        "field '{name}' must be a scalar, got {other}"
                    )));
                }
            };
            Ok((name, text))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rasterizer → Grid boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Geometry of the output grid relative to the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpace {
    pub cols: u32,
    pub rows: u32,
    /// Source pixels per cell along each axis.
    pub resolution: u32,
}

impl GridSpace {
    /// Grid covering a `width × height` image, rounding partial cells up.
    pub fn for_image(width: u32, height: u32, resolution: u32) -> Self {
        let resolution = resolution.max(1);
        GridSpace {
            cols: width.div_ceil(resolution),
            rows: height.div_ceil(resolution),
            resolution,
        }
    }

    /// Saturates instead of wrapping, so an oversized grid fails to allocate.
    pub fn cell_count(&self) -> usize {
        (self.cols as usize).saturating_mul(self.rows as usize)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }
}
