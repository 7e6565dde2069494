//! Scene documents — the JSON input the CLI renders.
//!
//! A scene names the image size, its format options, and the layers of
//! shapes to push through the encoder, in draw order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoder::Layer;
use crate::evaluator::{FieldsEvaluator, TemplateEvaluator};
use crate::types::{Shape, deserialize_field_values};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub width: u32,
    pub height: u32,
    /// Format options such as `UTFRESOLUTION` or `DUPLICATES`.
    #[serde(default, deserialize_with = "deserialize_field_values")]
    pub format_options: BTreeMap<String, String>,
    pub layers: Vec<SceneLayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneLayer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<bool>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

/// How a layer builds feature payloads: a `[FIELD]` template, or a list of
/// fields to emit as an object. Absent means every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataSpec {
    Template(String),
    Fields(Vec<String>),
}

impl SceneLayer {
    /// The encoder-side layer definition for this scene layer.
    pub fn to_layer(&self) -> Layer {
        let mut layer = match &self.data {
            None => Layer::new(&self.name, FieldsEvaluator::all()),
            Some(DataSpec::Fields(fields)) => {
                Layer::new(&self.name, FieldsEvaluator::select(fields.clone()))
            }
            Some(DataSpec::Template(template)) => {
                Layer::new(&self.name, TemplateEvaluator::new(template.clone()))
            }
        };
        layer.item = self.item.clone();
        layer.duplicates = self.duplicates;
        layer
    }
}
