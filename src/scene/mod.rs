//! Engine — drives the encoder over a scene document.
//!
//! Layers are rendered in order, each as start → submit every shape → end,
//! and the image is finalized once all layers are through.

pub mod source;

use std::io::Write;

use crate::config::GridOptions;
use crate::encoder::GridEncoder;
use crate::error::GridError;
use source::SceneDocument;

pub struct Engine;

impl Engine {
    /// Merge the scene's format options over `base`, then the `KEY=VALUE`
    /// overrides over that.
    pub fn resolve_options(
        base: &GridOptions,
        scene: &SceneDocument,
        overrides: &[String],
    ) -> Result<GridOptions, GridError> {
        let mut options = base.clone();
        options.apply_all(
            scene
                .format_options
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
        for pair in overrides {
            options.apply_pair(pair)?;
        }
        Ok(options)
    }

    /// Run every layer of `scene` through a fresh encoder, leaving it ready
    /// to finalize.
    pub fn encode(scene: &SceneDocument, options: GridOptions) -> Result<GridEncoder, GridError> {
        let mut encoder = GridEncoder::new(scene.width, scene.height, options)?;
        for layer in &scene.layers {
            encoder.start_layer(layer.to_layer())?;
            for shape in &layer.shapes {
                encoder.submit(shape)?;
            }
            encoder.end_layer()?;
        }
        Ok(encoder)
    }

    pub fn render(scene: &SceneDocument, options: GridOptions) -> Result<String, GridError> {
        Self::encode(scene, options)?.finalize_image()
    }

    pub fn render_to_writer<W: Write>(
        scene: &SceneDocument,
        options: GridOptions,
        out: &mut W,
    ) -> Result<(), GridError> {
        Self::encode(scene, options)?.finalize_to_writer(out)
    }
}
