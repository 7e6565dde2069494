//! Grid encoder — one image's worth of UTFGrid state.
//!
//! Lifecycle: `begin_image` → (`start_layer` → `submit_*`… → `end_layer`)…
//! → `finalize_image`. Only one layer may be active at a time. The encoder
//! owns its grid and feature table; dropping it without finalizing is the
//! abort path and releases both.

use std::fmt;
use std::io::Write;

use crate::config::{DedupBy, GridOptions};
use crate::error::GridError;
use crate::evaluator::AttributeEvaluator;
use crate::grid::IdentifierGrid;
use crate::interner::{AttributeInterner, InternPolicy};
use crate::rasterizer::{Rasterizer, ScanlineRasterizer};
use crate::serializer::UtfSerializer;
use crate::types::{FeatureId, Geometry, GridSpace, Point, Shape, StrokeStyle};

/// A layer as seen by the encoder: where its keys come from, how its
/// payloads are built, and whether it collapses duplicates.
pub struct Layer {
    pub name: String,
    /// Field whose value becomes each feature's public key.
    pub item: Option<String>,
    /// Overrides the image-wide `duplicates` option for this layer.
    pub duplicates: Option<bool>,
    pub evaluator: Box<dyn AttributeEvaluator>,
}

impl Layer {
    pub fn new(name: impl Into<String>, evaluator: impl AttributeEvaluator + 'static) -> Self {
        Layer {
            name: name.into(),
            item: None,
            duplicates: None,
            evaluator: Box::new(evaluator),
        }
    }

    pub fn with_item(mut self, field: impl Into<String>) -> Self {
        self.item = Some(field.into());
        self
    }

    pub fn with_duplicates(mut self, duplicates: bool) -> Self {
        self.duplicates = Some(duplicates);
        self
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("item", &self.item)
            .field("duplicates", &self.duplicates)
            .finish_non_exhaustive()
    }
}

pub struct GridEncoder<R: Rasterizer = ScanlineRasterizer> {
    options: GridOptions,
    grid: IdentifierGrid,
    interner: AttributeInterner,
    rasterizer: R,
    active: Option<Layer>,
    use_item_key: bool,
}

impl GridEncoder<ScanlineRasterizer> {
    /// Begin an image using the built-in rasterizer.
    pub fn new(width: u32, height: u32, options: GridOptions) -> Result<Self, GridError> {
        Self::begin_image(width, height, options, ScanlineRasterizer::default())
    }
}

impl<R: Rasterizer> GridEncoder<R> {
    /// Allocate the grid and an empty feature table for a `width × height`
    /// image. Coverage is delegated to `rasterizer`.
    pub fn begin_image(
        width: u32,
        height: u32,
        options: GridOptions,
        rasterizer: R,
    ) -> Result<Self, GridError> {
        if options.resolution == 0 {
            return Err(GridError::InvalidResolution(0));
        }
        let space = GridSpace::for_image(width, height, options.resolution);
        let grid = IdentifierGrid::new(space)?;
        log::info!(
            "begin image {width}x{height}: {}x{} cells at resolution {}",
            space.cols,
            space.rows,
            space.resolution
        );
        Ok(Self {
            options,
            grid,
            interner: AttributeInterner::new(),
            rasterizer,
            active: None,
            use_item_key: false,
        })
    }

    pub fn start_layer(&mut self, layer: Layer) -> Result<(), GridError> {
        if let Some(active) = &self.active {
            return Err(GridError::LayerAlreadyActive {
                active: active.name.clone(),
                requested: layer.name,
            });
        }
        if layer.item.is_some() {
            self.use_item_key = true;
        }
        log::debug!(
            "start layer '{}' (item: {:?}, duplicates: {})",
            layer.name,
            layer.item,
            layer.duplicates.unwrap_or(self.options.duplicates)
        );
        self.active = Some(layer);
        Ok(())
    }

    /// Release the active layer. Interned features stay in the table.
    pub fn end_layer(&mut self) -> Result<Layer, GridError> {
        let layer = self.active.take().ok_or(GridError::NoActiveLayer)?;
        log::debug!("end layer '{}'", layer.name);
        Ok(layer)
    }

    /// Fill a polygon. Line geometry is filled as if its paths were rings.
    pub fn submit_polygon(&mut self, shape: &Shape) -> Result<FeatureId, GridError> {
        let id = self.resolve(shape)?;
        let rings = match &shape.geometry {
            Geometry::Polygon { rings } => rings,
            Geometry::Line { paths, .. } => paths,
        };
        let cells = self.rasterizer.polygon_coverage(rings, self.grid.space());
        let painted = self.grid.paint(cells, id);
        log::debug!("polygon feature {id} covers {painted} cells");
        Ok(id)
    }

    /// Stroke a line with `stroke`. Polygon outlines are skipped: the fill
    /// already identifies the feature, and interning the outline would add
    /// a second record for it.
    pub fn submit_line(
        &mut self,
        shape: &Shape,
        stroke: &StrokeStyle,
    ) -> Result<Option<FeatureId>, GridError> {
        match &shape.geometry {
            Geometry::Polygon { .. } => Ok(None),
            Geometry::Line { paths, .. } => self.stroke(shape, paths, stroke).map(Some),
        }
    }

    /// Submit a shape by its own geometry, stroking lines at their
    /// declared width.
    pub fn submit(&mut self, shape: &Shape) -> Result<FeatureId, GridError> {
        match &shape.geometry {
            Geometry::Polygon { .. } => self.submit_polygon(shape),
            Geometry::Line { paths, width } => {
                self.stroke(shape, paths, &StrokeStyle { width: *width })
            }
        }
    }

    fn stroke(
        &mut self,
        shape: &Shape,
        paths: &[Vec<Point>],
        stroke: &StrokeStyle,
    ) -> Result<FeatureId, GridError> {
        let id = self.resolve(shape)?;
        let cells = self
            .rasterizer
            .line_coverage(paths, stroke, self.grid.space());
        let painted = self.grid.paint(cells, id);
        log::debug!("line feature {id} covers {painted} cells");
        Ok(id)
    }

    fn resolve(&mut self, shape: &Shape) -> Result<FeatureId, GridError> {
        let layer = self.active.as_ref().ok_or(GridError::NoActiveLayer)?;
        let policy = InternPolicy {
            item_field: layer.item.as_deref(),
            deduplicate: !layer.duplicates.unwrap_or(self.options.duplicates),
            dedup_by_payload: self.options.dedup_by == DedupBy::Payload,
        };
        self.interner.resolve(shape, policy, layer.evaluator.as_ref())
    }

    /// Serialize the image. The encoder is consumed.
    pub fn finalize_image(self) -> Result<String, GridError> {
        self.log_finalize();
        UtfSerializer::to_string(&self.grid, &self.interner)
    }

    /// Serialize the image straight into `out`. The encoder is consumed.
    pub fn finalize_to_writer<W: Write>(self, out: &mut W) -> Result<(), GridError> {
        self.log_finalize();
        UtfSerializer::write(&self.grid, &self.interner, out)
    }

    fn log_finalize(&self) {
        if let Some(layer) = &self.active {
            log::warn!("finalizing while layer '{}' is still active", layer.name);
        }
        log::info!(
            "finalize image: {} features, {}x{} cells",
            self.interner.len(),
            self.grid.cols(),
            self.grid.rows()
        );
    }

    pub fn grid(&self) -> &IdentifierGrid {
        &self.grid
    }

    pub fn interner(&self) -> &AttributeInterner {
        &self.interner
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Whether any layer of this image declared an item field.
    ///
    /// Informational only: each record's key is fixed when it is interned,
    /// from its own layer's item field, so serialization never reads this.
    pub fn use_item_key(&self) -> bool {
        self.use_item_key
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.as_ref()
    }
}
