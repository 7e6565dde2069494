//! UTFGrid rendering backend.
//!
//! Instead of pixels, this renderer produces a low-resolution grid of feature
//! identifiers plus a feature lookup table, serialized as UTFGrid JSON so map
//! clients can resolve hover/click targets without a server round-trip.
//!
//! Pipeline, leaves first:
//! - [`interner`] dedups feature attribute sets into a compact table.
//! - [`grid`] holds one feature id per output cell.
//! - [`encoder`] drives both as shapes stream in, delegating coverage to a
//!   [`rasterizer::Rasterizer`].
//! - [`serializer`] turns the grid and table into the wire format.

pub mod config;
pub mod encoder;
pub mod error;
pub mod evaluator;
pub mod grid;
pub mod interner;
pub mod preview;
pub mod rasterizer;
pub mod scene;
pub mod serializer;
pub mod types;

pub use encoder::GridEncoder;
pub use error::GridError;
