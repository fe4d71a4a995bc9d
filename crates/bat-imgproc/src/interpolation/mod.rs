//! Interpolation and resampling utilities.
//!
//! - [`grid`]: coordinate meshgrids, optionally oversampled
//! - [`meander`]: scattered-data gap filling on regular grids
//! - [`remap`]: nearest-neighbor gather through an inverse distortion map

/// Grid generation utilities.
///
/// Functions for generating the coordinate meshgrids that are pushed through
/// the distortion model.
pub mod grid;

/// Meandering (boustrophedon) interpolation of missing grid values.
pub mod meander;

mod remap;

pub use meander::{fill_missing_values, interpolate_axis, SweepAxis, SweepDirection};
pub use remap::apply_inverse_map;
