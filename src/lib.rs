//! Settings model and output post-processing for the DREAM runaway electron solver
//!
//! A [Settings] tree is assembled in memory, validated and written to an interchange document for
//! the solver. The solver output is read back into an [Output], over which views such as
//! [CurrentDensity] compute integrated quantities.
#![warn(missing_docs)]

pub mod error;
pub mod grid;
mod helpers;
pub mod interchange;
pub mod output;
pub mod settings;

pub use error::SettingsError;
#[cfg(feature = "hdf5")]
pub use error::FileError;
pub use grid::{Axis, AxisKind};
pub use interchange::{Group, Value};
pub use output::{CurrentDensity, FluidQuantity, Output, OutputGrid};
pub use settings::Settings;
