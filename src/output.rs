//! Read-only model of the solver output and the quantities derived from it
//!
//! An [Output] holds the [OutputGrid] of a run together with the raw fields of its equation
//! system. Views such as [FluidQuantity] and [CurrentDensity] borrow both and compute integrated
//! quantities on demand; they never modify the underlying data.

use std::collections::BTreeMap;
use std::f64::consts::PI;
#[cfg(feature = "hdf5")]
use std::path::Path;

use itertools::Itertools;
use ndarray::{Array1, ArrayD, Ix1, Ix2};
use tracing::debug;

#[cfg(feature = "hdf5")]
use crate::error::FileError;
use crate::error::SettingsError;
use crate::grid::{Axis, AxisKind};
use crate::helpers::cell_centres;
use crate::interchange::{Group, Value};

mod current_density;
mod fluid_quantity;

pub use current_density::{Current, CurrentDensity, CurrentUnit};
pub use fluid_quantity::{FluidQuantity, Integral};

const ENTITY: &str = "grid";

/// Radial grid and flux surface averaged geometry of a run
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGrid {
    t: Axis,
    r: Axis,
    dr: Array1<f64>,
    vp_vol: Array1<f64>,
    gr0: Array1<f64>,
    bmin: Array1<f64>,
    fsa_r02_over_r2: Array1<f64>,
    r0: f64,
    p: Option<Axis>,
    xi: Option<Axis>,
}

impl OutputGrid {
    /// Analytic grid in the cylindrical limit: `nr` equal cells out to `minor_radius` in a uniform
    /// field `magnetic_field`, with an infinite major radius.
    pub fn cylindrical(
        times: Axis,
        minor_radius: f64,
        nr: usize,
        magnetic_field: f64,
    ) -> Result<OutputGrid, SettingsError> {
        if times.kind() != AxisKind::Time {
            return Err(SettingsError::shape(
                ENTITY,
                format!("expected a time axis, got {}", times.kind()),
            ));
        }
        if !(minor_radius > 0.) || !minor_radius.is_finite() {
            return Err(SettingsError::range("grid/a", minor_radius));
        }
        if !(magnetic_field > 0.) || !magnetic_field.is_finite() {
            return Err(SettingsError::range("grid/B0", magnetic_field));
        }
        if nr == 0 {
            return Err(SettingsError::range("grid/nr", nr));
        }

        let r = Axis::new(AxisKind::Radius, cell_centres(0., minor_radius, nr).collect_vec())?;
        let vp_vol = r.values().iter().map(|r| 4. * PI * PI * r).collect::<Array1<_>>();

        Ok(OutputGrid {
            t: times,
            r,
            dr: Array1::from_elem(nr, minor_radius / nr as f64),
            vp_vol,
            gr0: Array1::from_elem(nr, magnetic_field),
            bmin: Array1::from_elem(nr, magnetic_field),
            fsa_r02_over_r2: Array1::ones(nr),
            r0: f64::INFINITY,
            p: None,
            xi: None,
        })
    }

    /// Time points at which the output was saved
    pub fn t(&self) -> &Axis {
        &self.t
    }

    /// Radial cell centres
    pub fn r(&self) -> &Axis {
        &self.r
    }

    /// Radial cell widths
    pub fn dr(&self) -> &Array1<f64> {
        &self.dr
    }

    /// Spatial Jacobian, integrated over the flux surface
    pub fn vp_vol(&self) -> &Array1<f64> {
        &self.vp_vol
    }

    /// Toroidal field function `G(r)` divided by `R0`
    pub fn gr0(&self) -> &Array1<f64> {
        &self.gr0
    }

    /// Minimum field strength on each flux surface
    pub fn bmin(&self) -> &Array1<f64> {
        &self.bmin
    }

    /// Flux surface average of `R0²/R²`
    pub fn fsa_r02_over_r2(&self) -> &Array1<f64> {
        &self.fsa_r02_over_r2
    }

    /// Major radius, infinite in the cylindrical limit
    pub fn r0(&self) -> f64 {
        self.r0
    }

    /// Momentum axis of the hot electron grid, if any
    pub fn p(&self) -> Option<&Axis> {
        self.p.as_ref()
    }

    /// Pitch axis of the hot electron grid, if any
    pub fn xi(&self) -> Option<&Axis> {
        self.xi.as_ref()
    }

    /// Number of time points
    pub fn nt(&self) -> usize {
        self.t.len()
    }

    /// Number of radial cells
    pub fn nr(&self) -> usize {
        self.r.len()
    }

    /// Volume element `VpVol·dr` of every radial cell
    pub fn cell_volumes(&self) -> Array1<f64> {
        &self.vp_vol * &self.dr
    }

    fn check_radial(&self) -> Result<(), SettingsError> {
        let nr = self.nr();

        for (key, array) in [
            ("dr", &self.dr),
            ("VpVol", &self.vp_vol),
            ("GR0", &self.gr0),
            ("Bmin", &self.bmin),
            ("FSA_R02OverR2", &self.fsa_r02_over_r2),
        ] {
            if array.len() != nr {
                return Err(SettingsError::shape(
                    format!("{ENTITY}/{key}"),
                    format!("expected {nr} radial cells, got {}", array.len()),
                ));
            }
            if let Some(bad) = array.iter().find(|v| !v.is_finite()) {
                return Err(SettingsError::range(format!("{ENTITY}/{key}"), bad));
            }
        }

        if let Some(bad) = self.bmin.iter().find(|&&v| v <= 0.) {
            return Err(SettingsError::range("grid/Bmin", bad));
        }

        if !(self.r0 > 0.) {
            return Err(SettingsError::range("grid/R0", self.r0));
        }

        Ok(())
    }

    /// Encode as the `grid` group of an output document
    pub fn to_interchange(&self) -> Group {
        let mut group = Group::new()
            .with("t", self.t.to_array())
            .with("r", self.r.to_array())
            .with("dr", self.dr.clone().into_dyn())
            .with("VpVol", self.vp_vol.clone().into_dyn())
            .with("GR0", self.gr0.clone().into_dyn())
            .with("Bmin", self.bmin.clone().into_dyn())
            .with("FSA_R02OverR2", self.fsa_r02_over_r2.clone().into_dyn())
            .with("R0", self.r0);

        for axis in [&self.p, &self.xi].into_iter().flatten() {
            group.insert(axis.kind().key(), axis.to_array());
        }

        group
    }

    /// Decode the `grid` group of an output document
    pub fn from_interchange(group: &Group) -> Result<OutputGrid, SettingsError> {
        let radial = |key: &str| -> Result<Array1<f64>, SettingsError> {
            group.array(key)?.into_dimensionality::<Ix1>().map_err(|_| {
                SettingsError::shape(group.child_path(key), "expected a one-dimensional array")
            })
        };
        let axis = |kind: AxisKind| -> Result<Axis, SettingsError> {
            Axis::from_array(kind, &group.array(kind.key())?)
        };
        let optional_axis = |kind: AxisKind| -> Result<Option<Axis>, SettingsError> {
            group.contains(kind.key()).then(|| axis(kind)).transpose()
        };

        let grid = OutputGrid {
            t: axis(AxisKind::Time)?,
            r: axis(AxisKind::Radius)?,
            dr: radial("dr")?,
            vp_vol: radial("VpVol")?,
            gr0: radial("GR0")?,
            bmin: radial("Bmin")?,
            fsa_r02_over_r2: radial("FSA_R02OverR2")?,
            r0: group.float("R0")?,
            p: optional_axis(AxisKind::Momentum)?,
            xi: optional_axis(AxisKind::Pitch)?,
        };

        grid.check_radial()?;

        Ok(grid)
    }
}

/// A loaded solver output
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    grid: OutputGrid,
    fields: BTreeMap<String, ArrayD<f64>>,
}

impl Output {
    /// Output over `grid` without any fields
    pub fn new(grid: OutputGrid) -> Output {
        Output {
            grid,
            fields: BTreeMap::new(),
        }
    }

    /// Add or replace a raw field of the equation system
    pub fn insert_field(&mut self, name: &str, data: ArrayD<f64>) {
        self.fields.insert(name.to_owned(), data);
    }

    /// Grid of the run
    pub fn grid(&self) -> &OutputGrid {
        &self.grid
    }

    /// Names of the stored fields
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Raw data of a stored field
    pub fn field(&self, name: &str) -> Result<&ArrayD<f64>, SettingsError> {
        self.fields
            .get(name)
            .ok_or_else(|| SettingsError::MissingField(format!("eqsys/{name}")))
    }

    /// View a time × radius field as a fluid quantity
    pub fn fluid_quantity(&self, name: &str) -> Result<FluidQuantity<'_>, SettingsError> {
        let entity = format!("eqsys/{name}");
        let data = self
            .field(name)?
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| {
                SettingsError::shape(entity.as_str(), "fluid quantities have a time and a radial axis")
            })?;

        let expected = (self.grid.nt(), self.grid.nr());
        if data.dim() != expected {
            return Err(SettingsError::shape(
                entity,
                format!("data has shape {:?}, grid has {:?} (time x radius)", data.dim(), expected),
            ));
        }

        Ok(FluidQuantity::new(name, data, &self.grid))
    }

    /// View a time × radius field as a current density
    pub fn current_density(&self, name: &str) -> Result<CurrentDensity<'_>, SettingsError> {
        self.fluid_quantity(name).map(CurrentDensity::new)
    }

    /// Encode as `{ grid, eqsys }`
    pub fn to_interchange(&self) -> Group {
        let mut eqsys = Group::new();
        for (name, data) in &self.fields {
            eqsys.insert(name, data.clone());
        }

        Group::new()
            .with("grid", self.grid.to_interchange())
            .with("eqsys", eqsys)
    }

    /// Decode an output document. Nested groups in `eqsys` are skipped.
    pub fn from_interchange(group: &Group) -> Result<Output, SettingsError> {
        let grid = OutputGrid::from_interchange(group.group("grid")?)?;
        let eqsys = group.group("eqsys")?;

        let mut output = Output::new(grid);
        for (name, value) in eqsys.iter() {
            match value {
                Value::Group(_) => debug!(path = %eqsys.child_path(name), "skipping nested group"),
                _ => output.insert_field(name, eqsys.array(name)?),
            }
        }

        debug!(
            nt = output.grid.nt(),
            nr = output.grid.nr(),
            fields = output.fields.len(),
            "decoded output"
        );

        Ok(output)
    }

    /// Read an output file written by the solver
    #[cfg(feature = "hdf5")]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Output, FileError> {
        let document = crate::interchange::hdf5::read(&path)?;

        Ok(Output::from_interchange(&document)?)
    }
}
