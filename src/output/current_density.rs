use std::f64::consts::PI;
use std::fmt::Display;

use super::fluid_quantity::{FluidQuantity, Integral};
use crate::error::SettingsError;

/// Unit of a [Current]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentUnit {
    /// Plain current
    Ampere,
    /// Current times the cube of the major radius, used when the major radius is infinite
    AmpereMajorRadiusCubed,
}

impl Display for CurrentUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurrentUnit::Ampere => write!(f, "A"),
            CurrentUnit::AmpereMajorRadiusCubed => write!(f, "A R0^3"),
        }
    }
}

/// Total current together with the unit it is expressed in
#[derive(Debug, Clone, PartialEq)]
pub struct Current {
    value: Integral,
    unit: CurrentUnit,
}

impl Current {
    /// Integrated value
    pub fn value(&self) -> &Integral {
        &self.value
    }

    /// Unit of the value
    pub fn unit(&self) -> CurrentUnit {
        self.unit
    }
}

/// A parallel current density \[A/m²\] sampled on time × radius
#[derive(Debug, Clone)]
pub struct CurrentDensity<'a> {
    quantity: FluidQuantity<'a>,
}

impl<'a> CurrentDensity<'a> {
    pub(super) fn new(quantity: FluidQuantity<'a>) -> Self {
        CurrentDensity { quantity }
    }

    /// The underlying fluid quantity
    pub fn quantity(&self) -> &FluidQuantity<'a> {
        &self.quantity
    }

    /// Total current through the plasma cross section.
    ///
    /// Every cell is weighted with `VpVol·dr·GR0/Bmin·⟨R0²/R²⟩/R0³` and the sum divided by 2π.
    /// When the major radius is infinite the `1/R0³` factor is left out and the result is tagged
    /// [CurrentUnit::AmpereMajorRadiusCubed].
    pub fn current(&self, time: Option<usize>) -> Result<Current, SettingsError> {
        let grid = self.quantity.grid();

        let mut geometry = grid.gr0() / grid.bmin() * grid.fsa_r02_over_r2();
        let unit = if grid.r0().is_finite() {
            geometry /= grid.r0().powi(3);
            CurrentUnit::Ampere
        } else {
            CurrentUnit::AmpereMajorRadiusCubed
        };

        let value = self
            .quantity
            .integral(time, Some(&geometry))?
            .map(|value| value / (2. * PI));

        Ok(Current { value, unit })
    }

    /// Alias for [CurrentDensity::current]
    pub fn total_current(&self, time: Option<usize>) -> Result<Current, SettingsError> {
        self.current(time)
    }
}
