use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use super::OutputGrid;
use crate::error::SettingsError;

/// Result of a volume integral, either at a single time or at every saved time
#[derive(Debug, Clone, PartialEq)]
pub enum Integral {
    /// Value at one time
    Scalar(f64),
    /// One value per saved time
    Series(Array1<f64>),
}

impl Integral {
    /// The value, if evaluated at a single time
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Integral::Scalar(value) => Some(*value),
            Integral::Series(_) => None,
        }
    }

    /// The values, if evaluated at every time
    pub fn series(&self) -> Option<&Array1<f64>> {
        match self {
            Integral::Scalar(_) => None,
            Integral::Series(values) => Some(values),
        }
    }

    /// Apply `f` to every value
    pub fn map(self, f: impl Fn(f64) -> f64) -> Integral {
        match self {
            Integral::Scalar(value) => Integral::Scalar(f(value)),
            Integral::Series(values) => Integral::Series(values.mapv(f)),
        }
    }
}

/// A field sampled on time × radius
#[derive(Debug, Clone)]
pub struct FluidQuantity<'a> {
    name: String,
    data: ArrayView2<'a, f64>,
    grid: &'a OutputGrid,
}

impl<'a> FluidQuantity<'a> {
    /// `data` must already have been checked against `grid`
    pub(super) fn new(name: &str, data: ArrayView2<'a, f64>, grid: &'a OutputGrid) -> Self {
        FluidQuantity {
            name: name.to_owned(),
            data,
            grid,
        }
    }

    /// Name of the field in the output
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw values, time × radius
    pub fn data(&self) -> ArrayView2<'a, f64> {
        self.data
    }

    /// Grid the field is sampled on
    pub fn grid(&self) -> &'a OutputGrid {
        self.grid
    }

    /// Radial profile at a saved time
    pub fn at(&self, time: usize) -> Result<ArrayView1<'a, f64>, SettingsError> {
        if time >= self.grid.nt() {
            return Err(SettingsError::range(format!("{}/t", self.name), time));
        }

        let data = self.data;
        Ok(data.index_axis_move(Axis(0), time))
    }

    /// Volume integral `Σ data·VpVol·dr·weight` over radius.
    ///
    /// With a `time` index a single value is returned, otherwise one value for every saved time.
    /// Without a `weight` every cell has weight one.
    pub fn integral(
        &self,
        time: Option<usize>,
        weight: Option<&Array1<f64>>,
    ) -> Result<Integral, SettingsError> {
        let mut cells = self.grid.cell_volumes();

        if let Some(weight) = weight {
            if weight.len() != self.grid.nr() {
                return Err(SettingsError::shape(
                    self.name.as_str(),
                    format!(
                        "weight has {} cells, grid has {}",
                        weight.len(),
                        self.grid.nr()
                    ),
                ));
            }
            cells *= weight;
        }

        Ok(match time {
            Some(time) => Integral::Scalar(self.at(time)?.dot(&cells)),
            None => Integral::Series(self.data.dot(&cells)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use ndarray::{arr1, Array2};

    use super::Integral;
    use crate::error::SettingsError;
    use crate::grid::{Axis, AxisKind};
    use crate::output::{Output, OutputGrid};

    fn output() -> Output {
        let t = Axis::new(AxisKind::Time, vec![0., 1.]).unwrap();
        let mut output = Output::new(OutputGrid::cylindrical(t, 0.5, 20, 1.).unwrap());
        output.insert_field("n_cold", Array2::from_elem((2, 20), 1.).into_dyn());
        output
    }

    #[test]
    fn plasma_volume() {
        let output = output();
        let n_cold = output.fluid_quantity("n_cold").unwrap();

        let volume = n_cold.integral(Some(0), None).unwrap().scalar().unwrap();
        assert_relative_eq!(volume, 2. * PI * PI * 0.25, max_relative = 1e-12);
    }

    #[test]
    fn series_has_one_value_per_time() {
        let output = output();
        let n_cold = output.fluid_quantity("n_cold").unwrap();

        let series = n_cold.integral(None, None).unwrap();
        assert_eq!(series.series().map(|values| values.len()), Some(2));
        assert_eq!(series.scalar(), None);
    }

    #[test]
    fn weight_must_cover_grid() {
        let output = output();
        let n_cold = output.fluid_quantity("n_cold").unwrap();

        assert!(matches!(
            n_cold.integral(None, Some(&arr1(&[1., 2.]))),
            Err(SettingsError::Shape(..))
        ));
    }

    #[test]
    fn time_out_of_range() {
        let output = output();
        let n_cold = output.fluid_quantity("n_cold").unwrap();

        assert!(matches!(n_cold.integral(Some(2), None), Err(SettingsError::Range(..))));
    }

    #[test]
    fn profile_outlives_view() {
        let output = output();
        let profile = {
            let n_cold = output.fluid_quantity("n_cold").unwrap();
            n_cold.at(1).unwrap()
        };

        assert_eq!(profile.len(), 20);
        assert!(profile.iter().all(|&v| v == 1.));
    }

    #[test]
    fn map_keeps_variant() {
        assert_eq!(Integral::Scalar(2.).map(|v| v / 2.), Integral::Scalar(1.));
        assert_eq!(
            Integral::Series(arr1(&[2., 4.])).map(|v| v / 2.),
            Integral::Series(arr1(&[1., 2.]))
        );
    }
}
