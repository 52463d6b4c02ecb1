//! Physical quantities that are either prescribed as data or evolved by the solver

use std::fmt::Display;

use itertools::Itertools;
use ndarray::{Array, ArrayD, Dimension};

use super::wire::WireEnum;
use crate::error::SettingsError;
use crate::grid::{Axis, AxisKind};
use crate::interchange::Group;

/// How a [Parameter] evolves in time, as written to interchange documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    /// Given as data on a grid
    Prescribed,
    /// Computed by the solver
    SelfConsistent,
}

impl WireEnum for ParameterType {
    const WHAT: &'static str = "parameter type";
    const TABLE: &'static [(Self, i64)] = &[
        (ParameterType::Prescribed, 1),
        (ParameterType::SelfConsistent, 2),
    ];
}

/// Canonical order of the axes of prescribed data.
///
/// The solver reads prescribed arrays positionally, so the order is fixed per [ParameterKind]:
/// time first, then radius, then momentum space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLayout {
    axes: &'static [AxisKind],
}

impl ShapeLayout {
    /// Time × radius
    pub const TIME_RADIUS: ShapeLayout = ShapeLayout {
        axes: &[AxisKind::Time, AxisKind::Radius],
    };
    /// Time × radius × momentum × pitch
    pub const TIME_RADIUS_MOMENTUM_PITCH: ShapeLayout = ShapeLayout {
        axes: &[
            AxisKind::Time,
            AxisKind::Radius,
            AxisKind::Momentum,
            AxisKind::Pitch,
        ],
    };

    /// Axes in their canonical order
    pub fn axes(&self) -> &'static [AxisKind] {
        self.axes
    }

    /// Check that `axes` follow this layout and that `data` is sampled on them
    pub fn check(&self, entity: &str, data: &ArrayD<f64>, axes: &[Axis]) -> Result<(), SettingsError> {
        if axes.len() != self.axes.len() {
            return Err(SettingsError::shape(
                entity,
                format!("expected {} axes, got {}", self.axes.len(), axes.len()),
            ));
        }

        for (position, (axis, &expected)) in axes.iter().zip(self.axes).enumerate() {
            if axis.kind() != expected {
                return Err(SettingsError::shape(
                    entity,
                    format!("axis {position} must be {expected}, got {}", axis.kind()),
                ));
            }
            if axis.is_empty() {
                return Err(SettingsError::shape(entity, format!("{expected} axis is empty")));
            }
        }

        let expected_shape = axes.iter().map(Axis::len).collect_vec();

        if data.shape() != expected_shape.as_slice() {
            return Err(SettingsError::shape(
                entity,
                format!(
                    "data has shape {:?}, expected {:?} ({})",
                    data.shape(),
                    expected_shape,
                    self.axes.iter().join(" x ")
                ),
            ));
        }

        if let Some(bad) = data.iter().find(|v| !v.is_finite()) {
            return Err(SettingsError::range(format!("{entity}/data"), bad));
        }

        Ok(())
    }
}

/// The quantities that can be prescribed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Parallel electric field \[V/m\]
    ElectricField,
    /// Temperature of the cold electron population \[eV\]
    ColdElectronTemperature,
    /// Density of the cold electron population \[m^-3\]
    ColdElectronDensity,
    /// Hot electron distribution function
    HotElectronDistribution,
}

impl ParameterKind {
    /// All kinds, in the order they appear in the equation system
    pub const ALL: [ParameterKind; 4] = [
        ParameterKind::ElectricField,
        ParameterKind::ColdElectronTemperature,
        ParameterKind::ColdElectronDensity,
        ParameterKind::HotElectronDistribution,
    ];

    /// Name of the unknown, which is also its key in the equation system
    pub fn name(&self) -> &'static str {
        match self {
            ParameterKind::ElectricField => "E_field",
            ParameterKind::ColdElectronTemperature => "T_cold",
            ParameterKind::ColdElectronDensity => "n_cold",
            ParameterKind::HotElectronDistribution => "f_hot",
        }
    }

    /// Shape checker for prescribed data of this kind
    pub fn layout(&self) -> ShapeLayout {
        match self {
            ParameterKind::ElectricField
            | ParameterKind::ColdElectronTemperature
            | ParameterKind::ColdElectronDensity => ShapeLayout::TIME_RADIUS,
            ParameterKind::HotElectronDistribution => ShapeLayout::TIME_RADIUS_MOMENTUM_PITCH,
        }
    }
}

impl Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Prescribed data together with the axes it is sampled on
#[derive(Debug, Clone, PartialEq)]
pub struct PrescribedData {
    data: ArrayD<f64>,
    axes: Vec<Axis>,
}

impl PrescribedData {
    /// Sampled values, with axes in canonical order
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Axes in canonical order
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Axis of the given kind, if the data is sampled along it
    pub fn axis(&self, kind: AxisKind) -> Option<&Axis> {
        self.axes.iter().find(|axis| axis.kind() == kind)
    }
}

/// Active variant of a [Parameter]
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterMode {
    /// Evolution given by data
    Prescribed(PrescribedData),
    /// Evolution computed by the solver
    SelfConsistent,
}

/// A single unknown of the equation system.
///
/// New parameters are self-consistent. Every setter checks the invariants of the variant it
/// activates before touching the parameter, so a failed call leaves it unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    kind: ParameterKind,
    mode: ParameterMode,
}

impl Parameter {
    /// A self-consistent parameter
    pub fn new(kind: ParameterKind) -> Parameter {
        Parameter {
            kind,
            mode: ParameterMode::SelfConsistent,
        }
    }

    /// A parameter prescribed by `data` sampled on `axes`
    pub fn prescribed<D: Dimension>(
        kind: ParameterKind,
        data: Array<f64, D>,
        axes: Vec<Axis>,
    ) -> Result<Parameter, SettingsError> {
        let mut parameter = Parameter::new(kind);
        parameter.set_prescribed(data, axes)?;
        Ok(parameter)
    }

    /// Which quantity this is
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Active variant
    pub fn mode(&self) -> &ParameterMode {
        &self.mode
    }

    /// Discriminant of the active variant
    pub fn parameter_type(&self) -> ParameterType {
        match self.mode {
            ParameterMode::Prescribed(_) => ParameterType::Prescribed,
            ParameterMode::SelfConsistent => ParameterType::SelfConsistent,
        }
    }

    /// Prescribed data, if prescribed
    pub fn prescribed_data(&self) -> Option<&PrescribedData> {
        match &self.mode {
            ParameterMode::Prescribed(prescribed) => Some(prescribed),
            ParameterMode::SelfConsistent => None,
        }
    }

    /// Prescribe the evolution of this parameter, discarding any previous data and axes.
    ///
    /// `axes` must be given in the canonical order of [ParameterKind::layout].
    pub fn set_prescribed<D: Dimension>(
        &mut self,
        data: Array<f64, D>,
        axes: Vec<Axis>,
    ) -> Result<(), SettingsError> {
        let data = data.into_dyn();
        self.kind.layout().check(self.kind.name(), &data, &axes)?;

        self.mode = ParameterMode::Prescribed(PrescribedData { data, axes });

        Ok(())
    }

    /// Let the solver evolve this parameter
    pub fn set_self_consistent(&mut self) {
        self.mode = ParameterMode::SelfConsistent;
    }

    /// Re-check the invariants of the active variant
    pub fn validate(&self) -> Result<(), SettingsError> {
        match &self.mode {
            ParameterMode::Prescribed(PrescribedData { data, axes }) => self
                .kind
                .layout()
                .check(self.kind.name(), data, axes)
                .map_err(|err| match err {
                    SettingsError::Shape(entity, message) => {
                        SettingsError::Consistency(format!("{entity}/data"), message)
                    }
                    other => other,
                }),
            ParameterMode::SelfConsistent => Ok(()),
        }
    }

    /// Encode as `{ type, [data: { x, <axis keys> }] }`
    pub fn to_interchange(&self) -> Result<Group, SettingsError> {
        self.validate()?;

        let group = Group::new().with("type", self.parameter_type().to_wire());

        Ok(match &self.mode {
            ParameterMode::Prescribed(PrescribedData { data, axes }) => {
                let mut data_group = Group::new().with("x", data.clone());
                for axis in axes {
                    data_group.insert(axis.kind().key(), axis.to_array());
                }
                group.with("data", data_group)
            }
            ParameterMode::SelfConsistent => group,
        })
    }

    /// Decode a parameter of the given kind
    pub fn from_interchange(kind: ParameterKind, group: &Group) -> Result<Parameter, SettingsError> {
        let parameter_type = ParameterType::from_wire(group.int("type")?)?;

        let parameter = match parameter_type {
            ParameterType::Prescribed => {
                let data_group = group.group("data")?;
                let data = data_group.array("x")?;
                let axes = kind
                    .layout()
                    .axes()
                    .iter()
                    .map(|&axis_kind| {
                        data_group
                            .array(axis_kind.key())
                            .and_then(|array| Axis::from_array(axis_kind, &array))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Parameter {
                    kind,
                    mode: ParameterMode::Prescribed(PrescribedData { data, axes }),
                }
            }
            ParameterType::SelfConsistent => Parameter::new(kind),
        };

        parameter.validate()?;

        Ok(parameter)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use ndarray::{Array2, Array4};

    use super::{Parameter, ParameterKind, ParameterMode, ParameterType};
    use crate::error::SettingsError;
    use crate::grid::{Axis, AxisKind};
    use crate::interchange::Group;

    fn axes(nt: usize, nr: usize) -> Vec<Axis> {
        vec![
            Axis::new(AxisKind::Time, (0..nt).map(|i| i as f64 * 1e-3).collect_vec()).unwrap(),
            Axis::new(AxisKind::Radius, (0..nr).map(|i| i as f64 * 0.02).collect_vec()).unwrap(),
        ]
    }

    #[test]
    fn shape_must_match_axes() {
        let data = Array2::<f64>::zeros((3, 4));

        assert!(matches!(
            Parameter::prescribed(ParameterKind::ElectricField, data.clone(), axes(3, 5)),
            Err(SettingsError::Shape(..))
        ));
        assert!(Parameter::prescribed(ParameterKind::ElectricField, data, axes(3, 4)).is_ok());
    }

    #[test]
    fn axes_must_be_in_canonical_order() {
        let data = Array2::<f64>::zeros((4, 3));
        let mut swapped = axes(3, 4);
        swapped.reverse();

        assert!(matches!(
            Parameter::prescribed(ParameterKind::ColdElectronTemperature, data, swapped),
            Err(SettingsError::Shape(..))
        ));
    }

    #[test]
    fn dimensionality_must_match() {
        let data = ndarray::Array1::<f64>::zeros(3);

        assert!(matches!(
            Parameter::prescribed(ParameterKind::ElectricField, data, axes(3, 1)),
            Err(SettingsError::Shape(..))
        ));
    }

    #[test]
    fn failed_set_leaves_parameter_unchanged() {
        let mut parameter =
            Parameter::prescribed(ParameterKind::ElectricField, Array2::ones((2, 2)), axes(2, 2))
                .unwrap();
        let before = parameter.clone();

        assert!(parameter
            .set_prescribed(Array2::ones((2, 3)), axes(2, 2))
            .is_err());
        assert_eq!(parameter, before);
    }

    #[test]
    fn switching_variant_discards_data() {
        let mut parameter =
            Parameter::prescribed(ParameterKind::ElectricField, Array2::ones((2, 2)), axes(2, 2))
                .unwrap();

        parameter.set_self_consistent();
        assert_eq!(parameter.mode(), &ParameterMode::SelfConsistent);
        assert!(parameter.prescribed_data().is_none());

        parameter
            .set_prescribed(Array2::from_elem((1, 3), 5.), axes(1, 3))
            .unwrap();
        let prescribed = parameter.prescribed_data().unwrap();
        assert_eq!(prescribed.data().shape(), &[1, 3]);
        assert_eq!(prescribed.axis(AxisKind::Radius).unwrap().len(), 3);
    }

    #[test]
    fn round_trip() {
        let data = Array2::from_shape_fn((3, 4), |(i, j)| (i * 10 + j) as f64);
        let prescribed =
            Parameter::prescribed(ParameterKind::ElectricField, data, axes(3, 4)).unwrap();
        let self_consistent = Parameter::new(ParameterKind::ColdElectronDensity);

        for parameter in [prescribed, self_consistent] {
            let encoded = parameter.to_interchange().unwrap();
            let decoded = Parameter::from_interchange(parameter.kind(), &encoded).unwrap();
            assert_eq!(decoded, parameter);
        }
    }

    #[test]
    fn four_dimensional_round_trip() {
        let data = Array4::from_elem((1, 2, 3, 2), 1.);
        let axes = vec![
            Axis::scalar(AxisKind::Time, 0.).unwrap(),
            Axis::new(AxisKind::Radius, vec![0.05, 0.15]).unwrap(),
            Axis::new(AxisKind::Momentum, vec![0., 0.5, 1.]).unwrap(),
            Axis::new(AxisKind::Pitch, vec![-1., 1.]).unwrap(),
        ];
        let parameter =
            Parameter::prescribed(ParameterKind::HotElectronDistribution, data, axes).unwrap();

        let encoded = parameter.to_interchange().unwrap();
        assert!(encoded.group("data").unwrap().contains("xi"));

        let decoded =
            Parameter::from_interchange(ParameterKind::HotElectronDistribution, &encoded).unwrap();
        assert_eq!(decoded, parameter);
    }

    #[test]
    fn self_consistent_document_has_only_type() {
        let encoded = Parameter::new(ParameterKind::ElectricField)
            .to_interchange()
            .unwrap();

        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded.int("type"), Ok(2));
        assert_eq!(
            Parameter::new(ParameterKind::ElectricField).parameter_type(),
            ParameterType::SelfConsistent
        );
    }

    #[test]
    fn unknown_type() {
        let document = Group::new().with("type", 3i64);

        assert!(matches!(
            Parameter::from_interchange(ParameterKind::ElectricField, &document),
            Err(SettingsError::UnknownVariant(..))
        ));
    }

    #[test]
    fn missing_fields() {
        let no_data = Group::new().with("type", 1i64);
        assert_eq!(
            Parameter::from_interchange(ParameterKind::ElectricField, &no_data),
            Err(SettingsError::MissingField("data".into()))
        );

        let mut encoded =
            Parameter::prescribed(ParameterKind::ElectricField, Array2::ones((2, 2)), axes(2, 2))
                .unwrap()
                .to_interchange()
                .unwrap();
        let data = encoded.group("data").unwrap().clone();
        let mut without_radius = Group::new();
        for (name, value) in data.iter().filter(|(name, _)| name.as_str() != "r") {
            without_radius.insert(name, value.clone());
        }
        encoded.insert("data", without_radius);

        assert_eq!(
            Parameter::from_interchange(ParameterKind::ElectricField, &encoded),
            Err(SettingsError::MissingField("data/r".into()))
        );
    }

    #[test]
    fn decoded_shape_mismatch_is_a_consistency_error() {
        let document = Group::new().with("type", 1i64).with(
            "data",
            Group::new()
                .with("x", Array2::<f64>::zeros((2, 3)).into_dyn())
                .with("t", ndarray::arr1(&[0., 1.]).into_dyn())
                .with("r", ndarray::arr1(&[0., 1.]).into_dyn()),
        );

        let result = Parameter::from_interchange(ParameterKind::ElectricField, &document);
        assert!(matches!(result, Err(SettingsError::Consistency(..))));
    }

    #[test]
    fn validate_is_idempotent() {
        let parameter =
            Parameter::prescribed(ParameterKind::ElectricField, Array2::ones((2, 2)), axes(2, 2))
                .unwrap();

        assert_eq!(parameter.validate(), Ok(()));
        assert_eq!(parameter.validate(), Ok(()));
    }
}
