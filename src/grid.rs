//! Discretization axes that prescribed data is sampled on

use std::{fmt::Display, rc::Rc};

use itertools::Itertools;
use ndarray::{Array1, ArrayD};

use crate::error::SettingsError;

/// The physical coordinate an [Axis] discretizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    /// Time \[s\]
    Time,
    /// Minor radius \[m\]
    Radius,
    /// Momentum magnitude \[m_e c\]
    Momentum,
    /// Cosine of the pitch angle
    Pitch,
}

impl AxisKind {
    /// Key under which the axis is stored in an interchange document
    pub fn key(&self) -> &'static str {
        match self {
            AxisKind::Time => "t",
            AxisKind::Radius => "r",
            AxisKind::Momentum => "p",
            AxisKind::Pitch => "xi",
        }
    }

    /// Unit the coordinate values are expressed in
    pub fn unit(&self) -> &'static str {
        match self {
            AxisKind::Time => "s",
            AxisKind::Radius => "m",
            AxisKind::Momentum => "m_e c",
            AxisKind::Pitch => "1",
        }
    }

    fn bounds(&self) -> (f64, f64) {
        match self {
            AxisKind::Time => (f64::NEG_INFINITY, f64::INFINITY),
            AxisKind::Radius | AxisKind::Momentum => (0., f64::INFINITY),
            AxisKind::Pitch => (-1., 1.),
        }
    }
}

impl Display for AxisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AxisKind::Time => "time",
            AxisKind::Radius => "radius",
            AxisKind::Momentum => "momentum",
            AxisKind::Pitch => "pitch",
        };
        write!(f, "{name}")
    }
}

/// A non-empty, strictly increasing sequence of coordinate values.
///
/// The values are reference counted and immutable, so cloning an axis shares it between every
/// parameter sampled on it without copying.
#[derive(Debug, Clone)]
pub struct Axis {
    kind: AxisKind,
    values: Rc<[f64]>,
}

impl PartialEq for Axis {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.values[..] == other.values[..]
    }
}

impl Axis {
    /// Create an axis, checking that it is non-empty, finite, within the domain of the coordinate
    /// and strictly increasing.
    pub fn new(kind: AxisKind, values: impl Into<Rc<[f64]>>) -> Result<Axis, SettingsError> {
        let values = values.into();

        if values.is_empty() {
            return Err(SettingsError::shape(
                format!("{kind} axis"),
                "axis has no points",
            ));
        }

        let (lower, upper) = kind.bounds();
        if let Some(bad) = values
            .iter()
            .find(|&&v| !v.is_finite() || v < lower || v > upper)
        {
            return Err(SettingsError::range(format!("{kind} axis"), bad));
        }

        if let Some((a, b)) = values.iter().tuple_windows().find(|(a, b)| a >= b) {
            return Err(SettingsError::consistency(
                format!("{kind} axis"),
                format!("values must be strictly increasing, found {a} followed by {b}"),
            ));
        }

        Ok(Axis { kind, values })
    }

    /// Axis with a single point, used when a quantity is constant along this coordinate
    pub fn scalar(kind: AxisKind, value: f64) -> Result<Axis, SettingsError> {
        Axis::new(kind, vec![value])
    }

    /// Decode an axis from an array. Zero-dimensional arrays become single point axes.
    pub fn from_array(kind: AxisKind, array: &ArrayD<f64>) -> Result<Axis, SettingsError> {
        if array.ndim() > 1 {
            return Err(SettingsError::shape(
                format!("{kind} axis"),
                format!("expected one dimension, got {}", array.ndim()),
            ));
        }

        Axis::new(kind, array.iter().copied().collect_vec())
    }

    /// Coordinate this axis discretizes
    pub fn kind(&self) -> AxisKind {
        self.kind
    }

    /// Coordinate values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false, axes can not be empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `other` refers to the same underlying storage
    pub fn shares_storage(&self, other: &Axis) -> bool {
        Rc::ptr_eq(&self.values, &other.values)
    }

    /// Encode as a one-dimensional array
    pub fn to_array(&self) -> ArrayD<f64> {
        Array1::from(self.values.to_vec()).into_dyn()
    }
}
