//! Temporal discretization

use super::wire::WireEnum;
use crate::error::SettingsError;
use crate::interchange::Group;

const ENTITY: &str = "timestep";

/// Relative distance from an integer below which `tmax/dt` is taken to be that integer
const STEP_RATIO_TOLERANCE: f64 = 1e-9;

/// Kind of time stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeStepperType {
    /// Constant time step
    #[default]
    Constant,
}

impl WireEnum for TimeStepperType {
    const WHAT: &'static str = "time stepper type";
    const TABLE: &'static [(Self, i64)] = &[(TimeStepperType::Constant, 1)];
}

/// How the interval up to the horizon is divided. Exactly one of the two is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepResolution {
    /// Fixed step length \[s\]
    StepSize(f64),
    /// Fixed number of steps
    StepCount(u64),
}

/// Time stepper settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeStepper {
    stepper_type: TimeStepperType,
    horizon: Option<f64>,
    resolution: Option<StepResolution>,
}

impl TimeStepper {
    /// Constant time stepper with neither horizon nor resolution set
    pub fn new() -> TimeStepper {
        TimeStepper::default()
    }

    /// Constant time stepper up to `horizon` in `count` steps
    pub fn with_step_count(horizon: f64, count: u64) -> Result<TimeStepper, SettingsError> {
        let mut stepper = TimeStepper::new();
        stepper.set_horizon(horizon)?;
        stepper.set_step_count(count)?;
        Ok(stepper)
    }

    /// Constant time stepper up to `horizon` with steps of `size`
    pub fn with_step_size(horizon: f64, size: f64) -> Result<TimeStepper, SettingsError> {
        let mut stepper = TimeStepper::new();
        stepper.set_horizon(horizon)?;
        stepper.set_step_size(size)?;
        Ok(stepper)
    }

    /// Kind of time stepper
    pub fn stepper_type(&self) -> TimeStepperType {
        self.stepper_type
    }

    /// Simulation end time \[s\]
    pub fn horizon(&self) -> Option<f64> {
        self.horizon
    }

    /// Active step resolution
    pub fn resolution(&self) -> Option<StepResolution> {
        self.resolution
    }

    /// Set the simulation end time
    pub fn set_horizon(&mut self, horizon: f64) -> Result<(), SettingsError> {
        if !(horizon > 0.) || !horizon.is_finite() {
            return Err(SettingsError::range("timestep/tmax", horizon));
        }
        self.horizon = Some(horizon);
        Ok(())
    }

    /// Use steps of fixed length. Fails if a step count is already set.
    pub fn set_step_size(&mut self, size: f64) -> Result<(), SettingsError> {
        if !(size > 0.) || !size.is_finite() {
            return Err(SettingsError::range("timestep/dt", size));
        }
        if let Some(StepResolution::StepCount(count)) = self.resolution {
            if count > 0 {
                return Err(SettingsError::MutualExclusion("dt", "nt"));
            }
        }
        self.resolution = Some(StepResolution::StepSize(size));
        Ok(())
    }

    /// Use a fixed number of steps. Fails if a step size is already set, or if `count` does not
    /// fit the signed integer of an interchange document.
    pub fn set_step_count(&mut self, count: u64) -> Result<(), SettingsError> {
        if count == 0 || i64::try_from(count).is_err() {
            return Err(SettingsError::range("timestep/nt", count));
        }
        if let Some(StepResolution::StepSize(size)) = self.resolution {
            if size > 0. {
                return Err(SettingsError::MutualExclusion("nt", "dt"));
            }
        }
        self.resolution = Some(StepResolution::StepCount(count));
        Ok(())
    }

    /// Unset the step size, if that is the active resolution
    pub fn clear_step_size(&mut self) {
        if matches!(self.resolution, Some(StepResolution::StepSize(_))) {
            self.resolution = None;
        }
    }

    /// Unset the step count, if that is the active resolution
    pub fn clear_step_count(&mut self) {
        if matches!(self.resolution, Some(StepResolution::StepCount(_))) {
            self.resolution = None;
        }
    }

    /// Length of a single step, derived from the count if necessary
    pub fn time_step(&self) -> Option<f64> {
        match (self.horizon, self.resolution?) {
            (_, StepResolution::StepSize(size)) => Some(size),
            (Some(horizon), StepResolution::StepCount(count)) => Some(horizon / count as f64),
            (None, StepResolution::StepCount(_)) => None,
        }
    }

    /// Number of steps, derived from the size if necessary. A final partial step counts as a step.
    pub fn step_count(&self) -> Option<u64> {
        match (self.horizon, self.resolution?) {
            (_, StepResolution::StepCount(count)) => Some(count),
            (Some(horizon), StepResolution::StepSize(size)) => {
                let ratio = horizon / size;
                let nearest = ratio.round();
                let steps = if (ratio - nearest).abs() <= STEP_RATIO_TOLERANCE * nearest.max(1.) {
                    nearest
                } else {
                    ratio.ceil()
                };
                Some(steps.max(1.) as u64)
            }
            (None, StepResolution::StepSize(_)) => None,
        }
    }

    /// Check that the horizon is set and exactly one resolution is active
    pub fn check_consistency(&self) -> Result<(), SettingsError> {
        match self.stepper_type {
            TimeStepperType::Constant => {
                match self.horizon {
                    Some(horizon) if horizon > 0. && horizon.is_finite() => {}
                    _ => {
                        return Err(SettingsError::consistency(
                            ENTITY,
                            "`tmax` must be set to a value > 0",
                        ))
                    }
                }

                match self.resolution {
                    None => Err(SettingsError::consistency(
                        ENTITY,
                        "exactly one of `dt` and `nt` must be set, found neither",
                    )),
                    Some(StepResolution::StepSize(size)) if !(size > 0.) || !size.is_finite() => {
                        Err(SettingsError::consistency(ENTITY, "`dt` must be > 0"))
                    }
                    Some(StepResolution::StepCount(0)) => {
                        Err(SettingsError::consistency(ENTITY, "`nt` must be > 0"))
                    }
                    Some(_) => Ok(()),
                }
            }
        }
    }

    /// Encode as `{ type, tmax, dt | nt }`
    pub fn to_interchange(&self) -> Result<Group, SettingsError> {
        self.check_consistency()?;

        let group = Group::new().with("type", self.stepper_type.to_wire());
        let group = match self.horizon {
            Some(horizon) => group.with("tmax", horizon),
            None => group,
        };

        Ok(match self.resolution {
            Some(StepResolution::StepSize(size)) => group.with("dt", size),
            Some(StepResolution::StepCount(count)) => group.with(
                "nt",
                i64::try_from(count).map_err(|_| SettingsError::range("timestep/nt", count))?,
            ),
            None => group,
        })
    }

    /// Decode and check a time stepper. Documents carrying both `dt` and `nt` are rejected.
    pub fn from_interchange(group: &Group) -> Result<TimeStepper, SettingsError> {
        let stepper_type = TimeStepperType::from_wire(group.int("type")?)?;
        let horizon = Some(group.float("tmax")?);
        let size = group.optional_float("dt")?;
        let count = group.optional_int("nt")?;

        let resolution = match (size, count) {
            (Some(size), Some(count)) if size > 0. && count > 0 => {
                return Err(SettingsError::consistency(
                    ENTITY,
                    "exactly one of `dt` and `nt` must be set, found both",
                ))
            }
            (Some(size), _) if size > 0. => Some(StepResolution::StepSize(size)),
            (_, Some(count)) if count > 0 => Some(StepResolution::StepCount(count as u64)),
            (Some(_), _) => Some(StepResolution::StepSize(0.)),
            (None, Some(_)) => Some(StepResolution::StepCount(0)),
            (None, None) => None,
        };

        let stepper = TimeStepper {
            stepper_type,
            horizon,
            resolution,
        };

        stepper.check_consistency()?;

        Ok(stepper)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{StepResolution, TimeStepper};
    use crate::error::SettingsError;
    use crate::interchange::Group;

    #[test]
    fn horizon_must_be_positive() {
        let mut stepper = TimeStepper::new();

        assert!(matches!(stepper.set_horizon(0.), Err(SettingsError::Range(..))));
        assert!(matches!(stepper.set_horizon(-1.), Err(SettingsError::Range(..))));
        assert_eq!(stepper.horizon(), None);
        assert_eq!(stepper.set_horizon(0.1), Ok(()));
        assert_eq!(stepper.horizon(), Some(0.1));
    }

    #[test]
    fn size_and_count_are_exclusive() {
        let mut stepper = TimeStepper::with_step_count(0.1, 20).unwrap();

        assert_eq!(
            stepper.set_step_size(0.01),
            Err(SettingsError::MutualExclusion("dt", "nt"))
        );
        assert_eq!(stepper.resolution(), Some(StepResolution::StepCount(20)));

        stepper.clear_step_count();
        assert_eq!(stepper.set_step_size(0.01), Ok(()));
        assert_eq!(
            stepper.set_step_count(5),
            Err(SettingsError::MutualExclusion("nt", "dt"))
        );
    }

    #[test]
    fn clearing_the_inactive_slot_does_nothing() {
        let mut stepper = TimeStepper::with_step_size(1., 0.1).unwrap();

        stepper.clear_step_count();
        assert_eq!(stepper.resolution(), Some(StepResolution::StepSize(0.1)));
    }

    #[test]
    fn replacing_the_same_slot_is_allowed() {
        let mut stepper = TimeStepper::with_step_count(1., 10).unwrap();

        assert_eq!(stepper.set_step_count(100), Ok(()));
        assert_eq!(stepper.step_count(), Some(100));
    }

    #[test]
    fn invalid_step_values() {
        let mut stepper = TimeStepper::new();

        assert!(matches!(stepper.set_step_size(0.), Err(SettingsError::Range(..))));
        assert!(matches!(stepper.set_step_size(f64::NAN), Err(SettingsError::Range(..))));
        assert!(matches!(stepper.set_step_count(0), Err(SettingsError::Range(..))));
    }

    #[test]
    fn consistency_requires_horizon_and_resolution() {
        let mut stepper = TimeStepper::new();
        assert!(matches!(
            stepper.check_consistency(),
            Err(SettingsError::Consistency(..))
        ));

        stepper.set_horizon(1e-7).unwrap();
        let first = stepper.check_consistency();
        assert!(matches!(first, Err(SettingsError::Consistency(..))));
        assert_eq!(stepper.check_consistency(), first);

        stepper.set_step_count(10).unwrap();
        assert_eq!(stepper.check_consistency(), Ok(()));
    }

    #[test]
    fn derived_step_values() {
        let by_count = TimeStepper::with_step_count(1e-7, 10).unwrap();
        let by_size = TimeStepper::with_step_size(1.0, 0.3).unwrap();

        assert_relative_eq!(by_count.time_step().unwrap(), 1e-8, max_relative = 1e-12);
        assert_eq!(by_size.step_count(), Some(4));
    }

    #[test]
    fn step_count_must_fit_document() {
        let mut stepper = TimeStepper::with_step_count(1., 10).unwrap();

        assert!(matches!(stepper.set_step_count(u64::MAX), Err(SettingsError::Range(..))));
        assert!(matches!(
            TimeStepper::with_step_count(1., i64::MAX as u64 + 1),
            Err(SettingsError::Range(..))
        ));
        assert_eq!(stepper.step_count(), Some(10));

        stepper.set_step_count(i64::MAX as u64).unwrap();
        let encoded = stepper.to_interchange().unwrap();
        assert_eq!(encoded.int("nt"), Ok(i64::MAX));
        assert_eq!(TimeStepper::from_interchange(&encoded), Ok(stepper));
    }

    #[test]
    fn step_count_ignores_rounding_noise() {
        let exact = TimeStepper::with_step_size(3. * 0.1, 0.1).unwrap();
        let partial = TimeStepper::with_step_size(0.35, 0.1).unwrap();

        assert_eq!(exact.step_count(), Some(3));
        assert_eq!(partial.step_count(), Some(4));
    }

    #[test]
    fn round_trip() {
        for stepper in [
            TimeStepper::with_step_count(1e-7, 10).unwrap(),
            TimeStepper::with_step_size(0.1, 1e-3).unwrap(),
        ] {
            let encoded = stepper.to_interchange().unwrap();
            assert_eq!(TimeStepper::from_interchange(&encoded), Ok(stepper));
        }
    }

    #[test]
    fn document_keys() {
        let encoded = TimeStepper::with_step_count(1e-7, 10)
            .unwrap()
            .to_interchange()
            .unwrap();

        assert_eq!(encoded.int("type"), Ok(1));
        assert_eq!(encoded.int("nt"), Ok(10));
        assert!(!encoded.contains("dt"));
    }

    #[test]
    fn both_slots_in_document_is_rejected() {
        let document = Group::new()
            .with("type", 1i64)
            .with("tmax", 0.1)
            .with("dt", 0.01)
            .with("nt", 20i64);

        assert!(matches!(
            TimeStepper::from_interchange(&document),
            Err(SettingsError::Consistency(..))
        ));
    }

    #[test]
    fn missing_horizon_in_document() {
        let document = Group::new().with("type", 1i64).with("nt", 20i64);

        assert_eq!(
            TimeStepper::from_interchange(&document),
            Err(SettingsError::MissingField("tmax".into()))
        );
    }

    #[test]
    fn unknown_stepper_type() {
        let document = Group::new().with("type", 4i64).with("tmax", 0.1);

        assert!(matches!(
            TimeStepper::from_interchange(&document),
            Err(SettingsError::UnknownVariant(..))
        ));
    }
}
