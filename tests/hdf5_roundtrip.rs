#![cfg(feature = "hdf5")]

use std::f64::consts::PI;

use approx::assert_relative_eq;
use ndarray::{aview0, Array2, Array4};
use tempfile::tempdir;

use dream_settings::output::CurrentUnit;
use dream_settings::settings::parameter::{ParameterKind, ParameterType};
use dream_settings::settings::solver::{LinearSolver, Solver, Strategy};
use dream_settings::settings::time_stepper::TimeStepper;
use dream_settings::{interchange, Axis, AxisKind, FileError, Output, OutputGrid, Settings, SettingsError};

#[test]
fn settings_survive_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.h5");

    let mut settings = Settings::basic().unwrap();
    settings.solver = Solver::nonlinear(50, 1e-8).unwrap();
    settings.solver.set_strategy(Strategy::NonlinearAlternate);
    settings.solver.set_linear_solver(LinearSolver::Gmres);
    settings.time_step = TimeStepper::with_step_size(1e-6, 1e-8).unwrap();

    let t = Axis::scalar(AxisKind::Time, 0.).unwrap();
    let r = Axis::new(AxisKind::Radius, vec![0., 0.1, 0.2]).unwrap();
    let p = Axis::new(AxisKind::Momentum, vec![0.5, 1., 2., 4.]).unwrap();
    let xi = Axis::new(AxisKind::Pitch, vec![-1., 0., 1.]).unwrap();
    settings
        .eqsys
        .parameter_mut(ParameterKind::HotElectronDistribution)
        .set_prescribed(Array4::from_elem((1, 3, 4, 3), 1e12), vec![t, r, p, xi])
        .unwrap();

    settings.save(&path).unwrap();
    let loaded = Settings::load(&path).unwrap();

    assert_eq!(loaded, settings);
    assert_eq!(
        loaded.eqsys.f_hot().parameter_type(),
        ParameterType::Prescribed
    );
}

#[test]
fn invalid_settings_create_no_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.h5");

    let settings = Settings::new();

    assert!(matches!(
        settings.save(&path),
        Err(FileError::Settings(SettingsError::Consistency(..)))
    ));
    assert!(!path.exists());
}

#[test]
fn missing_file() {
    let dir = tempdir().unwrap();

    assert!(matches!(
        Settings::load(dir.path().join("absent.h5")),
        Err(FileError::Open(..))
    ));
}

#[test]
fn incomplete_settings_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.h5");

    let mut document = Settings::basic().unwrap().snapshot().unwrap();
    let solver = document.group("solver").unwrap().clone();
    let mut stripped = interchange::Group::new();
    for (name, value) in solver.iter().filter(|(name, _)| name.as_str() != "linsolv") {
        stripped.insert(name, value.clone());
    }
    document.insert("solver", stripped);
    interchange::hdf5::write(&path, &document).unwrap();

    assert!(matches!(
        Settings::load(&path),
        Err(FileError::Settings(SettingsError::MissingField(field))) if field == "solver/linsolv"
    ));
}

#[test]
fn total_current_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("output.h5");

    let a = 0.22;
    let t = Axis::new(AxisKind::Time, vec![0., 1e-8, 2e-8, 3e-8]).unwrap();
    let mut output = Output::new(OutputGrid::cylindrical(t, a, 16, 5.).unwrap());
    output.insert_field("j_ohm", Array2::from_elem((4, 16), 1.).into_dyn());
    output.insert_field("T_cold", Array2::from_elem((4, 16), 1e4).into_dyn());

    interchange::hdf5::write(&path, &output.to_interchange()).unwrap();
    let loaded = Output::load(&path).unwrap();

    assert_eq!(loaded, output);

    let current = loaded
        .current_density("j_ohm")
        .unwrap()
        .total_current(Some(3))
        .unwrap();

    assert_eq!(current.unit(), CurrentUnit::AmpereMajorRadiusCubed);
    assert_relative_eq!(
        current.value().scalar().unwrap(),
        PI * a * a,
        max_relative = 1e-10
    );
}

#[test]
fn boolean_flags_are_read_as_integers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.h5");

    Settings::basic().unwrap().save(&path).unwrap();
    {
        let file = hdf5::File::open_rw(&path).unwrap();
        let solver = file.group("solver").unwrap();
        solver.unlink("verbose").unwrap();
        solver
            .new_dataset_builder()
            .with_data(aview0(&true))
            .create("verbose")
            .unwrap();
    }

    let loaded = Settings::load(&path).unwrap();
    assert!(loaded.solver.verbose());
}
