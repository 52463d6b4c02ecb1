//! Radial discretization and magnetic geometry

use super::wire::WireEnum;
use crate::error::SettingsError;
use crate::interchange::Group;

const ENTITY: &str = "radialgrid";

/// Magnetic geometry of the radial grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadialGridType {
    /// Circular flux surfaces in the large aspect ratio limit
    #[default]
    Cylindrical,
}

impl WireEnum for RadialGridType {
    const WHAT: &'static str = "radial grid type";
    const TABLE: &'static [(Self, i64)] = &[(RadialGridType::Cylindrical, 1)];
}

/// Radial grid settings
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGrid {
    grid_type: RadialGridType,
    magnetic_field: f64,
    minor_radius: f64,
    nr: u32,
    wall_radius: Option<f64>,
}

impl Default for RadialGrid {
    fn default() -> Self {
        RadialGrid {
            grid_type: RadialGridType::Cylindrical,
            magnetic_field: 5.,
            minor_radius: 0.22,
            nr: 10,
            wall_radius: None,
        }
    }
}

fn positive(field: &str, value: f64) -> Result<f64, SettingsError> {
    if value > 0. && value.is_finite() {
        Ok(value)
    } else {
        Err(SettingsError::range(field, value))
    }
}

impl RadialGrid {
    /// Cylindrical grid with `nr` cells out to `minor_radius`, in a field of `magnetic_field`
    pub fn cylindrical(magnetic_field: f64, minor_radius: f64, nr: u32) -> Result<RadialGrid, SettingsError> {
        let mut grid = RadialGrid::default();
        grid.set_magnetic_field(magnetic_field)?;
        grid.set_minor_radius(minor_radius)?;
        grid.set_nr(nr)?;
        Ok(grid)
    }

    /// Geometry of the grid
    pub fn grid_type(&self) -> RadialGridType {
        self.grid_type
    }

    /// On-axis magnetic field \[T\]
    pub fn magnetic_field(&self) -> f64 {
        self.magnetic_field
    }

    /// Plasma minor radius \[m\]
    pub fn minor_radius(&self) -> f64 {
        self.minor_radius
    }

    /// Number of radial cells
    pub fn nr(&self) -> u32 {
        self.nr
    }

    /// Radius of the conducting wall \[m\]
    pub fn wall_radius(&self) -> Option<f64> {
        self.wall_radius
    }

    /// Set the on-axis magnetic field
    pub fn set_magnetic_field(&mut self, magnetic_field: f64) -> Result<(), SettingsError> {
        self.magnetic_field = positive("radialgrid/B0", magnetic_field)?;
        Ok(())
    }

    /// Set the minor radius
    pub fn set_minor_radius(&mut self, minor_radius: f64) -> Result<(), SettingsError> {
        self.minor_radius = positive("radialgrid/a", minor_radius)?;
        Ok(())
    }

    /// Set the number of radial cells
    pub fn set_nr(&mut self, nr: u32) -> Result<(), SettingsError> {
        if nr == 0 {
            return Err(SettingsError::range("radialgrid/nr", nr));
        }
        self.nr = nr;
        Ok(())
    }

    /// Set the wall radius. Must not be inside the plasma, checked on validation.
    pub fn set_wall_radius(&mut self, wall_radius: f64) -> Result<(), SettingsError> {
        self.wall_radius = Some(positive("radialgrid/b", wall_radius)?);
        Ok(())
    }

    /// Check all fields
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [("B0", self.magnetic_field), ("a", self.minor_radius)] {
            if positive(field, value).is_err() {
                return Err(SettingsError::consistency(
                    ENTITY,
                    format!("`{field}` must be > 0, got {value}"),
                ));
            }
        }

        if self.nr == 0 {
            return Err(SettingsError::consistency(ENTITY, "`nr` must be > 0"));
        }

        if let Some(wall) = self.wall_radius {
            if !(wall >= self.minor_radius) {
                return Err(SettingsError::consistency(
                    ENTITY,
                    format!("wall radius {wall} is inside the plasma (a = {})", self.minor_radius),
                ));
            }
        }

        Ok(())
    }

    /// Encode as `{ type, B0, a, nr, [b] }`
    pub fn to_interchange(&self) -> Result<Group, SettingsError> {
        self.validate()?;

        let group = Group::new()
            .with("type", self.grid_type.to_wire())
            .with("B0", self.magnetic_field)
            .with("a", self.minor_radius)
            .with("nr", i64::from(self.nr));

        Ok(match self.wall_radius {
            Some(wall) => group.with("b", wall),
            None => group,
        })
    }

    /// Decode and validate radial grid settings
    pub fn from_interchange(group: &Group) -> Result<RadialGrid, SettingsError> {
        let nr = group.int("nr")?;

        let grid = RadialGrid {
            grid_type: RadialGridType::from_wire(group.int("type")?)?,
            magnetic_field: group.float("B0")?,
            minor_radius: group.float("a")?,
            nr: u32::try_from(nr)
                .map_err(|_| SettingsError::consistency(ENTITY, format!("`nr` is not a valid count: {nr}")))?,
            wall_radius: group.optional_float("b")?,
        };

        grid.validate()?;

        Ok(grid)
    }
}
