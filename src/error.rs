//! Errors raised while building, validating and (de)serializing settings

use thiserror::Error;

/// Errors that can be returned by the settings and output model.
///
/// Every variant names the entity or field that caused it, so that a failure deep in a settings
/// tree can be traced back without a stack.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SettingsError {
    /// Array dimensionality or extents do not agree with the axes it is sampled on.
    ///
    /// The first parameter is the entity, the second a description of the mismatch.
    #[error("{0}: shape mismatch: {1}")]
    Shape(String, String),
    /// A numeric value is outside of its allowed domain.
    ///
    /// The first parameter is the field, the second the offending value.
    #[error("{0}: value {1} is out of range")]
    Range(String, String),
    /// Two alternative fields were both set.
    ///
    /// The first parameter is the field being set, the second the field already holding a value.
    #[error("`{0}` may not be set alongside `{1}`")]
    MutualExclusion(&'static str, &'static str),
    /// A cross-field invariant does not hold.
    ///
    /// The first parameter is the entity, the second describes the violated invariant.
    #[error("{0}: {1}")]
    Consistency(String, String),
    /// Unrecognized discriminant.
    ///
    /// The first parameter is what was being selected, the second the value that was given.
    #[error("unrecognized {0}: {1}")]
    UnknownVariant(&'static str, String),
    /// A required field is absent from a document.
    #[error("missing field `{0}`")]
    MissingField(String),
}

impl SettingsError {
    pub(crate) fn shape(entity: impl Into<String>, message: impl Into<String>) -> Self {
        SettingsError::Shape(entity.into(), message.into())
    }

    pub(crate) fn range(field: impl Into<String>, value: impl ToString) -> Self {
        SettingsError::Range(field.into(), value.to_string())
    }

    pub(crate) fn consistency(entity: impl Into<String>, message: impl Into<String>) -> Self {
        SettingsError::Consistency(entity.into(), message.into())
    }
}

/// Errors that can be returned when persisting or loading an interchange file
#[cfg(feature = "hdf5")]
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FileError {
    /// Failed to open or create the file.
    ///
    /// The first parameter is the file, the second parameter is the error the hdf5 crate returned.
    #[error("Could not open `{0}`")]
    Open(std::path::PathBuf, #[source] hdf5::Error),
    /// Failed to read a group or dataset.
    ///
    /// The first parameter is the path inside the file.
    #[error("Could not read `{0}` from interchange file")]
    Read(String, #[source] hdf5::Error),
    /// Failed to write a group or dataset.
    ///
    /// The first parameter is the path inside the file.
    #[error("Could not write `{0}` to interchange file")]
    Write(String, #[source] hdf5::Error),
    /// A dataset has a datatype that has no counterpart in the interchange document.
    #[error("Unsupported datatype for `{0}`")]
    UnsupportedType(String),
    /// The document itself is invalid
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
