use crate::error::SettingsError;

/// Closed enumeration with a fixed integer representation in interchange documents.
///
/// `TABLE` is the single source of truth for the mapping in both directions.
pub trait WireEnum: Copy + PartialEq + Sized + 'static {
    /// What the discriminant selects, used in error messages
    const WHAT: &'static str;
    /// Every variant with its integer code
    const TABLE: &'static [(Self, i64)];

    /// Integer code written to interchange documents
    fn to_wire(self) -> i64 {
        Self::TABLE
            .iter()
            .find(|(variant, _)| *variant == self)
            .map(|&(_, code)| code)
            .unwrap_or_default()
    }

    /// Variant for an integer code read from an interchange document
    fn from_wire(code: i64) -> Result<Self, SettingsError> {
        Self::TABLE
            .iter()
            .find(|&&(_, c)| c == code)
            .map(|&(variant, _)| variant)
            .ok_or_else(|| SettingsError::UnknownVariant(Self::WHAT, code.to_string()))
    }
}
