//! Result type alias for VitalStream

use super::errors::VitalStreamError;

/// Result type alias for VitalStream operations
///
/// # Examples
///
/// ```
/// use vitalstream::domain::result::Result;
/// use vitalstream::domain::errors::VitalStreamError;
///
/// fn failing_function() -> Result<()> {
///     Err(VitalStreamError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, VitalStreamError>;
