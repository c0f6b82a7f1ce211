//! Type alias for row IDs in the application database.

/// Alias of the integer type used for database row IDs.
///
/// This type alias helps distinguish between IDs and other integer values.
pub type DatabaseId = i64;
