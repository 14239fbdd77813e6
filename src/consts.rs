// Implementation constants:

/// Tolerance below which two points are considered to be at the same location.
pub const MAX_ABSOLUTE_DIFFERENCE: f64 = 1e-3;
