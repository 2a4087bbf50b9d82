//! Zoom level to simplification tolerance mapping.

/// Tolerance used when no zoom level is supplied, in degrees.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Tolerance for zoom levels at or below [`COARSEST_ZOOM`].
pub const COARSEST_TOLERANCE: f64 = 0.05;

/// Tolerance for zoom levels at or above [`FINEST_ZOOM`].
pub const FINEST_TOLERANCE: f64 = 0.000_05;

/// Highest zoom level that still receives the coarsest tolerance.
pub const COARSEST_ZOOM: i32 = 5;

/// Lowest zoom level that receives the finest tolerance.
pub const FINEST_ZOOM: i32 = 16;

const STEPS: [(i32, f64); 10] = [
    (6, 0.03),
    (7, 0.02),
    (8, 0.01),
    (9, 0.005),
    (10, 0.003),
    (11, 0.002),
    (12, 0.001),
    (13, 0.000_5),
    (14, 0.000_3),
    (15, 0.000_1),
];

/// Map a map zoom level to a simplification tolerance in degrees.
///
/// The curve is non-increasing: higher zoom levels show more detail and so
/// tolerate less deviation.
///
/// # Examples
///
/// ```
/// use boundary_core::tolerance_for_zoom;
///
/// assert_eq!(tolerance_for_zoom(None), 0.01);
/// assert_eq!(tolerance_for_zoom(Some(3)), 0.05);
/// assert_eq!(tolerance_for_zoom(Some(10)), 0.003);
/// assert_eq!(tolerance_for_zoom(Some(18)), 0.00005);
/// ```
#[must_use]
pub fn tolerance_for_zoom(zoom_level: Option<i32>) -> f64 {
    let Some(zoom) = zoom_level else {
        return DEFAULT_TOLERANCE;
    };
    if zoom <= COARSEST_ZOOM {
        return COARSEST_TOLERANCE;
    }
    if zoom >= FINEST_ZOOM {
        return FINEST_TOLERANCE;
    }
    STEPS
        .iter()
        .find(|(level, _)| *level == zoom)
        .map_or(DEFAULT_TOLERANCE, |(_, tolerance)| *tolerance)
}
