//! Small numeric helpers shared by the thermal profiles, the painter and the tests.

/// Assert that the percentage deviation between two values stays below a threshold
///
/// Calculates the percentage deviation of `actual` from `expected` and panics
/// when it reaches `max_deviation`.
#[macro_export]
macro_rules! assert_deviation {
    ($actual:expr, $expected:expr, $max_deviation:expr) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, actual_val, expected_val
                );
            }
        }
    };
    ($actual:expr, $expected:expr, $max_deviation:expr, $($arg:tt)+) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%: {}\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, format_args!($($arg)+), actual_val, expected_val
                );
            }
        }
    };
}

/// Linear interpolation between two values
///
/// # Examples
/// ```
/// use geo_model_setup::math_utils::lerp;
///
/// // Temperature halfway down a 100 km box
/// assert_eq!(lerp(20.0, 1220.0, 0.5), 620.0);
/// ```
pub fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

/// Inverse linear interpolation - the ratio that makes `lerp(a, b, ratio) == value`
///
/// Returns 0.0 for a degenerate range.
///
/// # Examples
/// ```
/// use geo_model_setup::math_utils::inverse_lerp;
///
/// assert_eq!(inverse_lerp(0.0, 80.0, 20.0), 0.25);
/// ```
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Inclusive range test.
pub fn within(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

/// Calculate the percentage deviation of `actual` from `expected`
///
/// # Examples
/// ```
/// use geo_model_setup::math_utils::deviation;
///
/// assert_eq!(deviation(105.0, 100.0), 5.0);
/// assert_eq!(deviation(95.0, 100.0), 5.0);
/// ```
pub fn deviation(actual: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        if actual.abs() < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        ((actual - expected).abs() / expected.abs()) * 100.0
    }
}
