//! Eviction pacing.
//!
//! Eviction competes with the live workload for disk bandwidth. Once
//! usage falls under the high watermark the jogger compares how far it
//! has come capacity-wise against how loaded the disk is, and backs off
//! when the disk is the scarcer resource.

use std::time::Duration;

/// Pause inserted at every yield while the sticky throttle flag is set.
pub const THROTTLE_MIN: Duration = Duration::from_millis(10);

/// One-off pause when disk utilization outweighs capacity pressure.
pub const THROTTLE_MAX: Duration = Duration::from_millis(100);

/// Position of `curr` within `[low, high]`, clamped to `[0, 1]`.
pub fn ratio(high: i64, low: i64, curr: i64) -> f64 {
    if high <= low {
        return 1.0;
    }
    ((curr - low) as f64 / (high - low) as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation() {
        assert_eq!(ratio(80, 70, 75), 0.5);
        assert_eq!(ratio(80, 70, 70), 0.0);
        assert_eq!(ratio(80, 70, 80), 1.0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(ratio(80, 70, 50), 0.0);
        assert_eq!(ratio(80, 70, 99), 1.0);
    }

    #[test]
    fn test_degenerate_band() {
        assert_eq!(ratio(70, 70, 50), 1.0);
    }
}
