//! Capacity accounting.
//!
//! Translates filesystem statistics and the configured watermarks into a
//! per-mountpath byte budget: how much must go for usage to fall back to
//! the low watermark.

use ostor_fs::FsStats;

const MIB: i64 = 1024 * 1024;

/// Budgets below this are not worth an eviction pass.
pub const MIN_EVICT_THRESH: i64 = 10 * MIB;

/// Freed bytes between capacity/config/throttle recomputations.
pub const CAP_CHECK_THRESH: i64 = 256 * MIB;

/// Bytes to reclaim on a mountpath, or 0 when usage sits below the high
/// watermark.
pub fn evict_size(stats: &FsStats, low_wm: i64, high_wm: i64) -> i64 {
    if stats.blocks == 0 {
        return 0;
    }
    let used = stats.blocks - stats.bavail.min(stats.blocks);
    let used_pct = (used * 100 / stats.blocks) as i64;
    if used_pct < high_wm {
        return 0;
    }
    let lwm_blocks = stats.blocks * low_wm.clamp(0, 100) as u64 / 100;
    used.saturating_sub(lwm_blocks) as i64 * stats.bsize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(blocks: u64, bavail: u64, bsize: i64) -> FsStats {
        FsStats {
            blocks,
            bavail,
            bsize,
        }
    }

    #[test]
    fn test_below_high_watermark_is_zero() {
        // 40% used, high watermark 80.
        assert_eq!(evict_size(&stats(1000, 600, 4096), 70, 80), 0);
        // Exactly one percent under.
        assert_eq!(evict_size(&stats(1000, 210, 4096), 70, 80), 0);
    }

    #[test]
    fn test_budget_reaches_low_watermark() {
        // 85% used on 1000 blocks of 4KiB, watermarks 70/80:
        // must free (850 - 700) blocks.
        let budget = evict_size(&stats(1000, 150, 4096), 70, 80);
        assert_eq!(budget, 150 * 4096);
    }

    #[test]
    fn test_full_filesystem() {
        let budget = evict_size(&stats(1000, 0, 512), 70, 80);
        assert_eq!(budget, 300 * 512);
    }

    #[test]
    fn test_degenerate_stats() {
        assert_eq!(evict_size(&stats(0, 0, 4096), 70, 80), 0);
        // bavail larger than blocks (root-reserved skew): clamped.
        assert_eq!(evict_size(&stats(100, 200, 4096), 70, 80), 0);
    }
}
