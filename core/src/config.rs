//! Node configuration.
//!
//! Watermarks and pacing knobs consumed by the eviction engine. Loaded from
//! a TOML file; durations accept strings like `"2h"` or `"30m"` as well as
//! bare seconds.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Node configuration relevant to capacity management.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// LRU eviction watermarks and guards
    #[serde(default)]
    pub lru: LruConfig,

    /// Disk utilization band used for throttling
    #[serde(default)]
    pub disk: DiskConfig,
}

/// LRU eviction configuration.
///
/// Eviction starts when a mountpath's used capacity exceeds `high_wm`
/// percent and runs until it falls to `low_wm` percent.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LruConfig {
    /// Used-capacity percentage at which eviction stops
    #[serde(default = "default_low_wm")]
    pub low_wm: i64,

    /// Used-capacity percentage at which eviction starts
    #[serde(default = "default_high_wm")]
    pub high_wm: i64,

    /// Minimum age before an object (or EC slice) may be touched.
    /// Guards in-flight writes whose metadata has not landed yet.
    #[serde(
        default = "default_dont_evict_time",
        deserialize_with = "deserialize_duration"
    )]
    pub dont_evict_time: Duration,
}

/// Disk utilization band.
///
/// The eviction throttle interpolates the current device utilization
/// within `[disk_util_low_wm, disk_util_high_wm]` to decide how hard to
/// back off in favor of the live workload.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiskConfig {
    /// Utilization percentage considered unloaded
    #[serde(default = "default_disk_util_low_wm")]
    pub disk_util_low_wm: i64,

    /// Utilization percentage considered saturated
    #[serde(default = "default_disk_util_high_wm")]
    pub disk_util_high_wm: i64,
}

impl Default for LruConfig {
    fn default() -> Self {
        Self {
            low_wm: default_low_wm(),
            high_wm: default_high_wm(),
            dont_evict_time: default_dont_evict_time(),
        }
    }
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            disk_util_low_wm: default_disk_util_low_wm(),
            disk_util_high_wm: default_disk_util_high_wm(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lru: LruConfig::default(),
            disk: DiskConfig::default(),
        }
    }
}

// Default value functions

fn default_low_wm() -> i64 {
    75
}

fn default_high_wm() -> i64 {
    90
}

fn default_dont_evict_time() -> Duration {
    Duration::from_secs(120 * 60)
}

fn default_disk_util_low_wm() -> i64 {
    20
}

fn default_disk_util_high_wm() -> i64 {
    80
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate watermark ordering and ranges.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        for (name, wm) in [
            ("lru.low_wm", self.lru.low_wm),
            ("lru.high_wm", self.lru.high_wm),
            ("disk.disk_util_low_wm", self.disk.disk_util_low_wm),
            ("disk.disk_util_high_wm", self.disk.disk_util_high_wm),
        ] {
            if !(0..=100).contains(&wm) {
                return Err(format!("{} ({}) must be a percentage in 0..=100", name, wm).into());
            }
        }

        if self.lru.low_wm >= self.lru.high_wm {
            return Err(format!(
                "lru.low_wm ({}) must be below lru.high_wm ({})",
                self.lru.low_wm, self.lru.high_wm
            )
            .into());
        }

        if self.disk.disk_util_low_wm >= self.disk.disk_util_high_wm {
            return Err(format!(
                "disk.disk_util_low_wm ({}) must be below disk.disk_util_high_wm ({})",
                self.disk.disk_util_low_wm, self.disk.disk_util_high_wm
            )
            .into());
        }

        Ok(())
    }
}

/// Deserialize a duration from either seconds or a string like "30m".
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DurationValue {
        Number(u64),
        String(String),
    }

    match DurationValue::deserialize(deserializer)? {
        DurationValue::Number(secs) => Ok(Duration::from_secs(secs)),
        DurationValue::String(s) => parse_duration(&s).map_err(D::Error::custom),
    }
}

/// Parse a duration string like "90s", "30m", "2h" into a [`Duration`].
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| c.is_alphabetic()) {
        Some(idx) => (&s[..idx], s[idx..].to_lowercase()),
        None => (s, String::new()),
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    let secs = match suffix.as_str() {
        "" | "s" | "sec" => num,
        "m" | "min" => num * 60,
        "h" | "hr" => num * 3600,
        "d" => num * 86400,
        "ms" => return Ok(Duration::from_millis(num)),
        _ => return Err(format!("unknown duration suffix: {}", suffix)),
    };

    Ok(Duration::from_secs(secs))
}

/// Format a byte count as a human-readable string.
pub fn format_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = 1024 * KB;
    const GB: i64 = 1024 * MB;

    let neg = bytes < 0;
    let b = bytes.unsigned_abs() as i64;
    let s = if b >= GB {
        format!("{:.2}GiB", b as f64 / GB as f64)
    } else if b >= MB {
        format!("{:.2}MiB", b as f64 / MB as f64)
    } else if b >= KB {
        format!("{:.2}KiB", b as f64 / KB as f64)
    } else {
        format!("{}B", b)
    };
    if neg { format!("-{}", s) } else { s }
}
