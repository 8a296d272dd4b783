//! Codec configuration.

use std::time::Duration;

use cookieseal_crypto::MacAlgorithm;

/// Default maximum token age (30 days)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(86_400 * 30);

/// Default maximum token length in bytes, sized to fit a browser cookie
pub const DEFAULT_MAX_LENGTH: usize = 4096;

/// Default tolerance for timestamps ahead of the local clock
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Validity window, size limit and MAC choice for a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Tokens older than this are rejected. Zero disables the check.
    pub max_age: Duration,
    /// Tokens younger than this are rejected. Zero disables the check.
    pub min_age: Duration,
    /// How far a timestamp may be ahead of the local clock
    pub clock_skew: Duration,
    /// Longest accepted token in bytes, checked on encode and decode. Zero
    /// disables the check.
    pub max_length: usize,
    /// MAC used for token tags
    pub mac: MacAlgorithm,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            min_age: Duration::ZERO,
            clock_skew: DEFAULT_CLOCK_SKEW,
            max_length: DEFAULT_MAX_LENGTH,
            mac: MacAlgorithm::HmacSha256,
        }
    }
}

impl CodecConfig {
    /// `max_age` in whole seconds, saturated to `i64`.
    pub(crate) fn max_age_secs(&self) -> i64 {
        i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX)
    }

    /// `min_age` in whole seconds, saturated to `i64`.
    pub(crate) fn min_age_secs(&self) -> i64 {
        i64::try_from(self.min_age.as_secs()).unwrap_or(i64::MAX)
    }

    /// `clock_skew` in whole seconds, saturated to `i64`.
    pub(crate) fn clock_skew_secs(&self) -> i64 {
        i64::try_from(self.clock_skew.as_secs()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CodecConfig::default();

        assert_eq!(config.max_age, Duration::from_secs(2_592_000));
        assert_eq!(config.min_age, Duration::ZERO);
        assert_eq!(config.max_length, 4096);
        assert_eq!(config.mac, MacAlgorithm::HmacSha256);
    }

    #[test]
    fn huge_durations_saturate() {
        let config = CodecConfig { max_age: Duration::MAX, ..CodecConfig::default() };
        assert_eq!(config.max_age_secs(), i64::MAX);
    }
}
