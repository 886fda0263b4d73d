use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Custody duration, in days, above which a vehicle is in alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Threshold(NonZeroU32);

impl Threshold {
    pub const DEFAULT_DAYS: u32 = 180;

    pub fn new(days: u32) -> Result<Self, ConfigError> {
        NonZeroU32::new(days)
            .map(Self)
            .ok_or(ConfigError::InvalidThreshold)
    }

    pub fn days(&self) -> u32 {
        self.0.get()
    }

    /// Strictly greater than: a vehicle at exactly the threshold is not in alert.
    pub fn is_exceeded_by(&self, custody_days: i64) -> bool {
        custody_days > i64::from(self.0.get())
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(NonZeroU32::new(Self::DEFAULT_DAYS).unwrap_or(NonZeroU32::MIN))
    }
}

impl TryFrom<u32> for Threshold {
    type Error = ConfigError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<Threshold> for u32 {
    fn from(t: Threshold) -> u32 {
        t.days()
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threshold_rejected() {
        assert_eq!(Threshold::new(0), Err(ConfigError::InvalidThreshold));
    }

    #[test]
    fn default_is_180_days() {
        assert_eq!(Threshold::default().days(), 180);
    }

    #[test]
    fn comparison_is_strict() {
        let t = Threshold::new(180).unwrap();
        assert!(!t.is_exceeded_by(180));
        assert!(t.is_exceeded_by(181));
        assert!(!t.is_exceeded_by(-5));
    }

    #[test]
    fn deserializes_from_integer() {
        let t: Threshold = serde_json::from_str("90").unwrap();
        assert_eq!(t.days(), 90);
        assert!(serde_json::from_str::<Threshold>("0").is_err());
    }
}
