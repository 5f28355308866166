use rand::Rng;
use serde::{Deserialize, Serialize};

use super::errors::FastResetError;

pub const DEFAULT_TELEPORT_RANGE_LOW: f64 = 0.0;
pub const DEFAULT_TELEPORT_RANGE_HIGH: f64 = 20.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FastResetConfig {
    pub random_teleport_range_low: Option<f64>,
    pub random_teleport_range_high: Option<f64>,
    /// Kill every non-player entity and dropped item on reset.
    pub clear_ground: bool,
    /// Seed for spawn randomization; drawn from entropy when unset.
    pub seed: Option<u64>,
}

impl Default for FastResetConfig {
    fn default() -> Self {
        Self {
            random_teleport_range_low: None,
            random_teleport_range_high: None,
            clear_ground: true,
            seed: None,
        }
    }
}

impl FastResetConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Spawn randomization is on as soon as either bound is given.
    pub fn randomizes_spawn(&self) -> bool {
        self.random_teleport_range_low.is_some() || self.random_teleport_range_high.is_some()
    }

    pub fn teleport_range(&self) -> Result<TeleportRange, FastResetError> {
        TeleportRange::new(
            self.random_teleport_range_low
                .unwrap_or(DEFAULT_TELEPORT_RANGE_LOW),
            self.random_teleport_range_high
                .unwrap_or(DEFAULT_TELEPORT_RANGE_HIGH),
        )
    }
}

/// Half-open interval `[low, high)` of spread distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeleportRange {
    low: f64,
    high: f64,
}

impl TeleportRange {
    pub fn new(low: f64, high: f64) -> Result<Self, FastResetError> {
        let valid = low.is_finite() && high.is_finite() && low >= 0.0 && low < high;
        if !valid {
            return Err(FastResetError::InvalidTeleportRange { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.low..self.high)
    }
}

impl Default for TeleportRange {
    fn default() -> Self {
        Self {
            low: DEFAULT_TELEPORT_RANGE_LOW,
            high: DEFAULT_TELEPORT_RANGE_HIGH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn unset_bounds_fall_back_to_defaults() {
        let config = FastResetConfig::default();
        assert!(!config.randomizes_spawn());
        assert_eq!(config.teleport_range().unwrap(), TeleportRange::default());

        let config = FastResetConfig {
            random_teleport_range_high: Some(300.0),
            ..Default::default()
        };
        assert!(config.randomizes_spawn());
        let range = config.teleport_range().unwrap();
        assert_eq!((range.low(), range.high()), (0.0, 300.0));

        let config = FastResetConfig {
            random_teleport_range_low: Some(5.0),
            ..Default::default()
        };
        let range = config.teleport_range().unwrap();
        assert_eq!((range.low(), range.high()), (5.0, 20.0));
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(TeleportRange::new(10.0, 10.0).is_err());
        assert!(TeleportRange::new(20.0, 10.0).is_err());
        assert!(TeleportRange::new(-1.0, 10.0).is_err());
        assert!(TeleportRange::new(0.0, -1.0).is_err());
        assert!(TeleportRange::new(0.0, f64::INFINITY).is_err());
        assert!(TeleportRange::new(f64::NAN, 1.0).is_err());

        // low defaults to 0, so a lone high of 0 is empty
        let config = FastResetConfig {
            random_teleport_range_high: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            config.teleport_range(),
            Err(FastResetError::InvalidTeleportRange { .. })
        ));
    }

    #[test]
    fn config_from_json() {
        let config = FastResetConfig::from_json(
            r#"{"random_teleport_range_low": 0, "random_teleport_range_high": 300, "seed": 7}"#,
        )
        .unwrap();
        assert_eq!(config.random_teleport_range_high, Some(300.0));
        assert!(config.clear_ground);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn samples_stay_in_range() {
        let range = TeleportRange::new(3.0, 4.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let d = range.sample(&mut rng);
            assert!((3.0..4.0).contains(&d));
        }
    }
}
