mod support;

use fastreset::{FastReset, FastResetConfig};
use proptest::prelude::*;
use support::{RecordingSim, spread_distance};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn spread_distance_stays_in_range(
        low in 0.0f64..500.0,
        width in 0.001f64..500.0,
        seed in any::<u64>(),
    ) {
        let high = low + width;
        prop_assume!(low < high);
        let config = FastResetConfig {
            random_teleport_range_low: Some(low),
            random_teleport_range_high: Some(high),
            clear_ground: false,
            seed: Some(seed),
        };
        let mut env = FastReset::new(RecordingSim::new(), config).unwrap();
        for _ in 0..4 {
            env.reset(true).unwrap();
        }

        let spreads: Vec<f64> = env
            .inner()
            .commands
            .iter()
            .filter(|c| c.starts_with("/spreadplayers"))
            .map(|c| spread_distance(c))
            .collect();
        prop_assert_eq!(spreads.len(), 3);
        for distance in spreads {
            prop_assert!(low <= distance && distance < high, "{} not in [{}, {})", distance, low, high);
        }
    }
}
