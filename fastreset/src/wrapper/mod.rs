mod config;
mod errors;
mod fast_reset;

pub use config::{
    DEFAULT_TELEPORT_RANGE_HIGH, DEFAULT_TELEPORT_RANGE_LOW, FastResetConfig, TeleportRange,
};
pub use errors::FastResetError;
pub use fast_reset::{FastReset, LEAVES_RESPREAD_ATTEMPTS};
