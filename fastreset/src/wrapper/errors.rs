use thiserror::Error;

use crate::env::{EnvError, InventorySlot};

#[derive(Error, Debug)]
pub enum FastResetError {
    #[error(
        "invalid teleport range [{low}, {high}): bounds must be non-negative and low < high"
    )]
    InvalidTeleportRange { low: f64, high: f64 },

    #[error("inventory slot {0:?} has no command form")]
    InvalidSlot(InventorySlot),

    #[error("observation after `{command}` carries no agent position")]
    MissingPosition { command: String },

    #[error(transparent)]
    Env(#[from] EnvError),
}

impl From<FastResetError> for EnvError {
    fn from(err: FastResetError) -> Self {
        match err {
            FastResetError::Env(inner) => inner,
            other => EnvError::EnvError(Box::new(other)),
        }
    }
}
