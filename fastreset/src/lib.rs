//! Fast episode resets for Minecraft reinforcement-learning environments.
//!
//! [`FastReset`] wraps any [`MinecraftSim`] and replaces the slow
//! world-regenerating reset with a short sequence of console commands,
//! optionally spreading the agent to a random spawn point.

pub mod commands;
pub mod env;
pub mod wrapper;

pub use commands::{CommandSequence, ResetCommand, Spread};
pub use env::{Env, EnvError, MinecraftSim, Observation, Position};
pub use wrapper::{FastReset, FastResetConfig, FastResetError, TeleportRange};
