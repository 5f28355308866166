mod errors;
mod traits;
mod types;

pub use errors::EnvError;
pub use traits::{Env, MinecraftSim, Observation, StepResult};
pub use types::{
    Coord, EquipmentSlot, InventoryItem, InventorySlot, MAX_FOOD, MAX_LIFE, ParseWeatherError, Position,
    StartPosition, Weather,
};
