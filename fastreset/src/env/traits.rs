use serde_json::Value;

use crate::env::errors::EnvError;
use crate::env::types::{InventoryItem, Position, StartPosition, Weather};

/// `(obs, reward, done, info)` as returned by a step or a command.
pub type StepResult<O, I> = (O, f32, bool, I);

pub trait Env: Send {
    type Obs: Send + Clone + 'static;
    type Act: Send + Clone + 'static;
    type Info: Send + Clone + 'static;

    fn reset(&mut self) -> Result<Self::Obs, EnvError>;
    fn step(&mut self, act: Self::Act) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;
    fn close(&mut self) -> Result<(), EnvError>;
}

/// Capability surface of a Minecraft simulation that can be driven by
/// in-game commands.
///
/// Every operation blocks until the simulation has applied it and returns
/// the resulting step, just like [`Env::step`].
pub trait MinecraftSim: Env<Obs: Observation> {
    /// Run a raw console command such as `/time set 0`.
    fn execute_cmd(
        &mut self,
        command: &str,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    fn start_time(&self) -> Option<u64>;
    fn initial_weather(&self) -> Option<Weather>;
    fn initial_inventory(&self) -> Option<Vec<InventoryItem>>;
    fn start_position(&self) -> Option<StartPosition>;
    fn start_health(&self) -> f32;
    fn start_food(&self) -> u32;

    /// Spawn one mob per entry of `mobs`, positioned relative to the agent.
    fn spawn_mobs(
        &mut self,
        mobs: &[String],
        rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    /// Place one block per entry of `blocks`, positioned relative to the agent.
    fn set_block(
        &mut self,
        blocks: &[String],
        rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    fn clear_inventory(
        &mut self,
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    fn set_inventory(
        &mut self,
        items: &[InventoryItem],
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    fn teleport_agent(
        &mut self,
        pose: StartPosition,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    fn kill_agent(&mut self) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    fn set_time(&mut self, time: u64) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    fn set_weather(
        &mut self,
        weather: &Weather,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    /// Move the agent to a random spot at most `max_range` blocks away.
    fn random_teleport(
        &mut self,
        max_range: u32,
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError>;

    fn prev_obs(&self) -> Result<Option<Self::Obs>, EnvError>;
    fn prev_info(&self) -> Result<Option<Self::Info>, EnvError>;
    fn prev_action(&self) -> Result<Option<Self::Act>, EnvError>;
    fn is_terminated(&self) -> Result<bool, EnvError>;
}

/// Observations that carry the agent's location.
pub trait Observation {
    fn position(&self) -> Option<Position>;
}

// Observations shaped like `{"location_stats": {"pos": [x, y, z]}}`.
impl Observation for Value {
    fn position(&self) -> Option<Position> {
        let pos = self.get("location_stats")?.get("pos")?.as_array()?;
        match pos.as_slice() {
            [x, y, z] => Some(Position::new(x.as_f64()?, y.as_f64()?, z.as_f64()?)),
            _ => None,
        }
    }
}
