#![allow(dead_code)]

use fastreset::env::{
    Env, EnvError, InventoryItem, MAX_FOOD, MAX_LIFE, MinecraftSim, StartPosition, StepResult,
    Weather,
};
use serde_json::{Value, json};

pub const SPAWN: [f64; 3] = [0.5, 64.0, 0.5];

/// Simulation double that records every command and moves the agent the
/// way the real server roughly would.
pub struct RecordingSim {
    pub pos: [f64; 3],
    pub commands: Vec<String>,
    pub calls: Vec<String>,
    pub full_resets: usize,
    pub start_time: Option<u64>,
    pub weather: Option<Weather>,
    pub inventory: Option<Vec<InventoryItem>>,
    pub start_position: Option<StartPosition>,
    pub start_health: f32,
    pub start_food: u32,
    /// Commands starting with this prefix fail.
    pub fail_on: Option<String>,
    /// How many leaves checks find leaves and nudge the agent.
    pub leaves_hits: usize,
    /// Observations lack a location.
    pub blind: bool,
}

impl RecordingSim {
    pub fn new() -> Self {
        Self {
            pos: SPAWN,
            commands: Vec::new(),
            calls: Vec::new(),
            full_resets: 0,
            start_time: None,
            weather: None,
            inventory: None,
            start_position: None,
            start_health: MAX_LIFE,
            start_food: MAX_FOOD,
            fail_on: None,
            leaves_hits: 0,
            blind: false,
        }
    }

    pub fn obs(&self) -> Value {
        if self.blind {
            return json!({"rgb": []});
        }
        json!({"location_stats": {"pos": self.pos}, "commands_seen": self.commands.len()})
    }

    fn info(&self) -> Value {
        json!({"commands_seen": self.commands.len(), "stats": {"mine_block": 3}})
    }

    fn step_result(&self) -> StepResult<Value, Value> {
        (self.obs(), 0.0, false, self.info())
    }

    fn record(&mut self, call: impl Into<String>) -> Result<StepResult<Value, Value>, EnvError> {
        self.calls.push(call.into());
        Ok(self.step_result())
    }

    fn apply(&mut self, command: &str) {
        let tokens: Vec<&str> = command.split_whitespace().collect();
        match tokens.as_slice() {
            ["/spreadplayers", x, z, distance, ..] => {
                let (x, z, d): (f64, f64, f64) = (
                    x.parse().unwrap(),
                    z.parse().unwrap(),
                    distance.parse().unwrap(),
                );
                self.pos = [x + d, 70.0, z];
            }
            ["/execute", ..] => {
                if self.leaves_hits > 0 {
                    self.leaves_hits -= 1;
                    self.pos[0] += 1.0;
                }
            }
            ["/tp", "@p", x, y, z, ..] | ["/tp", x, y, z, "~", "~"] => {
                self.pos = [x.parse().unwrap(), y.parse().unwrap(), z.parse().unwrap()];
            }
            _ => {}
        }
    }
}

impl Env for RecordingSim {
    type Obs = Value;
    type Act = String;
    type Info = Value;

    fn reset(&mut self) -> Result<Self::Obs, EnvError> {
        self.full_resets += 1;
        self.pos = SPAWN;
        Ok(self.obs())
    }

    fn step(&mut self, act: Self::Act) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record(format!("step {act}"))
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.calls.push("close".to_string());
        Ok(())
    }
}

impl MinecraftSim for RecordingSim {
    fn execute_cmd(
        &mut self,
        command: &str,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        if let Some(prefix) = &self.fail_on {
            if command.starts_with(prefix.as_str()) {
                return Err(EnvError::Command {
                    command: command.to_string(),
                    reason: "server rejected command".to_string(),
                });
            }
        }
        self.commands.push(command.to_string());
        self.apply(command);
        Ok(self.step_result())
    }

    fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    fn initial_weather(&self) -> Option<Weather> {
        self.weather.clone()
    }

    fn initial_inventory(&self) -> Option<Vec<InventoryItem>> {
        self.inventory.clone()
    }

    fn start_position(&self) -> Option<StartPosition> {
        self.start_position
    }

    fn start_health(&self) -> f32 {
        self.start_health
    }

    fn start_food(&self) -> u32 {
        self.start_food
    }

    fn spawn_mobs(
        &mut self,
        mobs: &[String],
        _rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record(format!("spawn_mobs {}", mobs.join(",")))
    }

    fn set_block(
        &mut self,
        blocks: &[String],
        _rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record(format!("set_block {}", blocks.join(",")))
    }

    fn clear_inventory(
        &mut self,
        _action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record("clear_inventory")
    }

    fn set_inventory(
        &mut self,
        items: &[InventoryItem],
        _action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record(format!("set_inventory {}", items.len()))
    }

    fn teleport_agent(
        &mut self,
        pose: StartPosition,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        let at = pose.position();
        self.pos = [at.x, at.y, at.z];
        self.record("teleport_agent")
    }

    fn kill_agent(&mut self) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record("kill_agent")
    }

    fn set_time(&mut self, time: u64) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record(format!("set_time {time}"))
    }

    fn set_weather(
        &mut self,
        weather: &Weather,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record(format!("set_weather {weather}"))
    }

    fn random_teleport(
        &mut self,
        max_range: u32,
        _action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.record(format!("random_teleport {max_range}"))
    }

    fn prev_obs(&self) -> Result<Option<Self::Obs>, EnvError> {
        Ok(Some(self.obs()))
    }

    fn prev_info(&self) -> Result<Option<Self::Info>, EnvError> {
        Ok(Some(self.info()))
    }

    fn prev_action(&self) -> Result<Option<Self::Act>, EnvError> {
        Ok(None)
    }

    fn is_terminated(&self) -> Result<bool, EnvError> {
        Ok(false)
    }
}

/// Distance argument of a `/spreadplayers` command.
pub fn spread_distance(command: &str) -> f64 {
    let tokens: Vec<&str> = command.split_whitespace().collect();
    assert_eq!(tokens[0], "/spreadplayers", "not a spread command: {command}");
    tokens[3].parse().unwrap()
}
