//! Runs a few short episodes against a toy flat world, fast-resetting
//! between them with a random spawn up to 300 blocks away.
//!
//! `RUST_LOG=fastreset=debug cargo run --example episodes` shows every
//! command issued.

use fastreset::env::{InventoryItem, MAX_FOOD, MAX_LIFE, StartPosition, StepResult, Weather};
use fastreset::{Env, EnvError, FastReset, FastResetConfig, MinecraftSim, Observation};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

const EPISODES: usize = 5;
const STEPS_PER_EPISODE: usize = 30;

/// Flat world at y=4 where spreads land exactly `distance` blocks east.
struct FlatWorld {
    pos: [f64; 3],
    steps: usize,
}

impl FlatWorld {
    fn new() -> Self {
        Self {
            pos: [0.5, 4.0, 0.5],
            steps: 0,
        }
    }

    fn result(&self) -> StepResult<Value, Value> {
        let obs = json!({"location_stats": {"pos": self.pos}});
        (obs, 0.0, false, json!({"steps": self.steps}))
    }
}

impl Env for FlatWorld {
    type Obs = Value;
    type Act = i64;
    type Info = Value;

    fn reset(&mut self) -> Result<Self::Obs, EnvError> {
        *self = Self::new();
        Ok(self.result().0)
    }

    fn step(&mut self, act: Self::Act) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.steps += 1;
        self.pos[2] += act as f64 * 0.1;
        let (obs, reward, _, info) = self.result();
        Ok((obs, reward, self.steps % 50 == 0, info))
    }

    fn close(&mut self) -> Result<(), EnvError> {
        Ok(())
    }
}

impl MinecraftSim for FlatWorld {
    fn execute_cmd(
        &mut self,
        command: &str,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        let tokens: Vec<&str> = command.split_whitespace().collect();
        let num = |s: &str| {
            s.parse::<f64>().map_err(|e| EnvError::Command {
                command: command.to_string(),
                reason: e.to_string(),
            })
        };
        match tokens.as_slice() {
            ["/spreadplayers", x, z, distance, ..] => {
                self.pos = [num(*x)? + num(*distance)?, 4.0, num(*z)?];
            }
            ["/tp", x, y, z, "~", "~"] => self.pos = [num(*x)?, num(*y)?, num(*z)?],
            _ => {}
        }
        Ok(self.result())
    }

    fn start_time(&self) -> Option<u64> {
        Some(6000)
    }

    fn initial_weather(&self) -> Option<Weather> {
        Some(Weather::Clear)
    }

    fn initial_inventory(&self) -> Option<Vec<InventoryItem>> {
        None
    }

    fn start_position(&self) -> Option<StartPosition> {
        None
    }

    fn start_health(&self) -> f32 {
        MAX_LIFE
    }

    fn start_food(&self) -> u32 {
        MAX_FOOD
    }

    fn spawn_mobs(
        &mut self,
        _mobs: &[String],
        _rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Ok(self.result())
    }

    fn set_block(
        &mut self,
        _blocks: &[String],
        _rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Ok(self.result())
    }

    fn clear_inventory(
        &mut self,
        _action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Ok(self.result())
    }

    fn set_inventory(
        &mut self,
        _items: &[InventoryItem],
        _action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Ok(self.result())
    }

    fn teleport_agent(
        &mut self,
        pose: StartPosition,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        let at = pose.position();
        self.pos = [at.x, at.y, at.z];
        Ok(self.result())
    }

    fn kill_agent(&mut self) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.execute_cmd("/kill")
    }

    fn set_time(&mut self, time: u64) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.execute_cmd(&format!("/time set {time}"))
    }

    fn set_weather(
        &mut self,
        weather: &Weather,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.execute_cmd(&format!("/weather {weather}"))
    }

    fn random_teleport(
        &mut self,
        max_range: u32,
        _action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.pos[0] += f64::from(max_range) / 2.0;
        Ok(self.result())
    }

    fn prev_obs(&self) -> Result<Option<Self::Obs>, EnvError> {
        Ok(Some(self.result().0))
    }

    fn prev_info(&self) -> Result<Option<Self::Info>, EnvError> {
        Ok(Some(self.result().3))
    }

    fn prev_action(&self) -> Result<Option<Self::Act>, EnvError> {
        Ok(None)
    }

    fn is_terminated(&self) -> Result<bool, EnvError> {
        Ok(false)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = FastResetConfig {
        random_teleport_range_low: Some(0.0),
        random_teleport_range_high: Some(300.0),
        seed: Some(7),
        ..FastResetConfig::default()
    };
    let mut env = FastReset::new(FlatWorld::new(), config)?;

    env.reset(true)?;
    for episode in 0..EPISODES {
        for _ in 0..STEPS_PER_EPISODE {
            let (_, _, done, _) = env.step(1)?;
            if done {
                break;
            }
        }
        let obs = env.reset(true)?;
        println!("episode {episode}: respawned at {:?}", obs.position());
    }
    env.close()?;

    println!("birth position: {:?}", env.birth_position());
    Ok(())
}
