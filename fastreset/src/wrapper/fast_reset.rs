use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::config::{FastResetConfig, TeleportRange};
use super::errors::FastResetError;
use crate::commands::{CommandSequence, ResetCommand, Spread};
use crate::env::{
    Env, EnvError, InventoryItem, MAX_FOOD, MAX_LIFE, MinecraftSim, Observation, Position,
    StartPosition, StepResult, Weather,
};

/// Number of times the leaves re-spread command is issued after a spread.
pub const LEAVES_RESPREAD_ATTEMPTS: usize = 20;

/// Resets episodes with console commands instead of regenerating the world.
///
/// The first [`reset`](FastReset::reset) performs a full reset of the wrapped
/// simulation. Every later one kills the agent, restores time, weather and
/// inventory, optionally clears mobs and items, and can spread the agent to a
/// random spot around its initial position.
///
/// Changes to the world itself (mined blocks, placed blocks) survive a fast
/// reset. So do statistics and achievements: diff against
/// [`info_prev_reset`](FastReset::info_prev_reset) when scoring on them.
pub struct FastReset<E: MinecraftSim> {
    env: E,
    reset_cmds: CommandSequence,
    teleport_range: TeleportRange,
    randomizes_spawn: bool,
    server_started: bool,
    init_position: Option<Position>,
    birth_position: Option<Position>,
    info_prev_reset: Option<E::Info>,
    rng: ChaCha8Rng,
}

impl<E: MinecraftSim> FastReset<E> {
    pub fn new(env: E, config: FastResetConfig) -> Result<Self, FastResetError> {
        let teleport_range = config.teleport_range()?;
        let randomizes_spawn = config.randomizes_spawn();

        let (health, food) = (env.start_health(), env.start_food());
        if health != MAX_LIFE || food != MAX_FOOD {
            warn!(
                health,
                food,
                "non-default start health/food only apply to the first reset under fast reset"
            );
        }

        let mut reset_cmds = CommandSequence::new();
        reset_cmds.push(ResetCommand::SetTime(env.start_time().unwrap_or(0)));
        reset_cmds.push(ResetCommand::SetWeather(
            env.initial_weather().unwrap_or_default(),
        ));
        for item in env.initial_inventory().unwrap_or_default() {
            let command =
                ResetCommand::replace_item(&item).ok_or(FastResetError::InvalidSlot(item.slot))?;
            reset_cmds.push(command);
        }

        let start_position = env.start_position();
        if let Some(start) = start_position {
            reset_cmds.push(ResetCommand::TeleportToStart(start));
        }
        if config.clear_ground {
            reset_cmds.push(ResetCommand::KillNonPlayers);
            reset_cmds.push(ResetCommand::KillItems);
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        debug!(
            commands = reset_cmds.len(),
            low = teleport_range.low(),
            high = teleport_range.high(),
            randomizes_spawn,
            seed,
            "fast reset configured"
        );

        Ok(Self {
            env,
            reset_cmds,
            teleport_range,
            randomizes_spawn,
            server_started: false,
            init_position: start_position.map(|start| start.position()),
            birth_position: None,
            info_prev_reset: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Starts a new episode and returns its first observation.
    ///
    /// `move_flag` asks for a random spawn; it is ignored when no teleport
    /// range was configured.
    pub fn reset(&mut self, move_flag: bool) -> Result<E::Obs, FastResetError> {
        let move_flag = move_flag && self.randomizes_spawn;

        if !self.server_started {
            info!("first reset, generating world");
            let obs = self.env.reset()?;
            self.server_started = true;
            return Ok(obs);
        }

        info!(commands = self.reset_cmds.len(), move_flag, "fast reset");
        let first = self.reset_cmds.first();
        let (mut obs, mut info) = issue(&mut self.env, first)?;
        let center = match self.init_position {
            Some(center) => center,
            None => {
                let center = locate(&obs, first)?;
                debug!(x = center.x, y = center.y, z = center.z, "init position recorded");
                self.init_position = Some(center);
                center
            }
        };
        for command in self.reset_cmds.rest() {
            (obs, info) = issue(&mut self.env, command)?;
        }

        if let Some(birth) = self.birth_position {
            (obs, info) = issue(&mut self.env, &ResetCommand::TeleportTo(birth))?;
        }

        if move_flag && self.teleport_range.high() > 0.0 {
            let distance = self.teleport_range.sample(&mut self.rng);
            let spread = Spread::around(center, distance);
            info!(distance, x = spread.center_x, z = spread.center_z, "spreading agent");

            (obs, info) = issue(&mut self.env, &ResetCommand::SpreadPlayers(spread))?;
            // best effort: the same spread is retried a fixed number of times
            let respread = ResetCommand::RespreadOffLeaves(spread);
            for _ in 0..LEAVES_RESPREAD_ATTEMPTS {
                (obs, info) = issue(&mut self.env, &respread)?;
            }

            let birth = locate(&obs, &respread)?;
            debug!(x = birth.x, y = birth.y, z = birth.z, "new birth position");
            self.birth_position = Some(birth);
        }

        self.info_prev_reset = Some(info);
        Ok(obs)
    }

    pub fn reset_commands(&self) -> &CommandSequence {
        &self.reset_cmds
    }

    pub fn teleport_range(&self) -> TeleportRange {
        self.teleport_range
    }

    /// Whether `reset(true)` actually moves the agent.
    pub fn randomizes_spawn(&self) -> bool {
        self.randomizes_spawn
    }

    pub fn server_started(&self) -> bool {
        self.server_started
    }

    pub fn init_position(&self) -> Option<Position> {
        self.init_position
    }

    pub fn birth_position(&self) -> Option<Position> {
        self.birth_position
    }

    /// Info observed at the end of the last fast reset.
    pub fn info_prev_reset(&self) -> Option<&E::Info> {
        self.info_prev_reset.as_ref()
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn into_inner(self) -> E {
        self.env
    }
}

fn issue<E: MinecraftSim>(
    env: &mut E,
    command: &ResetCommand,
) -> Result<(E::Obs, E::Info), EnvError> {
    let command = command.to_string();
    debug!(%command, "issuing reset command");
    let (obs, _, _, info) = env.execute_cmd(&command)?;
    Ok((obs, info))
}

fn locate<O: Observation>(obs: &O, after: &ResetCommand) -> Result<Position, FastResetError> {
    obs.position().ok_or_else(|| FastResetError::MissingPosition {
        command: after.to_string(),
    })
}

impl<E: MinecraftSim> Env for FastReset<E> {
    type Obs = E::Obs;
    type Act = E::Act;
    type Info = E::Info;

    fn reset(&mut self) -> Result<Self::Obs, EnvError> {
        Ok(FastReset::reset(self, true)?)
    }

    fn step(&mut self, act: Self::Act) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.step(act)
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.env.close()
    }
}

impl<E: MinecraftSim> MinecraftSim for FastReset<E> {
    fn execute_cmd(
        &mut self,
        command: &str,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.execute_cmd(command)
    }

    fn start_time(&self) -> Option<u64> {
        self.env.start_time()
    }

    fn initial_weather(&self) -> Option<Weather> {
        self.env.initial_weather()
    }

    fn initial_inventory(&self) -> Option<Vec<InventoryItem>> {
        self.env.initial_inventory()
    }

    fn start_position(&self) -> Option<StartPosition> {
        self.env.start_position()
    }

    fn start_health(&self) -> f32 {
        self.env.start_health()
    }

    fn start_food(&self) -> u32 {
        self.env.start_food()
    }

    fn spawn_mobs(
        &mut self,
        mobs: &[String],
        rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.spawn_mobs(mobs, rel_positions)
    }

    fn set_block(
        &mut self,
        blocks: &[String],
        rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.set_block(blocks, rel_positions)
    }

    fn clear_inventory(
        &mut self,
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.clear_inventory(action)
    }

    fn set_inventory(
        &mut self,
        items: &[InventoryItem],
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.set_inventory(items, action)
    }

    fn teleport_agent(
        &mut self,
        pose: StartPosition,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.teleport_agent(pose)
    }

    fn kill_agent(&mut self) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.kill_agent()
    }

    fn set_time(&mut self, time: u64) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.set_time(time)
    }

    fn set_weather(
        &mut self,
        weather: &Weather,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.set_weather(weather)
    }

    fn random_teleport(
        &mut self,
        max_range: u32,
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.env.random_teleport(max_range, action)
    }

    fn prev_obs(&self) -> Result<Option<Self::Obs>, EnvError> {
        self.env.prev_obs()
    }

    fn prev_info(&self) -> Result<Option<Self::Info>, EnvError> {
        self.env.prev_info()
    }

    fn prev_action(&self) -> Result<Option<Self::Act>, EnvError> {
        self.env.prev_action()
    }

    fn is_terminated(&self) -> Result<bool, EnvError> {
        self.env.is_terminated()
    }
}
