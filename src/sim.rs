use std::collections::HashMap;

use fastreset::env::{
    Coord, Env, EnvError, EquipmentSlot, InventoryItem, InventorySlot, MAX_FOOD, MAX_LIFE, MinecraftSim,
    Observation, Position, StartPosition, StepResult, Weather,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyFloat};

/// A Python object passed through the Rust side untouched.
pub struct PyHandle(Py<PyAny>);

impl PyHandle {
    pub fn new(obj: Py<PyAny>) -> Self {
        Self(obj)
    }

    pub fn into_inner(self) -> Py<PyAny> {
        self.0
    }

    pub fn clone_ref(&self, py: Python<'_>) -> Py<PyAny> {
        self.0.clone_ref(py)
    }
}

impl Clone for PyHandle {
    fn clone(&self) -> Self {
        Python::with_gil(|py| Self(self.0.clone_ref(py)))
    }
}

// MineDojo observations keep the agent location in `obs["location_stats"]["pos"]`.
impl Observation for PyHandle {
    fn position(&self) -> Option<Position> {
        Python::with_gil(|py| {
            let pos = self
                .0
                .bind(py)
                .get_item("location_stats")
                .and_then(|stats| stats.get_item("pos"))
                .ok()?;
            // numpy arrays are not Python sequences
            let pos = match pos.hasattr("tolist") {
                Ok(true) => pos.call_method0("tolist").ok()?,
                _ => pos,
            };
            match pos.extract::<Vec<f64>>().ok()?.as_slice() {
                [x, y, z] => Some(Position::new(*x, *y, *z)),
                _ => None,
            }
        })
    }
}

/// Start configuration read once from the Python env.
struct Settings {
    start_time: Option<u64>,
    initial_weather: Option<Weather>,
    initial_inventory: Option<Vec<InventoryItem>>,
    start_position: Option<StartPosition>,
    start_health: f32,
    start_food: u32,
}

/// Python simulation object (a `MineDojoSim` or anything shaped like it).
pub struct PySim {
    env: Py<PyAny>,
    settings: Settings,
}

impl PySim {
    pub fn new(env: &Bound<'_, PyAny>) -> PyResult<Self> {
        let initial_weather = match optional_attr(env, "initial_weather")? {
            Some(weather) => Some(
                weather
                    .extract::<String>()?
                    .parse::<Weather>()
                    .map_err(|e| PyValueError::new_err(e.to_string()))?,
            ),
            None => None,
        };
        let initial_inventory = match optional_attr(env, "initial_inventory")? {
            Some(items) => Some(
                items
                    .try_iter()?
                    .map(|item| inventory_item(&item?))
                    .collect::<PyResult<Vec<_>>>()?,
            ),
            None => None,
        };
        let start_position = match optional_attr(env, "start_position")? {
            Some(pose) => Some(start_position(&pose)?),
            None => None,
        };
        let settings = Settings {
            start_time: optional_attr(env, "start_time")?
                .map(|t| t.extract())
                .transpose()?,
            initial_weather,
            initial_inventory,
            start_position,
            start_health: optional_attr(env, "start_health")?
                .map(|h| h.extract())
                .transpose()?
                .unwrap_or(MAX_LIFE),
            start_food: optional_attr(env, "start_food")?
                .map(|f| f.extract())
                .transpose()?
                .unwrap_or(MAX_FOOD),
        };
        Ok(Self {
            env: env.clone().unbind(),
            settings,
        })
    }

    pub fn object(&self) -> &Py<PyAny> {
        &self.env
    }
}

/// Attribute value, with both a missing attribute and `None` mapped to `None`.
fn optional_attr<'py>(obj: &Bound<'py, PyAny>, name: &str) -> PyResult<Option<Bound<'py, PyAny>>> {
    if !obj.hasattr(name)? {
        return Ok(None);
    }
    let value = obj.getattr(name)?;
    Ok((!value.is_none()).then_some(value))
}

/// Python ints stay integers so the start teleport renders them the same way.
fn coord(value: &Bound<'_, PyAny>) -> PyResult<Coord> {
    // numpy floats subclass `float`; numpy ints extract through `__index__`
    if value.is_instance_of::<PyFloat>() {
        return Ok(Coord::Float(value.extract()?));
    }
    match value.extract::<i64>() {
        Ok(v) => Ok(Coord::Int(v)),
        Err(_) => Ok(Coord::Float(value.extract()?)),
    }
}

fn coord_object<'py>(py: Python<'py>, coord: Coord) -> PyResult<Bound<'py, PyAny>> {
    Ok(match coord {
        Coord::Int(v) => v.into_pyobject(py)?.into_any(),
        Coord::Float(v) => v.into_pyobject(py)?.into_any(),
    })
}

fn start_position(pose: &Bound<'_, PyAny>) -> PyResult<StartPosition> {
    let pose: HashMap<String, Bound<'_, PyAny>> = pose.extract()?;
    let optional = |key: &str| pose.get(key).map(coord).transpose();
    let required = |key: &str| {
        optional(key)?
            .ok_or_else(|| PyValueError::new_err(format!("start_position is missing `{key}`")))
    };
    Ok(StartPosition {
        x: required("x")?,
        y: required("y")?,
        z: required("z")?,
        yaw: optional("yaw")?.unwrap_or_default(),
        pitch: optional("pitch")?.unwrap_or_default(),
    })
}

/// Reads an object with `slot`, `name`, `variant` and `quantity` attributes.
fn inventory_item(item: &Bound<'_, PyAny>) -> PyResult<InventoryItem> {
    let slot = item.getattr("slot")?;
    let slot = match slot.extract::<u32>() {
        Ok(index) => InventorySlot::Index(index),
        Err(_) => {
            let name: String = slot.extract()?;
            let equipment = name
                .parse::<EquipmentSlot>()
                .map_err(|_| PyValueError::new_err(format!("unknown inventory slot `{name}`")))?;
            InventorySlot::Equipment(equipment)
        }
    };
    Ok(InventoryItem {
        slot,
        name: item.getattr("name")?.extract()?,
        variant: item.getattr("variant")?.extract()?,
        quantity: item.getattr("quantity")?.extract()?,
    })
}

fn env_error(err: PyErr) -> EnvError {
    EnvError::EnvError(Box::new(err))
}

fn step_result(ret: Bound<'_, PyAny>) -> PyResult<StepResult<PyHandle, PyHandle>> {
    let (obs, reward, done, info): (Py<PyAny>, f32, bool, Py<PyAny>) = ret.extract()?;
    Ok((PyHandle(obs), reward, done, PyHandle(info)))
}

impl PySim {
    fn call0(&self, method: &str) -> Result<StepResult<PyHandle, PyHandle>, EnvError> {
        Python::with_gil(|py| step_result(self.env.bind(py).call_method0(method)?))
            .map_err(env_error)
    }

    fn read(&self, attr: &str) -> Result<Option<PyHandle>, EnvError> {
        Python::with_gil(|py| -> PyResult<Option<PyHandle>> {
            let value = self.env.bind(py).getattr(attr)?;
            Ok(if value.is_none() {
                None
            } else {
                Some(PyHandle(value.unbind()))
            })
        })
        .map_err(env_error)
    }
}

impl Env for PySim {
    type Obs = PyHandle;
    type Act = PyHandle;
    type Info = PyHandle;

    fn reset(&mut self) -> Result<Self::Obs, EnvError> {
        Python::with_gil(|py| -> PyResult<PyHandle> {
            let obs = self.env.bind(py).call_method0("reset")?;
            Ok(PyHandle(obs.unbind()))
        })
        .map_err(env_error)
    }

    fn step(&mut self, act: Self::Act) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Python::with_gil(|py| step_result(self.env.bind(py).call_method1("step", (act.0,))?))
            .map_err(env_error)
    }

    fn close(&mut self) -> Result<(), EnvError> {
        Python::with_gil(|py| self.env.bind(py).call_method0("close").map(drop))
            .map_err(env_error)
    }
}

impl MinecraftSim for PySim {
    fn execute_cmd(
        &mut self,
        command: &str,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Python::with_gil(|py| {
            step_result(self.env.bind(py).call_method1("execute_cmd", (command,))?)
        })
        .map_err(env_error)
    }

    fn start_time(&self) -> Option<u64> {
        self.settings.start_time
    }

    fn initial_weather(&self) -> Option<Weather> {
        self.settings.initial_weather.clone()
    }

    fn initial_inventory(&self) -> Option<Vec<InventoryItem>> {
        self.settings.initial_inventory.clone()
    }

    fn start_position(&self) -> Option<StartPosition> {
        self.settings.start_position
    }

    fn start_health(&self) -> f32 {
        self.settings.start_health
    }

    fn start_food(&self) -> u32 {
        self.settings.start_food
    }

    fn spawn_mobs(
        &mut self,
        mobs: &[String],
        rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        let positions: Vec<Vec<f64>> = rel_positions.iter().map(|p| p.to_vec()).collect();
        Python::with_gil(|py| {
            step_result(
                self.env
                    .bind(py)
                    .call_method1("spawn_mobs", (mobs.to_vec(), positions))?,
            )
        })
        .map_err(env_error)
    }

    fn set_block(
        &mut self,
        blocks: &[String],
        rel_positions: &[[f64; 3]],
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        let positions: Vec<Vec<f64>> = rel_positions.iter().map(|p| p.to_vec()).collect();
        Python::with_gil(|py| {
            step_result(
                self.env
                    .bind(py)
                    .call_method1("set_block", (blocks.to_vec(), positions))?,
            )
        })
        .map_err(env_error)
    }

    fn clear_inventory(
        &mut self,
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Python::with_gil(|py| {
            let action = action.map(PyHandle::into_inner);
            step_result(self.env.bind(py).call_method1("clear_inventory", (action,))?)
        })
        .map_err(env_error)
    }

    fn set_inventory(
        &mut self,
        items: &[InventoryItem],
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Python::with_gil(|py| {
            let class = py.import("minedojo.sim.inventory")?.getattr("InventoryItem")?;
            let mut inventory = Vec::with_capacity(items.len());
            for item in items {
                let kwargs = PyDict::new(py);
                match item.slot {
                    InventorySlot::Index(index) => kwargs.set_item("slot", index)?,
                    InventorySlot::Equipment(slot) => kwargs.set_item("slot", slot.as_str())?,
                }
                kwargs.set_item("name", item.name.as_str())?;
                kwargs.set_item("variant", item.variant)?;
                kwargs.set_item("quantity", item.quantity)?;
                inventory.push(class.call((), Some(&kwargs))?);
            }
            let action = action.map(PyHandle::into_inner);
            step_result(
                self.env
                    .bind(py)
                    .call_method1("set_inventory", (inventory, action))?,
            )
        })
        .map_err(env_error)
    }

    fn teleport_agent(
        &mut self,
        pose: StartPosition,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Python::with_gil(|py| {
            let args = (
                coord_object(py, pose.x)?,
                coord_object(py, pose.y)?,
                coord_object(py, pose.z)?,
                coord_object(py, pose.yaw)?,
                coord_object(py, pose.pitch)?,
            );
            step_result(self.env.bind(py).call_method1("teleport_agent", args)?)
        })
        .map_err(env_error)
    }

    fn kill_agent(&mut self) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        self.call0("kill_agent")
    }

    fn set_time(&mut self, time: u64) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Python::with_gil(|py| step_result(self.env.bind(py).call_method1("set_time", (time,))?))
            .map_err(env_error)
    }

    fn set_weather(
        &mut self,
        weather: &Weather,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Python::with_gil(|py| {
            step_result(
                self.env
                    .bind(py)
                    .call_method1("set_weather", (weather.to_string(),))?,
            )
        })
        .map_err(env_error)
    }

    fn random_teleport(
        &mut self,
        max_range: u32,
        action: Option<Self::Act>,
    ) -> Result<StepResult<Self::Obs, Self::Info>, EnvError> {
        Python::with_gil(|py| {
            let action = action.map(PyHandle::into_inner);
            step_result(
                self.env
                    .bind(py)
                    .call_method1("random_teleport", (max_range, action))?,
            )
        })
        .map_err(env_error)
    }

    fn prev_obs(&self) -> Result<Option<Self::Obs>, EnvError> {
        self.read("prev_obs")
    }

    fn prev_info(&self) -> Result<Option<Self::Info>, EnvError> {
        self.read("prev_info")
    }

    fn prev_action(&self) -> Result<Option<Self::Act>, EnvError> {
        self.read("prev_action")
    }

    fn is_terminated(&self) -> Result<bool, EnvError> {
        Python::with_gil(|py| self.env.bind(py).getattr("is_terminated")?.extract())
            .map_err(env_error)
    }
}
