use std::collections::HashMap;

use fastreset::env::{Env, EnvError, MinecraftSim, Position, StepResult};
use fastreset::{FastReset, FastResetConfig, FastResetError};
use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyTuple};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod sim;

pub use sim::{PyHandle, PySim};

type PyStep = (Py<PyAny>, f32, bool, Py<PyAny>);

fn py_step((obs, reward, done, info): StepResult<PyHandle, PyHandle>) -> PyStep {
    (obs.into_inner(), reward, done, info.into_inner())
}

/// Re-raises the original Python exception when the env raised one.
fn env_err(err: EnvError) -> PyErr {
    match err {
        EnvError::EnvError(source) => match source.downcast::<PyErr>() {
            Ok(py_err) => *py_err,
            Err(other) => PyRuntimeError::new_err(other.to_string()),
        },
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

fn reset_err(err: FastResetError) -> PyErr {
    match err {
        FastResetError::Env(inner) => env_err(inner),
        missing @ FastResetError::MissingPosition { .. } => PyKeyError::new_err(missing.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

fn position_dict(pos: Option<Position>) -> Option<HashMap<&'static str, f64>> {
    pos.map(|p| HashMap::from([("x", p.x), ("y", p.y), ("z", p.z)]))
}

/// Fast reset wrapper around a MineDojo-style simulation object.
///
/// The first `reset()` regenerates the world; later ones reuse it through
/// console commands. The sim helpers (`execute_cmd`, `set_inventory`, ...)
/// are forwarded to the env unchanged.
#[pyclass(name = "FastResetWrapper", module = "pyfastreset")]
pub struct PyFastReset {
    inner: FastReset<PySim>,
}

#[pymethods]
impl PyFastReset {
    #[new]
    #[pyo3(signature = (
        env,
        random_teleport_range=None,
        random_teleport_range_high=None,
        random_teleport_range_low=None,
        clear_ground=true,
        seed=None
    ))]
    fn new(
        env: &Bound<'_, PyAny>,
        random_teleport_range: Option<&Bound<'_, PyAny>>,
        random_teleport_range_high: Option<f64>,
        random_teleport_range_low: Option<f64>,
        clear_ground: bool,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        if random_teleport_range.is_some() {
            warn!("`random_teleport_range` is ignored, set `random_teleport_range_high`/`_low`");
        }
        let config = FastResetConfig {
            random_teleport_range_low,
            random_teleport_range_high,
            clear_ground,
            seed,
        };
        Self::with_config(env, config)
    }

    /// Builds the wrapper from a JSON `FastResetConfig`.
    #[staticmethod]
    fn from_config(env: &Bound<'_, PyAny>, config: &str) -> PyResult<Self> {
        let config = FastResetConfig::from_json(config)
            .map_err(|e| PyValueError::new_err(format!("invalid fast reset config: {e}")))?;
        Self::with_config(env, config)
    }

    /// `move_flag=True` spreads the agent to a random spawn when a teleport
    /// range is configured.
    #[pyo3(signature = (move_flag=true))]
    fn reset(&mut self, move_flag: bool) -> PyResult<Py<PyAny>> {
        let obs = self.inner.reset(move_flag).map_err(reset_err)?;
        Ok(obs.into_inner())
    }

    fn step(&mut self, action: Py<PyAny>) -> PyResult<PyStep> {
        Env::step(&mut self.inner, PyHandle::new(action))
            .map(py_step)
            .map_err(env_err)
    }

    fn close(&mut self) -> PyResult<()> {
        Env::close(&mut self.inner).map_err(env_err)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn execute_cmd(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("execute_cmd", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn spawn_mobs(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("spawn_mobs", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn set_block(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("set_block", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn clear_inventory(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("clear_inventory", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn set_inventory(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("set_inventory", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn teleport_agent(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("teleport_agent", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn kill_agent(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("kill_agent", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn set_time(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("set_time", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn set_weather(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("set_weather", args, kwargs)
    }

    #[pyo3(signature = (*args, **kwargs))]
    fn random_teleport(
        &self,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        self.forward("random_teleport", args, kwargs)
    }

    #[getter]
    fn env(&self, py: Python<'_>) -> Py<PyAny> {
        self.inner.inner().object().clone_ref(py)
    }

    #[getter]
    fn prev_obs(&self) -> PyResult<Option<Py<PyAny>>> {
        let obs = self.inner.prev_obs().map_err(env_err)?;
        Ok(obs.map(PyHandle::into_inner))
    }

    #[getter]
    fn prev_info(&self) -> PyResult<Option<Py<PyAny>>> {
        let info = self.inner.prev_info().map_err(env_err)?;
        Ok(info.map(PyHandle::into_inner))
    }

    #[getter]
    fn prev_action(&self) -> PyResult<Option<Py<PyAny>>> {
        let action = self.inner.prev_action().map_err(env_err)?;
        Ok(action.map(PyHandle::into_inner))
    }

    #[getter]
    fn is_terminated(&self) -> PyResult<bool> {
        self.inner.is_terminated().map_err(env_err)
    }

    #[getter]
    fn info_prev_reset(&self, py: Python<'_>) -> Option<Py<PyAny>> {
        self.inner.info_prev_reset().map(|info| info.clone_ref(py))
    }

    #[getter]
    fn init_position(&self) -> Option<HashMap<&'static str, f64>> {
        position_dict(self.inner.init_position())
    }

    #[getter]
    fn birth_position(&self) -> Option<HashMap<&'static str, f64>> {
        position_dict(self.inner.birth_position())
    }

    #[getter]
    fn reset_cmds(&self) -> Vec<String> {
        self.inner.reset_commands().lines()
    }

    #[getter]
    fn random_teleport_range_low(&self) -> f64 {
        self.inner.teleport_range().low()
    }

    #[getter]
    fn random_teleport_range_high(&self) -> f64 {
        self.inner.teleport_range().high()
    }
}

impl PyFastReset {
    /// Calls `method` on the wrapped env with the caller's arguments as given.
    fn forward(
        &self,
        method: &str,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Py<PyAny>> {
        let env = self.inner.inner().object().bind(args.py());
        Ok(env.call_method(method, args.clone(), kwargs)?.unbind())
    }

    fn with_config(env: &Bound<'_, PyAny>, config: FastResetConfig) -> PyResult<Self> {
        let sim = PySim::new(env)?;
        let inner = FastReset::new(sim, config).map_err(reset_err)?;
        Ok(Self { inner })
    }
}

/// Routes `tracing` output to stderr. `filter` uses `RUST_LOG` syntax and
/// defaults to the `RUST_LOG` variable, then `info`.
#[pyfunction]
#[pyo3(signature = (filter=None))]
fn init_logging(filter: Option<&str>) -> PyResult<()> {
    let filter = match filter {
        Some(directives) => {
            EnvFilter::try_new(directives).map_err(|e| PyValueError::new_err(e.to_string()))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    tracing::debug!("logging initialised");
    Ok(())
}

/// A Python module implemented in Rust.
/// The name of this function must match the lib.name in Cargo.toml
#[pymodule]
fn pyfastreset(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFastReset>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pyo3::types::PyList;

    use super::*;
    use crate::sim::tests::{new_object, with_python};

    #[test]
    fn env_errors_reraise_the_original_exception() {
        with_python(|py| {
            let err = env_err(EnvError::EnvError(Box::new(PyKeyError::new_err("pos"))));
            assert!(err.is_instance_of::<PyKeyError>(py));

            let err = env_err(EnvError::Command {
                command: "/kill".to_string(),
                reason: "refused".to_string(),
            });
            assert!(err.is_instance_of::<PyRuntimeError>(py));
        });
    }

    #[test]
    fn positional_arguments_skip_the_legacy_range() {
        with_python(|py| {
            let sim = new_object(py, "Sim");
            let class = py.get_type::<PyFastReset>();
            let env = class.call1((&sim, py.None(), 300, 10)).unwrap();
            let high: f64 = env.getattr("random_teleport_range_high").unwrap().extract().unwrap();
            let low: f64 = env.getattr("random_teleport_range_low").unwrap().extract().unwrap();
            assert_eq!((low, high), (10.0, 300.0));

            let kwargs = PyDict::new(py);
            kwargs.set_item("random_teleport_range", 50).unwrap();
            let env = class.call((&sim,), Some(&kwargs)).unwrap();
            let high: f64 = env.getattr("random_teleport_range_high").unwrap().extract().unwrap();
            assert_eq!(high, 20.0);
        });
    }

    #[test]
    fn sim_helpers_are_forwarded_untouched() {
        with_python(|py| {
            let sim = new_object(py, "Sim");
            let env = py.get_type::<PyFastReset>().call1((&sim,)).unwrap();

            let ret = env.call_method1("set_weather", ("acid_rain",)).unwrap();
            let name: String = ret.get_item(0).unwrap().extract().unwrap();
            let weather: String = ret.get_item(1).unwrap().get_item(0).unwrap().extract().unwrap();
            assert_eq!((name.as_str(), weather.as_str()), ("set_weather", "acid_rain"));

            let items = PyList::new(py, [py.None(), py.None()]).unwrap();
            let kwargs = PyDict::new(py);
            kwargs.set_item("action", "noop").unwrap();
            let ret = env.call_method("set_inventory", (&items,), Some(&kwargs)).unwrap();
            let forwarded = ret.get_item(1).unwrap().get_item(0).unwrap();
            assert_eq!(forwarded.as_ptr(), items.as_ptr());
            let action: String = ret.get_item(2).unwrap().get_item("action").unwrap().extract().unwrap();
            assert_eq!(action, "noop");

            let ret = env.call_method1("teleport_agent", (1, 65, 2)).unwrap();
            assert_eq!(ret.get_item(1).unwrap().len().unwrap(), 3);
        });
    }

    #[test]
    fn fast_reset_runs_through_the_python_env() {
        with_python(|py| {
            let sim = new_object(py, "Sim");
            let kwargs = PyDict::new(py);
            kwargs.set_item("random_teleport_range_high", 10.0).unwrap();
            kwargs.set_item("seed", 3).unwrap();
            let env = py
                .get_type::<PyFastReset>()
                .call((&sim,), Some(&kwargs))
                .unwrap();

            env.call_method0("reset").unwrap();
            let commands: Vec<String> = sim.getattr("commands").unwrap().extract().unwrap();
            assert!(commands.is_empty());

            env.call_method0("reset").unwrap();
            let commands: Vec<String> = sim.getattr("commands").unwrap().extract().unwrap();
            assert_eq!(commands[0], "/kill");
            assert!(commands.contains(&"/tp @p 0 64 0.5 0 0".to_string()));
            assert!(commands.iter().any(|c| c.starts_with("/spreadplayers 0 0 ")));

            let info = env.getattr("info_prev_reset").unwrap();
            let last: String = info.get_item("last").unwrap().extract().unwrap();
            assert_eq!(&last, commands.last().unwrap());
            assert!(!env.getattr("birth_position").unwrap().is_none());
        });
    }
}
