//! Python bindings for embedding the simulator under a plotting or control
//! frontend. Array-valued accessors hand back NumPy arrays; every mutator
//! maps 1:1 onto a [`Simulation`] method.

use glam::DVec2;
use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::{ReactionDirection, Simulation, Species, State};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_species(code: &str) -> PyResult<Species> {
    match code {
        "A" | "a" => Ok(Species::A),
        "B" | "b" => Ok(Species::B),
        "C" | "c" => Ok(Species::C),
        "D" | "d" => Ok(Species::D),
        "X" | "x" => Ok(Species::X),
        other => Err(py_err(format!("unknown species {other:?}"))),
    }
}

fn parse_direction(code: &str) -> PyResult<ReactionDirection> {
    match code {
        "forward" => Ok(ReactionDirection::Forward),
        "reverse" => Ok(ReactionDirection::Reverse),
        other => Err(py_err(format!("unknown reaction direction {other:?}"))),
    }
}

/// Python-facing wrapper around the Rust simulation core.
#[pyclass]
pub struct KemSim {
    sim: Simulation,
}

impl KemSim {
    /// Snapshot by tick index; negative indices clamp to the initial state.
    fn state(&self, tick: i64) -> State {
        self.sim.state_at(tick.max(0) as usize)
    }
}

#[pymethods]
impl KemSim {
    /// Initialize an Idle simulation.
    ///
    /// Parameters
    /// - num_particles: total particle count (> 0)
    /// - weights: 5 non-negative species weights in A, B, C, D, X order
    /// - sim_size: box size in nm as (width, height)
    /// - sim_speed: simulated milliseconds per tick (default 1)
    /// - seed: RNG seed for reproducible initial placement; None for
    ///   nondeterministic
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (num_particles, weights, sim_size, sim_speed=1, seed=None))]
    fn new(
        num_particles: usize,
        weights: Vec<f64>,
        sim_size: (f64, f64),
        sim_speed: u64,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        if weights.len() != 5 {
            return Err(py_err("weights must have length 5 (A, B, C, D, X)"));
        }
        let mut w = [0.0f64; 5];
        w.copy_from_slice(&weights);
        let sim = Simulation::new(
            num_particles,
            w,
            DVec2::new(sim_size.0, sim_size.1),
            sim_speed,
            seed,
        )
        .map_err(py_err)?;
        Ok(Self { sim })
    }

    /// Extend the target duration and launch the background tick loop.
    /// No-op while already running.
    fn run(&self) {
        self.sim.run();
    }

    /// Whether the background tick loop is active.
    fn is_running(&self) -> bool {
        self.sim.is_running()
    }

    /// Number of completed ticks.
    fn tick_count(&self) -> usize {
        self.sim.tick_count()
    }

    /// Positions at a tick as an (N, 2) float64 array, nm.
    fn get_positions<'py>(&self, py: Python<'py>, tick: i64) -> Bound<'py, PyArray2<f64>> {
        let state = self.state(tick);
        let n = state.particles().len();
        let mut arr = Array2::<f64>::zeros((n, 2));
        for (i, p) in state.particles().iter().enumerate() {
            arr[[i, 0]] = p.position.x;
            arr[[i, 1]] = p.position.y;
        }
        arr.into_pyarray(py)
    }

    /// Velocities at a tick as an (N, 2) float64 array.
    fn get_velocities<'py>(&self, py: Python<'py>, tick: i64) -> Bound<'py, PyArray2<f64>> {
        let state = self.state(tick);
        let n = state.particles().len();
        let mut arr = Array2::<f64>::zeros((n, 2));
        for (i, p) in state.particles().iter().enumerate() {
            arr[[i, 0]] = p.velocity.x;
            arr[[i, 1]] = p.velocity.y;
        }
        arr.into_pyarray(py)
    }

    /// Per-particle radii at a tick as an (N,) float64 array, nm.
    fn get_radii<'py>(&self, py: Python<'py>, tick: i64) -> Bound<'py, PyArray1<f64>> {
        let state = self.state(tick);
        let radii: Vec<f64> = state.particles().iter().map(|p| p.radius()).collect();
        radii.into_pyarray(py)
    }

    /// Per-particle species indices at a tick as an (N,) uint8 array
    /// (0..=4 for A, B, C, D, X).
    fn get_species<'py>(&self, py: Python<'py>, tick: i64) -> Bound<'py, PyArray1<u8>> {
        let state = self.state(tick);
        let codes: Vec<u8> = state
            .particles()
            .iter()
            .map(|p| p.species().index() as u8)
            .collect();
        codes.into_pyarray(py)
    }

    /// RGB display color for a species code, e.g. "A".
    #[staticmethod]
    fn species_color(code: &str) -> PyResult<(u8, u8, u8)> {
        let [r, g, b] = parse_species(code)?.color();
        Ok((r, g, b))
    }

    /// Per-species particle counts at a tick, in A, B, C, D, X order.
    fn get_counts(&self, tick: i64) -> [usize; 5] {
        *self.state(tick).counts()
    }

    /// Per-species concentrations at a tick (mol/L), in A, B, C, D, X order.
    fn get_concentrations(&self, tick: i64) -> [f64; 5] {
        *self.state(tick).concentrations()
    }

    /// Temperature at a tick, K.
    fn get_temperature(&self, tick: i64) -> f64 {
        self.state(tick).temperature()
    }

    /// Mean kinetic energy per particle at a tick, J.
    fn get_mean_kinetic_energy(&self, tick: i64) -> f64 {
        self.state(tick).mean_kinetic_energy()
    }

    /// Approximate equilibrium constant [C][D]/([A][B]) at a tick. Infinite
    /// or NaN when a reactant concentration is zero.
    fn get_equilibrium_constant(&self, tick: i64) -> f64 {
        self.state(tick).equilibrium_constant()
    }

    /// Full history as an (M, 7) float64 array of
    /// [time_ms, temperature, [A], [B], [C], [D], Keq] rows for plotting.
    fn get_history_series<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        let history = self.sim.history();
        let mut arr = Array2::<f64>::zeros((history.len(), 7));
        for (i, state) in history.iter().enumerate() {
            arr[[i, 0]] = state.time_ms() as f64;
            arr[[i, 1]] = state.temperature();
            arr[[i, 2]] = state.concentration_of(Species::A);
            arr[[i, 3]] = state.concentration_of(Species::B);
            arr[[i, 4]] = state.concentration_of(Species::C);
            arr[[i, 5]] = state.concentration_of(Species::D);
            arr[[i, 6]] = state.equilibrium_constant();
        }
        arr.into_pyarray(py)
    }

    /// Nudge a species' bond energy. Silent no-op while running; ValueError
    /// for species X.
    fn modify_bond_energy(&self, species: &str, increase: bool) -> PyResult<()> {
        self.sim
            .modify_bond_energy(parse_species(species)?, increase)
            .map_err(py_err)
    }

    /// Nudge the activation energy. Silent no-op while running.
    fn modify_activation_energy(&self, increase: bool) {
        self.sim.modify_activation_energy(increase);
    }

    /// Scale all velocities by ±5%. Silent no-op while running.
    fn modify_temperature(&self, increase: bool) {
        self.sim.modify_temperature(increase);
    }

    /// Add or remove a batch of 250 particles of a species. Silent no-op
    /// while running.
    fn modify_population(&self, species: &str, increase: bool) -> PyResult<()> {
        self.sim.modify_population(parse_species(species)?, increase);
        Ok(())
    }

    /// Step the forward or reverse branching ratio. Silent no-op while
    /// running.
    fn modify_branching_ratio(&self, direction: &str, increase: bool) -> PyResult<()> {
        self.sim
            .modify_branching_ratio(parse_direction(direction)?, increase);
        Ok(())
    }
}

/// The kemsim Python module entry point.
#[pymodule]
fn kemsim(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<KemSim>()?;
    Ok(())
}
