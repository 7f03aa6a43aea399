use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use glam::DVec2;
use log::debug;
use parking_lot::{Mutex, MutexGuard};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::core::collision::{self, Contact, ReactionDirection, ReactionParams};
use crate::core::grid::CellGrid;
use crate::core::particle::Particle;
use crate::core::species::Species;
use crate::core::state::State;
use crate::error::{Error, Result};

/// Simulated milliseconds added to the target duration by each `run` call.
const RUN_EXTENSION_MS: u64 = 2500;

/// Step applied to bond and activation energies per mutator call, J.
const ENERGY_STEP: f64 = 1e-21;

/// Particles added or removed per population edit.
const POPULATION_BATCH: usize = 250;

/// Speed of particles seeded at construction.
const INITIAL_SPEED: f64 = 500.0;

const TEMP_SCALE_UP: f64 = 1.05;
const TEMP_SCALE_DOWN: f64 = 0.95;

/// Everything the tick loop mutates: the live particle arena, the transient
/// broad-phase grid, the reaction parameters, and the time bookkeeping.
#[derive(Debug)]
struct World {
    particles: Vec<Particle>,
    grid: CellGrid,
    params: ReactionParams,
    time_ms: u64,
    target_ms: u64,
    sim_speed: u64,
    sim_size: DVec2,
}

impl World {
    /// One simulation step: rebucket, advance, reflect at the walls, resolve
    /// overlapping pairs.
    fn tick(&mut self) {
        let World {
            particles,
            grid,
            params,
            time_ms,
            sim_speed,
            sim_size,
            ..
        } = self;

        // Broad phase: bucket every particle at its pre-move position.
        grid.clear();
        for (i, p) in particles.iter().enumerate() {
            grid.insert(i, p.position);
        }

        // Advance positions. Each particle only touches its own fields.
        *time_ms += *sim_speed;
        let dt = *sim_speed as f64 * 1e-3;
        particles.par_iter_mut().for_each(|p| p.advance(dt));

        // Wall resolution for the four boundary rows and columns.
        let (nx, ny) = grid.dims();
        for cx in 0..nx {
            for &i in grid.cell(cx, 0) {
                particles[i].reflect_top();
            }
        }
        for cx in 0..nx {
            for &i in grid.cell(cx, ny - 1) {
                particles[i].reflect_bottom(*sim_size);
            }
        }
        for cy in 0..ny {
            for &i in grid.cell(0, cy) {
                particles[i].reflect_left();
            }
        }
        for cy in 0..ny {
            for &i in grid.cell(nx - 1, cy) {
                particles[i].reflect_right(*sim_size);
            }
        }

        // Narrow phase, strictly sequential: pop each cell front-first and
        // test the popped particle against everything still bucketed in the
        // 3x3 neighborhood. Removing the popped index before moving on is
        // what makes every pair resolve exactly once.
        let mut rng = rng();
        for cy in 0..ny {
            for cx in 0..nx {
                while let Some(&i) = grid.cell(cx, cy).first() {
                    for oy in -1..=1isize {
                        for ox in -1..=1isize {
                            let ncx = cx as isize + ox;
                            let ncy = cy as isize + oy;
                            if ncx < 0 || ncy < 0 || ncx >= nx as isize || ncy >= ny as isize {
                                continue;
                            }
                            for &j in grid.cell(ncx as usize, ncy as usize) {
                                if i == j {
                                    continue;
                                }
                                let offset = particles[j].position - particles[i].position;
                                if offset.length()
                                    < particles[i].radius() + particles[j].radius()
                                {
                                    let contact = Contact {
                                        first: i,
                                        second: j,
                                        offset,
                                    };
                                    collision::resolve(particles, &contact, params, &mut rng);
                                }
                            }
                        }
                    }
                    grid.pop_front(cx, cy);
                }
            }
        }
    }

    /// Deep-copy the population into a fresh snapshot at the current time.
    fn snapshot(&self) -> State {
        State::new(self.time_ms, self.particles.clone())
    }

    /// Mean kinetic energy per particle, J (the same accumulator the
    /// snapshots use).
    fn mean_kinetic_energy(&self) -> f64 {
        let acc: f64 = self
            .particles
            .iter()
            .map(|p| p.mass_kg() * p.velocity.length_squared())
            .sum();
        acc / (2.0 * self.particles.len() as f64)
    }
}

struct Shared {
    running: AtomicBool,
    world: Mutex<World>,
    history: Mutex<Vec<State>>,
}

/// The reversible-reaction particle simulator.
///
/// A `Simulation` is either Idle or Running. [`Simulation::run`] extends the
/// simulated target duration and launches a background tick loop; while that
/// loop is active, all parameter mutators are silent no-ops and reads are
/// served from the most recently committed snapshot. The loop stops on its
/// own once the tick counter reaches the target, after which `run` can extend
/// it again.
///
/// History is append-only: one immutable [`State`] per tick, starting with
/// the initial population at index 0. All accessors hand out copies; callers
/// never alias live simulation state.
pub struct Simulation {
    shared: Arc<Shared>,
}

impl Simulation {
    /// Create an Idle simulation with `num_particles` particles distributed
    /// over the species according to `weights` (A, B, C, D, X order), inside
    /// a `sim_size` nm box, advancing `sim_speed` ms per tick.
    ///
    /// Particles get uniformly random positions and directions at a fixed
    /// initial speed. `seed` makes placement reproducible.
    pub fn new(
        num_particles: usize,
        weights: [f64; 5],
        sim_size: DVec2,
        sim_speed: u64,
        seed: Option<u64>,
    ) -> Result<Self> {
        if num_particles == 0 {
            return Err(Error::InvalidParam("num_particles must be > 0".into()));
        }
        if !(sim_size.x.is_finite() && sim_size.y.is_finite() && sim_size.min_element() > 0.0) {
            return Err(Error::InvalidParam(
                "sim_size components must be finite and > 0".into(),
            ));
        }
        if sim_speed == 0 {
            return Err(Error::InvalidParam("sim_speed must be > 0".into()));
        }
        if !weights.iter().all(|w| w.is_finite() && *w >= 0.0) {
            return Err(Error::InvalidParam(
                "species weights must be finite and >= 0".into(),
            ));
        }
        let total_weight: f64 = weights.iter().sum();
        if total_weight <= 0.0 {
            return Err(Error::InvalidParam(
                "species weights must not be all zero".into(),
            ));
        }

        let mut rng: StdRng = match seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        let mut particles = Vec::with_capacity(num_particles);
        for (species, &weight) in Species::ALL.iter().zip(weights.iter()) {
            let count = (num_particles as f64 * weight / total_weight) as usize;
            for _ in 0..count {
                particles.push(spawn(&mut rng, *species, sim_size, INITIAL_SPEED));
            }
        }

        let world = World {
            particles,
            grid: CellGrid::new(sim_size),
            params: ReactionParams::default(),
            time_ms: 0,
            target_ms: 0,
            sim_speed,
            sim_size,
        };
        let initial = world.snapshot();

        Ok(Self {
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                world: Mutex::new(world),
                history: Mutex::new(vec![initial]),
            }),
        })
    }

    /// Extend the target duration and launch the background tick loop.
    /// Idempotent: a call while Running changes nothing.
    pub fn run(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let target = {
            let mut world = self.shared.world.lock();
            world.target_ms += RUN_EXTENSION_MS;
            world.target_ms
        };
        debug!("tick loop started, target {target} ms");

        let shared = Arc::clone(&self.shared);
        thread::spawn(move || {
            loop {
                let mut world = shared.world.lock();
                world.tick();
                let snapshot = world.snapshot();
                let done = world.time_ms >= world.target_ms;
                drop(world);

                shared.history.lock().push(snapshot);
                if done {
                    break;
                }
            }
            shared.running.store(false, Ordering::SeqCst);
            debug!("tick loop drained, simulation idle");
        });
    }

    /// Whether the background tick loop is currently active.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// The latest committed snapshot while Running; a freshly computed one
    /// while Idle.
    pub fn current_state(&self) -> State {
        if self.is_running() {
            if let Some(last) = self.shared.history.lock().last() {
                return last.clone();
            }
        }
        self.shared.world.lock().snapshot()
    }

    /// Snapshot by tick index, clamped to the valid range: too-large indices
    /// return the latest snapshot, and index 0 (the initial population) is
    /// always present.
    pub fn state_at(&self, tick: usize) -> State {
        let found = {
            let history = self.shared.history.lock();
            let clamped = tick.min(history.len().saturating_sub(1));
            history.get(clamped).cloned()
        };
        match found {
            Some(state) => state,
            None => self.shared.world.lock().snapshot(),
        }
    }

    /// Copy of the full snapshot history, oldest first.
    pub fn history(&self) -> Vec<State> {
        self.shared.history.lock().clone()
    }

    /// Number of completed ticks (history length minus the initial
    /// snapshot).
    pub fn tick_count(&self) -> usize {
        self.shared.history.lock().len().saturating_sub(1)
    }

    /// Current reaction parameters, by value.
    pub fn reaction_params(&self) -> ReactionParams {
        self.shared.world.lock().params
    }

    /// Box size in nm.
    pub fn sim_size(&self) -> DVec2 {
        self.shared.world.lock().sim_size
    }

    /// Nudge one species' bond energy by the fixed step (floored at zero on
    /// decrement). Species X carries no bond energy. No-op while Running.
    pub fn modify_bond_energy(&self, species: Species, increase: bool) -> Result<()> {
        let Some(mut world) = self.idle_world() else {
            return Ok(());
        };
        let params = &mut world.params;
        let slot = match species {
            Species::A => &mut params.bond_energy_a,
            Species::B => &mut params.bond_energy_b,
            Species::C => &mut params.bond_energy_c,
            Species::D => &mut params.bond_energy_d,
            Species::X => {
                return Err(Error::InvalidParam("species X has no bond energy".into()));
            }
        };
        *slot = step_energy(*slot, increase);
        Ok(())
    }

    /// Nudge the activation energy by the fixed step (floored at zero).
    /// No-op while Running.
    pub fn modify_activation_energy(&self, increase: bool) {
        if let Some(mut world) = self.idle_world() {
            world.params.activation_energy = step_energy(world.params.activation_energy, increase);
        }
    }

    /// Step a branching ratio up or down (floored at zero; zero disables
    /// that reaction direction). No-op while Running.
    pub fn modify_branching_ratio(&self, direction: ReactionDirection, increase: bool) {
        if let Some(mut world) = self.idle_world() {
            let slot = match direction {
                ReactionDirection::Forward => &mut world.params.forward_ratio,
                ReactionDirection::Reverse => &mut world.params.reverse_ratio,
            };
            *slot = if increase {
                *slot + 1
            } else {
                slot.saturating_sub(1)
            };
        }
    }

    /// Scale every particle's velocity by ±5%. No-op while Running.
    pub fn modify_temperature(&self, increase: bool) {
        if let Some(mut world) = self.idle_world() {
            let factor = if increase { TEMP_SCALE_UP } else { TEMP_SCALE_DOWN };
            for p in &mut world.particles {
                p.velocity *= factor;
            }
        }
    }

    /// Add or remove a batch of 250 particles of `species`. Added particles
    /// are seeded at random positions and directions with the speed matching
    /// the current mean kinetic energy; removal takes the first matches and
    /// stops early if fewer exist. No-op while Running.
    pub fn modify_population(&self, species: Species, increase: bool) {
        let Some(mut world) = self.idle_world() else {
            return;
        };
        if increase {
            // An empty box has no thermal speed to match; fall back to the
            // construction-time seeding speed.
            let speed = if world.particles.is_empty() {
                INITIAL_SPEED
            } else {
                (2.0 * world.mean_kinetic_energy() / species.mass_kg()).sqrt()
            };
            let sim_size = world.sim_size;
            let mut rng = rng();
            for _ in 0..POPULATION_BATCH {
                let p = spawn(&mut rng, species, sim_size, speed);
                world.particles.push(p);
            }
        } else {
            let mut remaining = POPULATION_BATCH;
            world.particles.retain(|p| {
                if remaining > 0 && p.species() == species {
                    remaining -= 1;
                    false
                } else {
                    true
                }
            });
        }
    }

    /// Lock the world for a mutator, or `None` when the tick loop is active.
    /// `run` flips the flag before the loop takes the lock, so a mutator that
    /// acquires the lock still has to re-check it.
    fn idle_world(&self) -> Option<MutexGuard<'_, World>> {
        if self.shared.running.load(Ordering::SeqCst) {
            return None;
        }
        let world = self.shared.world.lock();
        if self.shared.running.load(Ordering::SeqCst) {
            return None;
        }
        Some(world)
    }
}

fn step_energy(value: f64, increase: bool) -> f64 {
    if increase {
        value + ENERGY_STEP
    } else {
        (value - ENERGY_STEP).max(0.0)
    }
}

fn spawn(rng: &mut impl Rng, species: Species, sim_size: DVec2, speed: f64) -> Particle {
    let position = DVec2::new(
        rng.random_range(0.0..sim_size.x),
        rng.random_range(0.0..sim_size.y),
    );
    let angle = rng.random_range(0.0..std::f64::consts::TAU);
    Particle::new(position, DVec2::from_angle(angle) * speed, species)
}
