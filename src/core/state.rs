use crate::core::particle::Particle;
use crate::core::species::{Species, AVOGADRO, BOLTZMANN};

/// Simulated volume used for concentrations, in litres.
const SIM_VOLUME_L: f64 = 1.3824e-18;

/// Immutable per-tick snapshot of the whole population plus derived
/// aggregates.
///
/// A `State` owns a deep copy of the particle array taken at its tick, so
/// readers never alias the live population or observe a half-mutated tick.
/// The equilibrium constant is taken straight from the concentrations; when a
/// reactant concentration is zero it comes out infinite or NaN, reflecting an
/// undefined chemical equilibrium rather than being clamped.
#[derive(Debug, Clone)]
pub struct State {
    time_ms: u64,
    particles: Vec<Particle>,
    counts: [usize; 5],
    concentrations: [f64; 5],
    temperature: f64,
    mean_kinetic_energy: f64,
    equilibrium_constant: f64,
}

impl State {
    /// Aggregate a snapshot from an owned particle copy taken at `time_ms`.
    pub fn new(time_ms: u64, particles: Vec<Particle>) -> Self {
        let mut counts = [0usize; 5];
        let mut energy_acc = 0.0;
        for p in &particles {
            counts[p.species().index()] += 1;
            energy_acc += p.mass_kg() * p.velocity.length_squared();
        }

        let n = particles.len() as f64;
        let temperature = energy_acc / (2.0 * n * BOLTZMANN);
        let mean_kinetic_energy = energy_acc / (2.0 * n);

        let mut concentrations = [0.0f64; 5];
        for (conc, &count) in concentrations.iter_mut().zip(counts.iter()) {
            *conc = count as f64 / (AVOGADRO * SIM_VOLUME_L);
        }

        let equilibrium_constant =
            (concentrations[2] * concentrations[3]) / (concentrations[0] * concentrations[1]);

        Self {
            time_ms,
            particles,
            counts,
            concentrations,
            temperature,
            mean_kinetic_energy,
            equilibrium_constant,
        }
    }

    /// Tick timestamp in simulated milliseconds.
    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    /// The deep-copied population at this tick.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Per-species counts in `Species::ALL` order; their sum always equals
    /// the particle count.
    pub fn counts(&self) -> &[usize; 5] {
        &self.counts
    }

    pub fn count_of(&self, species: Species) -> usize {
        self.counts[species.index()]
    }

    /// Per-species concentrations in mol/L.
    pub fn concentrations(&self) -> &[f64; 5] {
        &self.concentrations
    }

    pub fn concentration_of(&self, species: Species) -> f64 {
        self.concentrations[species.index()]
    }

    /// Temperature in K, from the mean translational kinetic energy.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Mean kinetic energy per particle, J.
    pub fn mean_kinetic_energy(&self) -> f64 {
        self.mean_kinetic_energy
    }

    /// Approximate equilibrium constant `[C][D] / ([A][B])`.
    pub fn equilibrium_constant(&self) -> f64 {
        self.equilibrium_constant
    }
}
