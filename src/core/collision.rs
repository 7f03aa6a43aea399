use glam::DVec2;
use rand::Rng;

use crate::core::particle::Particle;
use crate::core::species::{Species, AMU_KG};

/// Direction of the reversible reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionDirection {
    /// A + B -> C + D
    Forward,
    /// C + D -> A + B
    Reverse,
}

/// Tunable reaction parameters, owned by the simulation and frozen while the
/// tick loop is running.
///
/// Energies are in J. A branching ratio `n` gives an energetically eligible
/// collision a reaction probability of `1 / (n + 1)`; `n = 0` disables that
/// direction entirely.
#[derive(Debug, Clone, Copy)]
pub struct ReactionParams {
    pub bond_energy_a: f64,
    pub bond_energy_b: f64,
    pub bond_energy_c: f64,
    pub bond_energy_d: f64,
    pub activation_energy: f64,
    pub forward_ratio: u32,
    pub reverse_ratio: u32,
}

impl Default for ReactionParams {
    fn default() -> Self {
        Self {
            bond_energy_a: 0.0,
            bond_energy_b: 0.0,
            bond_energy_c: 0.0,
            bond_energy_d: 0.0,
            activation_energy: 0.0,
            forward_ratio: 1,
            reverse_ratio: 1,
        }
    }
}

impl ReactionParams {
    /// The shared barrier: the larger bond-energy pair sum plus the
    /// activation energy. Using the max makes the barrier asymmetric in the
    /// per-direction thresholds below.
    pub fn barrier(&self) -> f64 {
        let reactants = self.bond_energy_a + self.bond_energy_b;
        let products = self.bond_energy_c + self.bond_energy_d;
        reactants.max(products) + self.activation_energy
    }

    /// Relative kinetic energy required for a pair to react in `direction`.
    pub fn threshold(&self, direction: ReactionDirection) -> f64 {
        match direction {
            ReactionDirection::Forward => {
                self.barrier() - self.bond_energy_a - self.bond_energy_b
            }
            ReactionDirection::Reverse => {
                self.barrier() - self.bond_energy_c - self.bond_energy_d
            }
        }
    }

    pub fn branching_ratio(&self, direction: ReactionDirection) -> u32 {
        match direction {
            ReactionDirection::Forward => self.forward_ratio,
            ReactionDirection::Reverse => self.reverse_ratio,
        }
    }

    /// Success probability of the Bernoulli draw for `direction`; zero when
    /// the direction is disabled.
    pub fn probability(&self, direction: ReactionDirection) -> f64 {
        let ratio = self.branching_ratio(direction);
        if ratio == 0 {
            0.0
        } else {
            1.0 / f64::from(ratio + 1)
        }
    }

    /// Energy released into the pair by a reaction in `direction`:
    /// consumed bond energies minus formed bond energies.
    pub fn bond_delta(&self, direction: ReactionDirection) -> f64 {
        let forward =
            (self.bond_energy_a + self.bond_energy_b) - (self.bond_energy_c + self.bond_energy_d);
        match direction {
            ReactionDirection::Forward => forward,
            ReactionDirection::Reverse => -forward,
        }
    }
}

/// An overlapping pair found by the broad-phase sweep: arena indices of the
/// two particles plus the center offset from the first to the second.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub first: usize,
    pub second: usize,
    pub offset: DVec2,
}

/// Reaction channel for an ordered species pair: direction plus the product
/// species each side turns into. Left/right identity is preserved (A becomes
/// C on whichever side A was).
fn reaction_channel(
    first: Species,
    second: Species,
) -> Option<(ReactionDirection, Species, Species)> {
    match (first, second) {
        (Species::A, Species::B) => Some((ReactionDirection::Forward, Species::C, Species::D)),
        (Species::B, Species::A) => Some((ReactionDirection::Forward, Species::D, Species::C)),
        (Species::C, Species::D) => Some((ReactionDirection::Reverse, Species::A, Species::B)),
        (Species::D, Species::C) => Some((ReactionDirection::Reverse, Species::B, Species::A)),
        _ => None,
    }
}

/// Borrow two distinct particles mutably out of the arena.
pub fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = particles.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = particles.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

/// Resolve a contact from the sweep against the particle arena.
pub fn resolve(
    particles: &mut [Particle],
    contact: &Contact,
    params: &ReactionParams,
    rng: &mut impl Rng,
) {
    let (a, b) = pair_mut(particles, contact.first, contact.second);
    resolve_pair(a, b, contact.offset, params, rng);
}

/// Resolve one overlapping pair: energy-gated stochastic reaction, elastic
/// momentum exchange along the contact normal, then positional separation.
///
/// `offset` points from `a` to `b`. Coincident centers are a degenerate
/// contact with no usable normal and are skipped outright.
pub fn resolve_pair(
    a: &mut Particle,
    b: &mut Particle,
    offset: DVec2,
    params: &ReactionParams,
    rng: &mut impl Rng,
) {
    let dist = offset.length();
    if dist == 0.0 {
        return;
    }
    let normal = offset / dist;

    let u1 = a.velocity.dot(normal);
    let u2 = b.velocity.dot(normal);
    let approach = u1 - u2;

    // Reaction step, only for pairs still closing in on each other.
    if approach > 0.0 {
        let reduced_mass = a.mass_amu() * b.mass_amu() * AMU_KG / (a.mass_amu() + b.mass_amu());
        let e_rel = reduced_mass * approach * approach / 2.0;

        if let Some((direction, product_a, product_b)) =
            reaction_channel(a.species(), b.species())
        {
            let probability = params.probability(direction);
            if e_rel >= params.threshold(direction)
                && probability > 0.0
                && rng.random::<f64>() < probability
            {
                // Pre-reaction energies set the redistribution shares and the
                // directions to rescale along.
                let e1 = a.kinetic_energy();
                let e2 = b.kinetic_energy();
                let delta = params.bond_delta(direction);

                a.change_species(product_a);
                b.change_species(product_b);

                let total = e1 + e2;
                let new_e1 = e1 + delta * (e1 / total);
                let new_e2 = e2 + delta * (e2 / total);
                rescale_speed(a, new_e1);
                rescale_speed(b, new_e2);
            }
        }
    }

    // Elastic exchange along the normal, with the current (possibly reacted)
    // velocities and masses. Only the normal component changes.
    let u1 = a.velocity.dot(normal);
    let u2 = b.velocity.dot(normal);
    if u1 - u2 >= 0.0 {
        let (m1, m2) = (a.mass_amu(), b.mass_amu());
        let v1 = (u1 * (m1 - m2) + 2.0 * m2 * u2) / (m1 + m2);
        let v2 = (u2 * (m2 - m1) + 2.0 * m1 * u1) / (m1 + m2);
        a.velocity += (v1 - u1) * normal;
        b.velocity += (v2 - u2) * normal;
    }

    // Push the discs apart so the contact distance is exactly r1 + r2,
    // whatever the reaction and velocity outcome was.
    let overlap = a.radius() + b.radius() - dist;
    if overlap > 0.0 {
        let r_sum = a.radius() + b.radius();
        a.position -= normal * overlap * a.radius() / r_sum;
        b.position += normal * overlap * b.radius() / r_sum;
    }
}

/// Rescale a particle's speed so its kinetic energy equals `energy` at the
/// current mass, keeping the direction of travel. A particle at rest has no
/// direction to scale along and stays at rest.
fn rescale_speed(p: &mut Particle, energy: f64) {
    let speed_sq = p.velocity.length_squared();
    if speed_sq == 0.0 {
        return;
    }
    let direction = p.velocity / speed_sq.sqrt();
    p.velocity = direction * (2.0 * energy / p.mass_kg()).sqrt();
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use rand::RngCore;

    /// RNG that always yields zero bits, so `random::<f64>()` is 0.0 and any
    /// positive reaction probability fires.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    fn head_on_pair(first: Species, second: Species) -> (Particle, Particle, DVec2) {
        // Overlapping along x, closing at 10 units of relative speed.
        let gap = (first.radius() + second.radius()) * 0.5;
        let a = Particle::new(DVec2::new(0.0, 0.0), DVec2::new(5.0, 0.0), first);
        let b = Particle::new(DVec2::new(gap, 0.0), DVec2::new(-5.0, 0.0), second);
        let offset = b.position - a.position;
        (a, b, offset)
    }

    fn total_ke(a: &Particle, b: &Particle) -> f64 {
        a.kinetic_energy() + b.kinetic_energy()
    }

    #[test]
    fn disabled_forward_ratio_leaves_types_and_swaps_velocities() {
        let (mut a, mut b, offset) = head_on_pair(Species::A, Species::B);
        let params = ReactionParams {
            forward_ratio: 0,
            ..ReactionParams::default()
        };
        let before = total_ke(&a, &b);
        let (m1, m2) = (a.mass_amu(), b.mass_amu());
        let expected_v1 = (5.0 * (m1 - m2) + 2.0 * m2 * -5.0) / (m1 + m2);
        let expected_v2 = (-5.0 * (m2 - m1) + 2.0 * m1 * 5.0) / (m1 + m2);

        resolve_pair(&mut a, &mut b, offset, &params, &mut ZeroRng);

        assert_eq!(a.species(), Species::A);
        assert_eq!(b.species(), Species::B);
        assert!((a.velocity.x - expected_v1).abs() < 1e-12);
        assert!((b.velocity.x - expected_v2).abs() < 1e-12);
        let after = total_ke(&a, &b);
        assert!((after - before).abs() < before * 1e-12);
    }

    #[test]
    fn forced_reaction_transmutes_preserving_identity_and_energy() {
        let (mut a, mut b, offset) = head_on_pair(Species::A, Species::B);
        // All energies zero: threshold is 0 and the bond delta vanishes, so
        // the reaction may only relabel and rescale, never add energy.
        let params = ReactionParams::default();
        let before = total_ke(&a, &b);

        resolve_pair(&mut a, &mut b, offset, &params, &mut ZeroRng);

        assert_eq!(a.species(), Species::C);
        assert_eq!(b.species(), Species::D);
        let after = total_ke(&a, &b);
        assert!(
            (after - before).abs() < before * 1e-12,
            "KE drifted: {before} -> {after}"
        );
    }

    #[test]
    fn swapped_operands_keep_left_right_identity() {
        let (mut a, mut b, offset) = head_on_pair(Species::B, Species::A);
        let params = ReactionParams::default();
        resolve_pair(&mut a, &mut b, offset, &params, &mut ZeroRng);
        assert_eq!(a.species(), Species::D);
        assert_eq!(b.species(), Species::C);
    }

    #[test]
    fn reverse_channel_restores_reactants() {
        let (mut a, mut b, offset) = head_on_pair(Species::C, Species::D);
        let params = ReactionParams::default();
        resolve_pair(&mut a, &mut b, offset, &params, &mut ZeroRng);
        assert_eq!(a.species(), Species::A);
        assert_eq!(b.species(), Species::B);
    }

    #[test]
    fn inert_pairs_never_react() {
        let (mut a, mut b, offset) = head_on_pair(Species::X, Species::A);
        let params = ReactionParams::default();
        resolve_pair(&mut a, &mut b, offset, &params, &mut ZeroRng);
        assert_eq!(a.species(), Species::X);
        assert_eq!(b.species(), Species::A);
    }

    #[test]
    fn sub_threshold_pair_does_not_react() {
        let (mut a, mut b, offset) = head_on_pair(Species::A, Species::B);
        // A huge activation energy puts the barrier far above any kinetic
        // energy these speeds can supply.
        let params = ReactionParams {
            activation_energy: 1.0,
            ..ReactionParams::default()
        };
        resolve_pair(&mut a, &mut b, offset, &params, &mut ZeroRng);
        assert_eq!(a.species(), Species::A);
        assert_eq!(b.species(), Species::B);
    }

    #[test]
    fn exothermic_reaction_releases_bond_delta() {
        let (mut a, mut b, offset) = head_on_pair(Species::A, Species::B);
        let params = ReactionParams {
            bond_energy_a: 3e-21,
            bond_energy_b: 2e-21,
            ..ReactionParams::default()
        };
        let delta = params.bond_delta(ReactionDirection::Forward);
        assert!(delta > 0.0);
        let before = total_ke(&a, &b);

        resolve_pair(&mut a, &mut b, offset, &params, &mut ZeroRng);

        assert_eq!(a.species(), Species::C);
        let after = total_ke(&a, &b);
        assert!(
            ((after - before) - delta).abs() < delta * 1e-9,
            "released {} instead of {delta}",
            after - before
        );
    }

    #[test]
    fn separating_pair_keeps_velocities_but_separates() {
        let a_species = Species::A;
        let b_species = Species::B;
        let r_sum = a_species.radius() + b_species.radius();
        // Overlapping but already flying apart.
        let mut a = Particle::new(DVec2::ZERO, DVec2::new(-3.0, 0.0), a_species);
        let mut b = Particle::new(DVec2::new(r_sum * 0.5, 0.0), DVec2::new(3.0, 0.0), b_species);
        let offset = b.position - a.position;

        resolve_pair(&mut a, &mut b, offset, &ReactionParams::default(), &mut ZeroRng);

        assert_eq!(a.velocity, DVec2::new(-3.0, 0.0));
        assert_eq!(b.velocity, DVec2::new(3.0, 0.0));
        let dist = (b.position - a.position).length();
        assert!((dist - r_sum).abs() < 1e-9);
    }

    #[test]
    fn separation_shares_follow_radii() {
        let mut a = Particle::new(DVec2::ZERO, DVec2::ZERO, Species::A);
        let mut b = Particle::new(DVec2::new(1.0, 0.0), DVec2::ZERO, Species::X);
        let offset = b.position - a.position;
        let r_sum = a.radius() + b.radius();
        let overlap = r_sum - 1.0;

        resolve_pair(&mut a, &mut b, offset, &ReactionParams::default(), &mut ZeroRng);

        let expected_a = -overlap * a.radius() / r_sum;
        let expected_b = 1.0 + overlap * b.radius() / r_sum;
        assert!((a.position.x - expected_a).abs() < 1e-12);
        assert!((b.position.x - expected_b).abs() < 1e-12);
    }

    #[test]
    fn coincident_centers_are_skipped() {
        let mut a = Particle::new(DVec2::ZERO, DVec2::new(1.0, 0.0), Species::A);
        let mut b = Particle::new(DVec2::ZERO, DVec2::new(-1.0, 0.0), Species::B);
        resolve_pair(
            &mut a,
            &mut b,
            DVec2::ZERO,
            &ReactionParams::default(),
            &mut ZeroRng,
        );
        assert_eq!(a.velocity, DVec2::new(1.0, 0.0));
        assert_eq!(b.velocity, DVec2::new(-1.0, 0.0));
        assert_eq!(a.position, DVec2::ZERO);
    }

    #[test]
    fn pair_mut_borrows_either_order() {
        let mut arena = vec![
            Particle::new(DVec2::ZERO, DVec2::ZERO, Species::A),
            Particle::new(DVec2::new(1.0, 0.0), DVec2::ZERO, Species::B),
            Particle::new(DVec2::new(2.0, 0.0), DVec2::ZERO, Species::X),
        ];
        let (p0, p2) = pair_mut(&mut arena, 0, 2);
        assert_eq!(p0.species(), Species::A);
        assert_eq!(p2.species(), Species::X);
        let (p2, p1) = pair_mut(&mut arena, 2, 1);
        assert_eq!(p2.species(), Species::X);
        assert_eq!(p1.species(), Species::B);
    }

    #[test]
    fn probability_short_circuits_at_zero_ratio() {
        let params = ReactionParams {
            forward_ratio: 0,
            reverse_ratio: 3,
            ..ReactionParams::default()
        };
        assert_eq!(params.probability(ReactionDirection::Forward), 0.0);
        assert!((params.probability(ReactionDirection::Reverse) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn barrier_uses_the_larger_pair_sum() {
        let params = ReactionParams {
            bond_energy_a: 1e-21,
            bond_energy_b: 1e-21,
            bond_energy_c: 3e-21,
            bond_energy_d: 2e-21,
            activation_energy: 1e-21,
            ..ReactionParams::default()
        };
        assert!((params.barrier() - 6e-21).abs() < 1e-33);
        // Reactants must climb the full gap to the product pair.
        assert!((params.threshold(ReactionDirection::Forward) - 4e-21).abs() < 1e-33);
        // Products only need the activation energy.
        assert!((params.threshold(ReactionDirection::Reverse) - 1e-21).abs() < 1e-33);
    }
}
