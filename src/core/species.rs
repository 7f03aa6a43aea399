/// Atomic mass constant, kg per amu.
pub const AMU_KG: f64 = 1.660_539_066_60e-27;

/// Boltzmann constant, J/K.
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Avogadro constant, 1/mol.
pub const AVOGADRO: f64 = 6.022_140_76e23;

/// Radius per cube-root-amu, nm.
const RADIUS_FACTOR: f64 = 3.0;

/// Chemical species of a particle.
///
/// A + B is the reactant pair, C + D the product pair; X is inert and only
/// participates in elastic collisions. The set is closed: reaction matching
/// and the per-species aggregates in [`crate::core::State`] both rely on
/// exhaustive matches over these five variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    A,
    B,
    C,
    D,
    X,
}

impl Species {
    /// All species, in the order used by count/concentration arrays.
    pub const ALL: [Species; 5] = [Species::A, Species::B, Species::C, Species::D, Species::X];

    /// Atomic mass in amu. Forward products conserve total mass
    /// (A + B and C + D both sum to 50 amu).
    #[inline]
    pub fn mass_amu(self) -> f64 {
        match self {
            Species::A => 20.0,
            Species::B => 30.0,
            Species::C => 24.0,
            Species::D => 26.0,
            Species::X => 44.0,
        }
    }

    /// Mass in kg.
    #[inline]
    pub fn mass_kg(self) -> f64 {
        self.mass_amu() * AMU_KG
    }

    /// Hard-disc radius in nm, derived from the mass.
    #[inline]
    pub fn radius(self) -> f64 {
        self.mass_amu().cbrt() * RADIUS_FACTOR
    }

    /// Position of this species in count/concentration arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Species::A => 0,
            Species::B => 1,
            Species::C => 2,
            Species::D => 3,
            Species::X => 4,
        }
    }

    /// Display color (RGB) for the rendering collaborator.
    pub fn color(self) -> [u8; 3] {
        match self {
            Species::A => [128, 0, 0],     // maroon
            Species::B => [0, 0, 128],     // navy
            Species::C => [143, 188, 143], // dark sea green
            Species::D => [255, 140, 0],   // dark orange
            Species::X => [255, 255, 255], // white
        }
    }

    /// Largest radius over all species; the grid cell width is sized from it.
    pub fn max_radius() -> f64 {
        Species::ALL
            .iter()
            .map(|s| s.radius())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_tracks_mass() {
        for s in Species::ALL {
            assert!((s.radius() - s.mass_amu().cbrt() * 3.0).abs() < 1e-12);
            assert!(s.mass_kg() > 0.0);
        }
    }

    #[test]
    fn reaction_pairs_conserve_mass() {
        let reactants = Species::A.mass_amu() + Species::B.mass_amu();
        let products = Species::C.mass_amu() + Species::D.mass_amu();
        assert_eq!(reactants, products);
    }

    #[test]
    fn max_radius_is_the_heaviest_species() {
        assert_eq!(Species::max_radius(), Species::X.radius());
    }

    #[test]
    fn indices_are_a_permutation() {
        let mut seen = [false; 5];
        for s in Species::ALL {
            seen[s.index()] = true;
        }
        assert!(seen.iter().all(|&b| b));
    }
}
