use glam::DVec2;

use crate::core::species::{Species, AMU_KG};

/// One simulated compound: a hard disc with a chemical identity.
///
/// Position is in nm; velocity in the simulation's m/s-scale speed unit.
/// Radius and mass are derived from the species and kept consistent with it:
/// the only way to change them is [`Particle::change_species`].
#[derive(Debug, Clone)]
pub struct Particle {
    /// Position (nm).
    pub position: DVec2,
    /// Velocity (m/s scale; one tick displaces by `velocity * dt`).
    pub velocity: DVec2,
    species: Species,
    radius: f64,
    mass_amu: f64,
}

impl Particle {
    pub fn new(position: DVec2, velocity: DVec2, species: Species) -> Self {
        Self {
            position,
            velocity,
            species,
            radius: species.radius(),
            mass_amu: species.mass_amu(),
        }
    }

    #[inline]
    pub fn species(&self) -> Species {
        self.species
    }

    /// Hard-disc radius (nm).
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Mass in amu.
    #[inline]
    pub fn mass_amu(&self) -> f64 {
        self.mass_amu
    }

    /// Mass in kg.
    #[inline]
    pub fn mass_kg(&self) -> f64 {
        self.mass_amu * AMU_KG
    }

    /// Reassign the chemical identity, recomputing radius and mass with it.
    /// Velocity is left untouched; the reaction step owns any energy
    /// correction that the mass change requires.
    pub fn change_species(&mut self, next: Species) {
        self.species = next;
        self.radius = next.radius();
        self.mass_amu = next.mass_amu();
    }

    /// Advance the position by `velocity * dt`. Pure linear motion; boundary
    /// handling is a separate step.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        self.position += self.velocity * dt;
    }

    /// Kinetic energy in J: `m |v|^2 / 2` with the mass in kg.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        self.mass_kg() * self.velocity.length_squared() / 2.0
    }

    /// Wall check against y = 0. Clamps the position back onto the wall
    /// unconditionally, but only flips the velocity component if it still
    /// points outward, so a particle corrected earlier in the same tick is
    /// not flipped back out.
    pub fn reflect_top(&mut self) {
        if self.position.y - self.radius < 0.0 {
            self.position.y = self.radius;
            if self.velocity.y < 0.0 {
                self.velocity.y = -self.velocity.y;
            }
        }
    }

    /// Wall check against y = size.y.
    pub fn reflect_bottom(&mut self, size: DVec2) {
        if self.position.y + self.radius > size.y {
            self.position.y = size.y - self.radius;
            if self.velocity.y > 0.0 {
                self.velocity.y = -self.velocity.y;
            }
        }
    }

    /// Wall check against x = 0.
    pub fn reflect_left(&mut self) {
        if self.position.x - self.radius < 0.0 {
            self.position.x = self.radius;
            if self.velocity.x < 0.0 {
                self.velocity.x = -self.velocity.x;
            }
        }
    }

    /// Wall check against x = size.x.
    pub fn reflect_right(&mut self, size: DVec2) {
        if self.position.x + self.radius > size.x {
            self.position.x = size.x - self.radius;
            if self.velocity.x > 0.0 {
                self.velocity.x = -self.velocity.x;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_linear() {
        let mut p = Particle::new(DVec2::new(10.0, 20.0), DVec2::new(3.0, -4.0), Species::X);
        p.advance(2.0);
        assert_eq!(p.position, DVec2::new(16.0, 12.0));
    }

    #[test]
    fn change_species_recomputes_radius_and_mass() {
        let mut p = Particle::new(DVec2::ZERO, DVec2::ZERO, Species::A);
        assert_eq!(p.radius(), Species::A.radius());
        p.change_species(Species::C);
        assert_eq!(p.species(), Species::C);
        assert_eq!(p.radius(), Species::C.radius());
        assert_eq!(p.mass_amu(), Species::C.mass_amu());
    }

    #[test]
    fn kinetic_energy_uses_true_mass() {
        let p = Particle::new(DVec2::ZERO, DVec2::new(3.0, 4.0), Species::B);
        let expected = Species::B.mass_kg() * 25.0 / 2.0;
        assert!((p.kinetic_energy() - expected).abs() < expected * 1e-12);
    }

    #[test]
    fn left_wall_clamps_and_flips() {
        // A particle whose edge crossed the left wall ends up exactly on it
        // with the x velocity reversed.
        let r = Species::A.radius();
        let mut p = Particle::new(DVec2::new(r - 1.0, 50.0), DVec2::new(-5.0, 0.0), Species::A);
        p.advance(0.001);
        p.reflect_left();
        assert_eq!(p.position.x, r);
        assert_eq!(p.velocity.x, 5.0);
        assert_eq!(p.velocity.y, 0.0);
    }

    #[test]
    fn inbound_particle_is_clamped_but_not_reflipped() {
        // Already moving back inside: position still out of bounds, velocity
        // must keep its sign.
        let r = Species::B.radius();
        let mut p = Particle::new(DVec2::new(r - 0.5, 10.0), DVec2::new(2.0, 0.0), Species::B);
        p.reflect_left();
        assert_eq!(p.position.x, r);
        assert_eq!(p.velocity.x, 2.0);
    }

    #[test]
    fn all_four_walls_clamp() {
        let size = DVec2::new(100.0, 80.0);
        let r = Species::X.radius();

        let mut p = Particle::new(DVec2::new(50.0, -1.0), DVec2::new(0.0, -1.0), Species::X);
        p.reflect_top();
        assert_eq!(p.position.y, r);
        assert_eq!(p.velocity.y, 1.0);

        let mut p = Particle::new(DVec2::new(50.0, 81.0), DVec2::new(0.0, 1.0), Species::X);
        p.reflect_bottom(size);
        assert_eq!(p.position.y, size.y - r);
        assert_eq!(p.velocity.y, -1.0);

        let mut p = Particle::new(DVec2::new(101.0, 40.0), DVec2::new(1.0, 0.0), Species::X);
        p.reflect_right(size);
        assert_eq!(p.position.x, size.x - r);
        assert_eq!(p.velocity.x, -1.0);
    }
}
