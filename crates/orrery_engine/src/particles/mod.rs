//! CPU particle pool
//!
//! A fixed-size pool of particles that drift from a spawn point and respawn there
//! when their life runs out. Nothing is ever allocated or freed after construction:
//! a dead particle is recycled in place during [`ParticlePool::update`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::foundation::math::{Vec3, Vec4};

/// Single particle slot
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// World-space position
    pub position: Vec3,
    /// Units per second
    pub velocity: Vec3,
    /// Draw color
    pub color: Vec4,
    /// Seconds left before respawn
    pub life: f32,
}

impl Particle {
    /// Particle resting at `position` with no velocity and no life left
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            life: 0.0,
        }
    }
}

/// Fixed-capacity particle pool
///
/// The random source is a type parameter so tests and reproducible runs can use a
/// seeded generator.
#[derive(Debug, Clone)]
pub struct ParticlePool<R: Rng = StdRng> {
    particles: Vec<Particle>,
    spawn_position: Vec3,
    rng: R,
}

impl ParticlePool<StdRng> {
    /// Pool driven by a `StdRng` seeded with `seed`
    pub fn seeded(capacity: usize, spawn_position: Vec3, seed: u64) -> Self {
        Self::new(capacity, spawn_position, StdRng::seed_from_u64(seed))
    }

    /// Pool driven by an entropy-seeded `StdRng`
    pub fn from_entropy(capacity: usize, spawn_position: Vec3) -> Self {
        Self::new(capacity, spawn_position, StdRng::from_entropy())
    }
}

impl<R: Rng> ParticlePool<R> {
    /// Allocate `capacity` particles at the spawn position
    ///
    /// # Arguments
    /// * `capacity` - Number of particles, fixed for the pool's lifetime
    /// * `spawn_position` - Where particles start and respawn
    /// * `rng` - Source for velocities and lifetimes
    pub fn new(capacity: usize, spawn_position: Vec3, mut rng: R) -> Self {
        let particles = (0..capacity)
            .map(|_| {
                let mut particle = Particle::at(spawn_position);
                randomize(&mut particle, &mut rng);
                particle
            })
            .collect();

        log::debug!(
            "Created particle pool: {} particles at {:?}",
            capacity,
            spawn_position
        );

        Self {
            particles,
            spawn_position,
            rng,
        }
    }

    /// Advance every particle by `dt` seconds
    ///
    /// Particles whose life drops to zero or below are moved back to the spawn
    /// position with a fresh velocity and life.
    pub fn update(&mut self, dt: f32) {
        let mut respawned = 0usize;
        for particle in &mut self.particles {
            particle.position += particle.velocity * dt;
            particle.life -= dt;
            if particle.life <= 0.0 {
                particle.position = self.spawn_position;
                randomize(particle, &mut self.rng);
                respawned += 1;
            }
        }
        log::trace!("Particle update dt={dt}: {respawned} respawned");
    }

    /// Number of particles; never changes after construction
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True for a zero-capacity pool
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Read-only iteration for rendering
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// All particles as a slice
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Slot-level mutable access; the slice cannot grow or shrink the pool
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Position particles spawn at
    pub fn spawn_position(&self) -> Vec3 {
        self.spawn_position
    }
}

impl<'a, R: Rng> IntoIterator for &'a ParticlePool<R> {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Velocity components in [-0.25, 0.25), life in [0, 1)
fn randomize<R: Rng>(particle: &mut Particle, rng: &mut R) {
    particle.velocity = Vec3::new(
        (rng.gen::<f32>() - 0.5) * 0.5,
        (rng.gen::<f32>() - 0.5) * 0.5,
        (rng.gen::<f32>() - 0.5) * 0.5,
    );
    particle.life = rng.gen::<f32>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spawn() -> Vec3 {
        Vec3::new(-0.19, 0.90, 0.0)
    }

    #[test]
    fn test_initial_particles_at_spawn() {
        let pool = ParticlePool::seeded(64, spawn(), 1);
        assert_eq!(pool.len(), 64);
        for particle in &pool {
            assert_eq!(particle.position, spawn());
            assert!((0.0..1.0).contains(&particle.life));
            for component in particle.velocity.iter() {
                assert!((-0.25..0.25).contains(component));
            }
            assert_eq!(particle.color, Vec4::new(1.0, 1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn test_life_countdown_and_respawn() {
        let mut pool = ParticlePool::seeded(3, spawn(), 9);
        for particle in pool.particles_mut() {
            particle.position = Vec3::new(5.0, 5.0, 5.0);
            particle.velocity = Vec3::zeros();
            particle.life = 1.2;
        }

        pool.update(0.5);
        for particle in pool.iter() {
            assert_relative_eq!(particle.life, 0.7, epsilon = 1e-6);
            assert_eq!(particle.position, Vec3::new(5.0, 5.0, 5.0));
        }

        pool.update(0.5);
        for particle in pool.iter() {
            assert_relative_eq!(particle.life, 0.2, epsilon = 1e-6);
        }

        pool.update(0.5);
        for particle in pool.iter() {
            assert_eq!(particle.position, spawn());
            assert!((0.0..1.0).contains(&particle.life));
        }
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_exact_zero_life_respawns() {
        let mut pool = ParticlePool::seeded(1, spawn(), 3);
        pool.particles_mut()[0] = Particle {
            life: 0.25,
            ..Particle::at(Vec3::new(1.0, 2.0, 3.0))
        };

        pool.update(0.25);
        assert_eq!(pool.iter().next().map(|p| p.position), Some(spawn()));
    }

    #[test]
    fn test_motion_integrates_velocity() {
        let mut pool = ParticlePool::seeded(1, Vec3::zeros(), 5);
        pool.particles_mut()[0].velocity = Vec3::new(0.2, -0.1, 0.0);
        pool.particles_mut()[0].life = 10.0;

        pool.update(0.5);
        let particle = &pool.particles_mut()[0];
        assert_relative_eq!(particle.position, Vec3::new(0.1, -0.05, 0.0), epsilon = 1e-6);
        assert_relative_eq!(particle.life, 9.5, epsilon = 1e-6);
    }

    #[test]
    fn test_count_and_life_invariants_hold() {
        let mut pool = ParticlePool::seeded(10_000, spawn(), 42);
        for step in 0..200 {
            let dt = if step % 2 == 0 { 0.016 } else { 0.1 };
            pool.update(dt);
            assert_eq!(pool.len(), 10_000);
        }
        assert!(pool.iter().all(|p| p.life < 1.0));
    }

    #[test]
    fn test_zero_dt_changes_nothing_for_live_particles() {
        let mut pool = ParticlePool::seeded(32, spawn(), 11);
        for particle in pool.particles_mut() {
            particle.life = 0.5;
        }
        let before: Vec<Particle> = pool.iter().cloned().collect();

        pool.update(0.0);
        let after: Vec<Particle> = pool.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = ParticlePool::seeded(100, spawn(), 1234);
        let mut b = ParticlePool::seeded(100, spawn(), 1234);
        for _ in 0..50 {
            a.update(0.05);
            b.update(0.05);
        }
        assert!(a.iter().eq(b.iter()));

        let c = ParticlePool::seeded(100, spawn(), 4321);
        let d = ParticlePool::seeded(100, spawn(), 1234);
        assert!(!c.iter().eq(d.iter()));
    }

    #[test]
    fn test_empty_pool() {
        let mut pool = ParticlePool::seeded(0, spawn(), 0);
        pool.update(1.0);
        assert!(pool.is_empty());
        assert_eq!(pool.iter().count(), 0);
    }
}
