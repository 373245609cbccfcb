use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of fireflies in the scene.
pub const FIREFLY_COUNT: usize = 30;

/// Half-width of the square the fireflies hover over, centred on the origin.
const HALF_EXTENT: f32 = 2.0;
/// Maximum hover height.
const MAX_HEIGHT: f32 = 2.0;

/// One particle: where it hovers and how large it draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firefly {
    pub position: Vec3,
    /// Size multiplier in `[0, 1)`; also scales the vertical bob.
    pub scale: f32,
}

/// Fixed particle set, generated once and never mutated.
#[derive(Debug, Clone)]
pub struct FireflySet {
    particles: Vec<Firefly>,
}

impl FireflySet {
    /// Scatter `count` fireflies: `x, z` in `[-2, 2)`, `y` in `[0, 2)`,
    /// scale in `[0, 1)`.
    pub fn generate<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let particles = (0..count)
            .map(|_| {
                let scale = rng.gen_range(0.0..1.0);
                let x = (rng.gen_range(0.0..1.0) - 0.5) * HALF_EXTENT * 2.0;
                let y = rng.gen_range(0.0..1.0) * MAX_HEIGHT;
                let z = (rng.gen_range(0.0..1.0) - 0.5) * HALF_EXTENT * 2.0;
                Firefly {
                    position: Vec3::new(x, y, z),
                    scale,
                }
            })
            .collect();
        Self { particles }
    }

    /// Reproducible set for a given seed.
    pub fn from_seed(count: usize, seed: u64) -> Self {
        Self::generate(count, &mut StdRng::seed_from_u64(seed))
    }

    /// Fresh set from the thread RNG.
    pub fn random(count: usize) -> Self {
        Self::generate(count, &mut rand::thread_rng())
    }

    pub fn particles(&self) -> &[Firefly] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
