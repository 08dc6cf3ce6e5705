//! Uniform-by-area random points on a mesh surface.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Mesh, Point3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub point: Point3,
    pub normal: Vec3,
    pub triangle: usize,
}

/// Source of random surface points, used by the random mapping rule.
pub trait SurfaceSampler {
    /// A point uniformly distributed over the area of `mesh`, or `None` when
    /// the mesh has no area.
    fn select_random_point(&mut self, mesh: &Mesh) -> Option<SurfaceSample>;
}

/// Picks a triangle with probability proportional to its area, then a
/// uniform point inside it.
#[derive(Debug, Clone)]
pub struct AreaWeightedSampler<R> {
    rng: R,
}

impl AreaWeightedSampler<StdRng> {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AreaWeightedSampler<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SurfaceSampler for AreaWeightedSampler<R> {
    fn select_random_point(&mut self, mesh: &Mesh) -> Option<SurfaceSample> {
        sample_surface_point(mesh, &mut self.rng)
    }
}

pub fn sample_surface_point<R: Rng + ?Sized>(mesh: &Mesh, rng: &mut R) -> Option<SurfaceSample> {
    let cumsum = mesh.area_cumsum();
    let total = mesh.total_area();
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    let target = rng.random::<f64>() * total;
    let triangle = cumsum.partition_point(|&c| c <= target).min(cumsum.len() - 1);
    let normal = mesh.normal(triangle)?;
    let [a, b, c] = mesh.triangle(triangle)?.positions;

    let r1: f64 = rng.random();
    let r2: f64 = rng.random();
    let sqrt_r1 = r1.sqrt();
    let weights = [1.0 - sqrt_r1, sqrt_r1 * (1.0 - r2), sqrt_r1 * r2];
    Some(SurfaceSample {
        point: Point3::weighted(weights, [a, b, c]),
        normal,
        triangle,
    })
}
