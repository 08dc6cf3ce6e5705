mod core;
mod diagnostics;
pub mod kernel;
mod mesh;
mod metrics;
mod octree;
mod quadtree;
mod sampling;

pub use core::{BBox, Point3, Tolerance, Transform, UvPoint, UvRect, Vec3};
pub use diagnostics::MeshDiagnostics;
pub use kernel::{Barycentric, LineHit, TrianglePoint};
pub use mesh::{ClosestPoint, Mesh, MeshError, MeshOptions, Polygon, RayHit, Triangle, Vertex};
pub use metrics::{EngineMetrics, TimingBucket, TimingReport};
pub use octree::Octree;
pub use quadtree::UvQuadtree;
pub use sampling::{AreaWeightedSampler, SurfaceSample, SurfaceSampler, sample_surface_point};

/// Total length of the polyline through `points`.
#[must_use]
pub fn path_length(points: &[Point3]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

#[cfg(test)]
mod tests;
