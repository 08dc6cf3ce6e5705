//! A named mesh taking part in a mapping chain.

use std::sync::Arc;

use crate::geom::{ClosestPoint, Mesh, Point3, UvPoint, Vec3};

use super::MappingFailure;

/// Mesh plus the metric scale of its UV map.
///
/// Layers are cheap to clone; the mesh is shared.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    mesh: Arc<Mesh>,
    uv_scaling_factor: f64,
}

impl Layer {
    /// Wraps `mesh`, named after it, and measures its UV scaling factor.
    #[must_use]
    pub fn new(mesh: impl Into<Arc<Mesh>>) -> Self {
        let mesh = mesh.into();
        Self::named(mesh.name().to_string(), mesh)
    }

    #[must_use]
    pub fn named(name: impl Into<String>, mesh: impl Into<Arc<Mesh>>) -> Self {
        let mesh = mesh.into();
        let uv_scaling_factor = uv_scaling_factor(&mesh);
        Self {
            name: name.into(),
            mesh,
            uv_scaling_factor,
        }
    }

    #[must_use]
    pub const fn with_uv_scaling_factor(mut self, factor: f64) -> Self {
        self.uv_scaling_factor = factor;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    #[must_use]
    pub fn shared_mesh(&self) -> Arc<Mesh> {
        Arc::clone(&self.mesh)
    }

    /// Factor turning UV distances on this layer into metric distances.
    #[must_use]
    pub const fn uv_scaling_factor(&self) -> f64 {
        self.uv_scaling_factor
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries as mapping steps
    // ─────────────────────────────────────────────────────────────────────

    pub fn closest_point(&self, point: Point3) -> Result<ClosestPoint, MappingFailure> {
        self.mesh.closest_point(point).ok_or(MappingFailure::Degenerate)
    }

    /// Point where the line through `origin` along `normal` meets this layer.
    pub fn project(&self, origin: Point3, normal: Vec3, max_distance: f64) -> Result<Point3, MappingFailure> {
        self.mesh
            .project_along_normal(origin, normal, max_distance)
            .map(|hit| hit.point)
            .ok_or(MappingFailure::NoIntersection)
    }

    pub fn map_3d_point_to_uv(&self, point: Point3) -> Result<UvPoint, MappingFailure> {
        self.mesh.map_3d_point_to_uv(point).ok_or(MappingFailure::Degenerate)
    }

    pub fn map_uv_point_to_3d(&self, uv: UvPoint) -> Result<Point3, MappingFailure> {
        self.mesh.map_uv_point_to_3d(uv).ok_or(MappingFailure::EmptyUvResolution)
    }

    #[must_use]
    pub fn contains_point(&self, point: Point3) -> bool {
        self.mesh.contains_point(point)
    }

    /// Track from `from` to `to` following this layer's UV space.
    ///
    /// Both ends are mapped to UV, `steps` evenly spaced UV points (ends
    /// included) are lifted back to 3D, and samples falling outside the UV
    /// map are dropped.
    pub fn interpolate_uv_track(&self, from: Point3, to: Point3, steps: usize) -> Result<Vec<Point3>, MappingFailure> {
        let start = self.map_3d_point_to_uv(from)?;
        let end = self.map_3d_point_to_uv(to)?;
        let uvs: Vec<UvPoint> = match steps {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let last = (steps - 1) as f64;
                (0..steps).map(|i| start.lerp(end, i as f64 / last)).collect()
            }
        };
        Ok(self.mesh.map_uv_points_to_3d_compact(&uvs))
    }
}

impl From<Mesh> for Layer {
    fn from(mesh: Mesh) -> Self {
        Self::new(mesh)
    }
}

/// Mean ratio of 3D to UV length over the first edge of each triangle.
///
/// Triangles whose first UV edge has no length are skipped; a mesh without
/// any usable edge gets a factor of 1.
fn uv_scaling_factor(mesh: &Mesh) -> f64 {
    let eps = mesh.options().tolerance.eps;
    let (sum, count) = mesh
        .triangles()
        .iter()
        .filter_map(|tri| {
            let uv_len = tri.uvs[0].distance_to(tri.uvs[1]);
            (uv_len > eps).then(|| tri.positions[0].distance_to(tri.positions[1]) / uv_len)
        })
        .fold((0.0, 0usize), |(sum, count), ratio| (sum + ratio, count + 1));
    if count == 0 {
        log::warn!("layer '{}': no usable uv edge, scaling factor defaults to 1", mesh.name());
        1.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Polygon, Tolerance, Vertex};

    fn square(size: f64, z: f64) -> Mesh {
        let v = |x: f64, y: f64| Vertex::new(Point3::new(x * size, y * size, z), UvPoint::new(x, y));
        Mesh::build(
            "square",
            &[Polygon::Quad([v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)])],
        )
        .expect("mesh")
    }

    #[test]
    fn scaling_factor_matches_uniform_scale() {
        let layer = Layer::new(square(4.0, 0.0));
        assert!(Tolerance::new(1e-12).approx_eq_f64(layer.uv_scaling_factor(), 4.0));
        assert_eq!(layer.name(), "square");

        let overridden = layer.with_uv_scaling_factor(2.5);
        assert_eq!(overridden.uv_scaling_factor(), 2.5);
    }

    #[test]
    fn collapsed_uvs_fall_back_to_unit_factor() {
        let v = |x: f64, y: f64| Vertex::new(Point3::new(x, y, 0.0), UvPoint::new(0.5, 0.5));
        let mesh = Mesh::build("flat", &[Polygon::Triangle([v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)])]).expect("mesh");
        assert_eq!(Layer::new(mesh).uv_scaling_factor(), 1.0);
    }

    #[test]
    fn uv_track_is_inclusive_and_on_surface() {
        let layer = Layer::named("cortex", square(2.0, 1.0));
        let track = layer
            .interpolate_uv_track(Point3::new(0.2, 0.2, 1.0), Point3::new(1.8, 1.0, 1.0), 5)
            .expect("track");
        assert_eq!(track.len(), 5);
        assert!(track[0].distance_to(Point3::new(0.2, 0.2, 1.0)) < 1e-9);
        assert!(track[4].distance_to(Point3::new(1.8, 1.0, 1.0)) < 1e-9);
        assert!(track.iter().all(|p| (p.z - 1.0).abs() < 1e-12));
        assert!(track[2].distance_to(Point3::new(1.0, 0.6, 1.0)) < 1e-9);
    }

    #[test]
    fn uv_track_edge_step_counts() {
        let layer = Layer::new(square(1.0, 0.0));
        let a = Point3::new(0.1, 0.1, 0.0);
        let b = Point3::new(0.9, 0.9, 0.0);
        assert!(layer.interpolate_uv_track(a, b, 0).expect("track").is_empty());
        assert_eq!(layer.interpolate_uv_track(a, b, 1).expect("track").len(), 1);
    }

    #[test]
    fn failures_carry_their_reason() {
        let layer = Layer::new(square(1.0, 0.0));
        assert_eq!(
            layer.map_uv_point_to_3d(UvPoint::new(3.0, 3.0)),
            Err(MappingFailure::EmptyUvResolution)
        );
        assert_eq!(
            layer.project(Point3::new(0.5, 0.5, 1.0), Vec3::X, f64::INFINITY),
            Err(MappingFailure::NoIntersection)
        );
        assert!(layer.project(Point3::new(0.3, 0.6, 1.0), Vec3::Z, 0.5).is_err());
        assert!(layer.project(Point3::new(0.3, 0.6, 1.0), Vec3::Z, 1.0).is_ok());
    }
}
