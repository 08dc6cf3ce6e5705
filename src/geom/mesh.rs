//! Immutable triangle mesh with a 3D octree, a UV quadtree and an eager
//! per-triangle plane-frame cache.
//!
//! All queries take `&self`; a built [`Mesh`] is `Send + Sync` and can be
//! shared across threads behind an `Arc`.

use serde::{Deserialize, Serialize};

use super::kernel::{self, Barycentric};
use super::metrics::{EngineMetrics, TimingBucket};
use super::{MeshDiagnostics, Octree, Point3, Tolerance, Transform, UvPoint, UvQuadtree, Vec3};

// ─────────────────────────────────────────────────────────────────────────────
// Input
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3,
    pub uv: UvPoint,
}

impl Vertex {
    #[must_use]
    pub const fn new(position: Point3, uv: UvPoint) -> Self {
        Self { position, uv }
    }
}

/// A mesh face. Quads are split into `(0, 1, 2)` and `(0, 2, 3)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Polygon {
    Triangle([Vertex; 3]),
    Quad([Vertex; 4]),
}

impl Polygon {
    fn vertices(&self) -> &[Vertex] {
        match self {
            Self::Triangle(v) => v,
            Self::Quad(v) => v,
        }
    }

    fn split(&self) -> impl Iterator<Item = [Vertex; 3]> {
        let parts = match *self {
            Self::Triangle(v) => [Some(v), None],
            Self::Quad([a, b, c, d]) => [Some([a, b, c]), Some([a, c, d])],
        };
        parts.into_iter().flatten()
    }
}

impl TryFrom<&[Vertex]> for Polygon {
    type Error = usize;

    /// Fails with the offending vertex count.
    fn try_from(vertices: &[Vertex]) -> Result<Self, Self::Error> {
        match *vertices {
            [a, b, c] => Ok(Self::Triangle([a, b, c])),
            [a, b, c, d] => Ok(Self::Quad([a, b, c, d])),
            _ => Err(vertices.len()),
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh has no polygons")]
    Empty,

    #[error("polygon {index} has {vertex_count} vertices; only triangles and quads are supported")]
    InvalidPolygon { index: usize, vertex_count: usize },

    #[error("polygon {index} contains NaN or infinite coordinates")]
    NonFinite { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshOptions {
    /// Subdivision limit of the octree.
    pub octree_depth: u8,
    /// Fixed depth of the UV quadtree.
    pub quadtree_depth: u8,
    /// Edge tolerance for UV point-in-triangle tests.
    pub tolerance: Tolerance,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            octree_depth: Octree::DEFAULT_MAX_DEPTH,
            quadtree_depth: UvQuadtree::DEFAULT_DEPTH,
            tolerance: Tolerance::DEFAULT,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query results
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [Point3; 3],
    pub uvs: [UvPoint; 3],
    /// Index of the input polygon this triangle came from.
    pub polygon: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    pub point: Point3,
    pub triangle: usize,
    pub barycentric: Barycentric,
    /// Unit normal of the triangle the point lies on.
    pub normal: Vec3,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Point3,
    pub triangle: usize,
    /// Distance from the ray origin to `point`.
    pub distance: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Mesh
// ─────────────────────────────────────────────────────────────────────────────

/// Ray directions for the parity test: +Z, then oblique unit vectors with no
/// zero component.
const PARITY_DIRECTIONS: [Vec3; 4] = [
    Vec3::Z,
    Vec3::new(0.123_4, 0.234_5, 0.964_252_140_262_079),
    Vec3::new(-0.313_7, 0.157_1, 0.936_435_742_589_955),
    Vec3::new(0.271_8, -0.314_1, 0.909_651_554_167_858),
];

#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    triangles: Vec<Triangle>,
    frames: Vec<Transform>,
    normals: Vec<Option<Vec3>>,
    area_cumsum: Vec<f64>,
    octree: Octree,
    quadtree: UvQuadtree,
    options: MeshOptions,
    diagnostics: MeshDiagnostics,
}

impl Mesh {
    pub fn build(name: impl Into<String>, polygons: &[Polygon]) -> Result<Self, MeshError> {
        Self::build_with_options(name, polygons, MeshOptions::default())
    }

    pub fn build_with_options(
        name: impl Into<String>,
        polygons: &[Polygon],
        options: MeshOptions,
    ) -> Result<Self, MeshError> {
        Self::build_with_metrics(name, polygons, options, &mut EngineMetrics::default())
    }

    /// Builds from raw vertex lists, rejecting anything but triangles and quads.
    pub fn from_faces<F: AsRef<[Vertex]>>(
        name: impl Into<String>,
        faces: &[F],
        options: MeshOptions,
    ) -> Result<Self, MeshError> {
        let polygons = faces
            .iter()
            .enumerate()
            .map(|(index, face)| {
                Polygon::try_from(face.as_ref())
                    .map_err(|vertex_count| MeshError::InvalidPolygon { index, vertex_count })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::build_with_options(name, &polygons, options)
    }

    pub fn build_with_metrics(
        name: impl Into<String>,
        polygons: &[Polygon],
        options: MeshOptions,
        metrics: &mut EngineMetrics,
    ) -> Result<Self, MeshError> {
        let name = name.into();
        if polygons.is_empty() {
            return Err(MeshError::Empty);
        }

        let mut triangles = Vec::with_capacity(polygons.len() * 2);
        let mut quad_count = 0;
        for (index, polygon) in polygons.iter().enumerate() {
            let finite = polygon
                .vertices()
                .iter()
                .all(|v| v.position.is_finite() && v.uv.is_finite());
            if !finite {
                return Err(MeshError::NonFinite { index });
            }
            if matches!(polygon, Polygon::Quad(_)) {
                quad_count += 1;
            }
            triangles.extend(polygon.split().map(|corners| Triangle {
                positions: corners.map(|v| v.position),
                uvs: corners.map(|v| v.uv),
                polygon: index,
            }));
        }

        let positions: Vec<[Point3; 3]> = triangles.iter().map(|t| t.positions).collect();
        let uvs: Vec<[UvPoint; 3]> = triangles.iter().map(|t| t.uvs).collect();

        let octree = metrics
            .time(TimingBucket::OctreeBuild, || Octree::build(&positions, options.octree_depth))
            .ok_or(MeshError::Empty)?;
        let quadtree = metrics.time(TimingBucket::QuadtreeBuild, || {
            UvQuadtree::build(&uvs, options.quadtree_depth)
        });
        let frames = metrics.time(TimingBucket::FrameCache, || {
            positions
                .iter()
                .map(|[a, b, c]| kernel::plane_transform(*a, *b, *c))
                .collect::<Vec<_>>()
        });

        let mut diagnostics = MeshDiagnostics::new();
        let mut normals = Vec::with_capacity(triangles.len());
        let mut area_cumsum = Vec::with_capacity(triangles.len());
        let mut total = 0.0;
        for (index, tri) in triangles.iter().enumerate() {
            let [a, b, c] = tri.positions;
            let normal = kernel::triangle_normal(a, b, c);
            let [ua, ub, uc] = tri.uvs;
            let uv_flat = kernel::to_barycentric(ua, ua, ub, uc).is_none();
            if normal.is_none() || uv_flat {
                diagnostics.degenerate_triangle_count += 1;
                diagnostics.add_warning(format!(
                    "triangle {index} (polygon {}) has zero area in {}",
                    tri.polygon,
                    if normal.is_none() { "3D" } else { "UV space" }
                ));
                log::warn!("mesh '{name}': degenerate triangle {index}");
            }
            normals.push(normal);
            total += kernel::triangle_area(a, b, c);
            area_cumsum.push(total);
        }

        diagnostics.polygon_count = polygons.len();
        diagnostics.quad_count = quad_count;
        diagnostics.triangle_count = triangles.len();
        diagnostics.total_area = total;
        diagnostics.octree_node_count = octree.node_count();
        diagnostics.octree_depth_reached = octree.depth_reached();
        diagnostics.octree_root_triangle_count = octree.root_triangle_count();
        diagnostics.quadtree_node_count = quadtree.node_count();
        diagnostics.timing = metrics.end();

        log::debug!("mesh '{name}': {}", diagnostics.summary());

        Ok(Self {
            name,
            triangles,
            frames,
            normals,
            area_cumsum,
            octree,
            quadtree,
            options,
            diagnostics,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    /// Source polygon of triangle `index`.
    #[must_use]
    pub fn polygon_index(&self, index: usize) -> Option<usize> {
        self.triangles.get(index).map(|t| t.polygon)
    }

    /// Cached plane frame of triangle `index`.
    #[must_use]
    pub fn plane_frame(&self, index: usize) -> Option<&Transform> {
        self.frames.get(index)
    }

    #[must_use]
    pub fn normal(&self, index: usize) -> Option<Vec3> {
        self.normals.get(index).copied().flatten()
    }

    /// Running sum of triangle areas, in triangle order.
    #[must_use]
    pub fn area_cumsum(&self) -> &[f64] {
        &self.area_cumsum
    }

    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.area_cumsum.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub const fn octree(&self) -> &Octree {
        &self.octree
    }

    #[must_use]
    pub const fn quadtree(&self) -> &UvQuadtree {
        &self.quadtree
    }

    #[must_use]
    pub const fn options(&self) -> &MeshOptions {
        &self.options
    }

    #[must_use]
    pub const fn diagnostics(&self) -> &MeshDiagnostics {
        &self.diagnostics
    }

    /// Closest point on triangle `index` to `point`, using the cached frame.
    #[must_use]
    pub fn closest_point_on_triangle(&self, point: Point3, index: usize) -> Option<ClosestPoint> {
        let tri = self.triangles.get(index)?;
        let normal = self.normal(index)?;
        let hit = kernel::closest_point_on_triangle_in_frame(point, tri.positions, &self.frames[index])?;
        Some(ClosestPoint {
            point: hit.point,
            triangle: index,
            barycentric: hit.barycentric,
            normal,
            distance: hit.point.distance_to(point),
        })
    }

    /// Closest point on the mesh surface.
    ///
    /// `None` only when every triangle is degenerate.
    #[must_use]
    pub fn closest_point(&self, point: Point3) -> Option<ClosestPoint> {
        let (index, _) = self.octree.nearest(point, |index| {
            self.closest_point_on_triangle(point, index as usize)
                .map(|c| c.point.distance_squared_to(point))
        })?;
        self.closest_point_on_triangle(point, index as usize)
    }

    /// Nearest intersection of the ray `origin + t * direction`, `t >= 0`.
    #[must_use]
    pub fn raycast(&self, origin: Point3, direction: Vec3) -> Option<RayHit> {
        self.line_hits(origin, direction)
            .filter(|(_, hit)| hit.t >= 0.0)
            .min_by(|(_, a), (_, b)| a.t.total_cmp(&b.t))
            .map(|(triangle, hit)| RayHit {
                point: hit.point,
                triangle,
                distance: hit.t,
            })
    }

    /// Intersection of the line through `origin` along `normal`, in either
    /// direction, closest to `origin` and no farther than `max_distance`.
    #[must_use]
    pub fn project_along_normal(&self, origin: Point3, normal: Vec3, max_distance: f64) -> Option<RayHit> {
        self.line_hits(origin, normal)
            .filter(|(_, hit)| hit.t.abs() <= max_distance)
            .min_by(|(_, a), (_, b)| a.t.abs().total_cmp(&b.t.abs()))
            .map(|(triangle, hit)| RayHit {
                point: hit.point,
                triangle,
                distance: hit.t.abs(),
            })
    }

    fn line_hits(&self, origin: Point3, direction: Vec3) -> impl Iterator<Item = (usize, kernel::LineHit)> + '_ {
        self.octree
            .line_candidates(origin, direction)
            .into_iter()
            .filter_map(move |index| {
                let [a, b, c] = self.triangles[index as usize].positions;
                kernel::line_triangle_intersect(origin, direction, a, b, c).map(|hit| (index as usize, hit))
            })
    }

    /// Inside test by ray parity: cast a ray and count the triangles it crosses.
    ///
    /// The first ray goes along +Z. A ray that meets a triangle on an edge or
    /// a vertex cannot tell a crossing from a touch, so it is discarded and
    /// the next of a few fixed oblique directions is tried. If every direction
    /// grazes, the last one is counted with hits at equal distance merged.
    #[must_use]
    pub fn contains_point(&self, point: Point3) -> bool {
        let eps = self.options.tolerance.eps;
        let mut hits = Vec::new();
        for direction in PARITY_DIRECTIONS {
            hits.clear();
            let mut grazing = false;
            for (_, hit) in self.line_hits(point, direction) {
                if hit.t <= eps {
                    continue;
                }
                grazing |= hit.barycentric.iter().any(|w| w.abs() <= eps);
                hits.push(hit.t);
            }
            if !grazing {
                return hits.len() % 2 == 1;
            }
        }
        log::debug!("mesh '{}': every parity ray grazes an edge at {point:?}", self.name);
        hits.sort_by(f64::total_cmp);
        hits.dedup_by(|a, b| (*a - *b).abs() <= eps);
        hits.len() % 2 == 1
    }

    /// UV coordinate of the surface point closest to `point`.
    #[must_use]
    pub fn map_3d_point_to_uv(&self, point: Point3) -> Option<UvPoint> {
        let closest = self.closest_point(point)?;
        let uvs = self.triangles[closest.triangle].uvs;
        Some(UvPoint::weighted(closest.barycentric, uvs))
    }

    /// 3D point for `uv`, from the first candidate triangle containing it.
    #[must_use]
    pub fn map_uv_point_to_3d(&self, uv: UvPoint) -> Option<Point3> {
        self.quadtree.query(uv).into_iter().find_map(|index| {
            let tri = &self.triangles[index as usize];
            let [a, b, c] = tri.uvs;
            if !kernel::point_in_triangle_2d(uv, a, b, c, self.options.tolerance) {
                return None;
            }
            let l = kernel::to_barycentric(uv, a, b, c)?;
            let [p1, p2, p3] = tri.positions;
            Some(kernel::from_barycentric(l, p1, p2, p3))
        })
    }

    /// Maps each UV point to 3D, keeping positions aligned with the input.
    #[must_use]
    pub fn map_uv_points_to_3d(&self, uvs: &[UvPoint]) -> Vec<Option<Point3>> {
        uvs.iter().map(|uv| self.map_uv_point_to_3d(*uv)).collect()
    }

    /// Maps each UV point to 3D and drops the ones that hit no triangle.
    #[must_use]
    pub fn map_uv_points_to_3d_compact(&self, uvs: &[UvPoint]) -> Vec<Point3> {
        uvs.iter().filter_map(|uv| self.map_uv_point_to_3d(*uv)).collect()
    }

    /// Carries `point` to `target` through shared topology: barycentric
    /// coordinates of the closest point here, applied to the triangle with the
    /// same index on `target`.
    #[must_use]
    pub fn transfer_point(&self, target: &Self, point: Point3) -> Option<Point3> {
        let closest = self.closest_point(point)?;
        let [a, b, c] = target.triangles.get(closest.triangle)?.positions;
        Some(kernel::from_barycentric(closest.barycentric, a, b, c))
    }
}
