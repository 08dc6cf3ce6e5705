//! Build-time diagnostics for meshes and their spatial indices.
//!
//! A [`MeshDiagnostics`] is assembled once when a [`Mesh`](super::Mesh) is
//! built. It reports input composition, numerically unusable triangles and
//! how well the octree managed to distribute triangles.
//!
//! ```ignore
//! let mesh = Mesh::build("cortex", &polygons)?;
//! let diag = mesh.diagnostics();
//! if !diag.is_clean() {
//!     log::warn!("{}", diag.summary());
//! }
//! ```

use std::fmt;

use super::metrics::TimingReport;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshDiagnostics {
    /// Number of input polygons (triangles and quads).
    pub polygon_count: usize,

    /// Number of quads among the input polygons.
    pub quad_count: usize,

    /// Number of triangles after splitting quads.
    pub triangle_count: usize,

    /// Triangles with zero area in 3D or UV space.
    ///
    /// They stay in the mesh so triangle indices remain aligned with the
    /// input, but closest-point and UV queries never return them.
    pub degenerate_triangle_count: usize,

    /// Total surface area over all triangles.
    pub total_area: f64,

    pub octree_node_count: usize,

    /// Deepest octree level that received a node.
    pub octree_depth_reached: u8,

    /// Triangles that straddle the root split and could not be pushed down.
    ///
    /// A large share here makes nearest-point queries degrade towards a scan.
    pub octree_root_triangle_count: usize,

    pub quadtree_node_count: usize,

    /// Optional timing of the build phases, populated with `engine_metrics`.
    pub timing: Option<TimingReport>,

    pub warnings: Vec<String>,
}

impl MeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no degenerate triangles were seen and nothing was flagged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degenerate_triangle_count == 0 && self.warnings.is_empty()
    }

    /// Fraction of triangles stored at the octree root.
    #[must_use]
    pub fn root_share(&self) -> f64 {
        if self.triangle_count == 0 {
            0.0
        } else {
            self.octree_root_triangle_count as f64 / self.triangle_count as f64
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Single-line summary for logging.
    ///
    /// Format: `"P:{polygons} T:{triangles} octree:{nodes}/{depth} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "P:{} T:{} octree:{}/{}",
            self.polygon_count, self.triangle_count, self.octree_node_count, self.octree_depth_reached
        )];
        if self.quad_count > 0 {
            parts.push(format!("quads:{}", self.quad_count));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.octree_root_triangle_count > 0 {
            parts.push(format!("root:{}", self.octree_root_triangle_count));
        }
        parts.join(" ")
    }
}

impl fmt::Display for MeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Polygons: {} ({} quads)", self.polygon_count, self.quad_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Area: {:.6}", self.total_area)?;
        writeln!(
            f,
            "  Octree: {} nodes, depth {}, {} at root",
            self.octree_node_count, self.octree_depth_reached, self.octree_root_triangle_count
        )?;
        writeln!(f, "  UV quadtree: {} nodes", self.quadtree_node_count)?;
        if self.degenerate_triangle_count > 0 {
            writeln!(f, "  Degenerate triangles: {}", self.degenerate_triangle_count)?;
        }
        if let Some(timing) = &self.timing {
            writeln!(f, "  Build time: {:.3} ms", timing.total_ms())?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        Ok(())
    }
}
