//! Bounding-volume octree over mesh triangles.
//!
//! Nodes live in a flat arena and reference their parent and children by
//! index. A triangle is stored in exactly one node: the deepest node along its
//! insertion path whose bounds contain all three corners. Subdivision stops
//! when a node's remaining depth reaches zero.

use super::{BBox, Point3, Vec3};

const NONE: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct OctreeNode {
    bounds: BBox,
    center: Point3,
    parent: u32,
    children: [u32; 8],
    triangles: Vec<u32>,
    depth_remaining: u8,
}

impl OctreeNode {
    fn new(bounds: BBox, parent: u32, depth_remaining: u8) -> Self {
        Self {
            bounds,
            center: bounds.center(),
            parent,
            children: [NONE; 8],
            triangles: Vec::new(),
            depth_remaining,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    max_depth: u8,
}

impl Octree {
    pub const DEFAULT_MAX_DEPTH: u8 = 4;

    /// Builds the tree over `triangles`. Returns `None` when there is nothing to index.
    #[must_use]
    pub fn build(triangles: &[[Point3; 3]], max_depth: u8) -> Option<Self> {
        let bounds = BBox::from_points(triangles.iter().flatten().copied())?;
        let mut tree = Self {
            nodes: vec![OctreeNode::new(bounds, NONE, max_depth)],
            max_depth,
        };
        for (index, corners) in triangles.iter().enumerate() {
            tree.insert(index as u32, corners);
        }
        log::debug!(
            "octree: {} triangles in {} nodes (max depth {max_depth})",
            triangles.len(),
            tree.nodes.len()
        );
        Some(tree)
    }

    fn insert(&mut self, index: u32, corners: &[Point3; 3]) {
        let mut current = 0usize;
        loop {
            let node = &self.nodes[current];
            if node.depth_remaining == 0 {
                break;
            }
            let fitting = (0..8).find(|&octant| {
                let sub = node.bounds.octant(octant);
                corners.iter().all(|c| sub.contains_point(*c))
            });
            let Some(octant) = fitting else {
                break;
            };
            let child = node.children[octant];
            current = if child == NONE {
                let sub = node.bounds.octant(octant);
                let depth = node.depth_remaining - 1;
                let created = self.nodes.len() as u32;
                self.nodes.push(OctreeNode::new(sub, current as u32, depth));
                self.nodes[current].children[octant] = created;
                created as usize
            } else {
                child as usize
            };
        }
        self.nodes[current].triangles.push(index);
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn bounds(&self) -> BBox {
        self.nodes[0].bounds
    }

    #[must_use]
    pub const fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Deepest level that holds a node (the root is level 0).
    #[must_use]
    pub fn depth_reached(&self) -> u8 {
        self.nodes
            .iter()
            .map(|n| self.max_depth - n.depth_remaining)
            .max()
            .unwrap_or(0)
    }

    /// Triangles stored at the root because they straddle its first split.
    #[must_use]
    pub fn root_triangle_count(&self) -> usize {
        self.nodes[0].triangles.len()
    }

    /// Index of the node holding `triangle`, if any.
    #[must_use]
    pub fn node_of(&self, triangle: u32) -> Option<usize> {
        self.nodes.iter().position(|n| n.triangles.contains(&triangle))
    }

    /// Triangles stored directly at `node`.
    #[must_use]
    pub fn node_triangles(&self, node: usize) -> &[u32] {
        self.nodes.get(node).map_or(&[], |n| n.triangles.as_slice())
    }

    #[must_use]
    pub fn node_bounds(&self, node: usize) -> Option<BBox> {
        self.nodes.get(node).map(|n| n.bounds)
    }

    /// Level of `node` below the root (the root is level 0).
    #[must_use]
    pub fn node_level(&self, node: usize) -> Option<u8> {
        self.nodes.get(node).map(|n| self.max_depth - n.depth_remaining)
    }

    /// Triangles stored at `node` and at every ancestor of it.
    #[must_use]
    pub fn upward_triangles(&self, node: usize) -> Vec<u32> {
        let mut out = Vec::new();
        let mut current = node as u32;
        while current != NONE {
            let n = &self.nodes[current as usize];
            out.extend_from_slice(&n.triangles);
            current = n.parent;
        }
        out
    }

    /// Heuristic seed set for the nearest triangle to `point`.
    ///
    /// Starts from the node whose center is closest to `point`, then adds the
    /// upward lists of every node whose center lies within that distance plus
    /// the half diagonal of the closest node. Sorted and deduplicated.
    ///
    /// The set usually holds the nearest triangle but is not guaranteed to;
    /// [`Octree::nearest`] uses it as a starting bound and returns the exact
    /// result.
    #[must_use]
    pub fn nearest_candidates(&self, point: Point3) -> Vec<u32> {
        let mut closest = 0usize;
        let mut closest_d2 = point.distance_squared_to(self.nodes[0].center);
        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            let d2 = point.distance_squared_to(node.center);
            if d2 < closest_d2 {
                closest = i;
                closest_d2 = d2;
            }
        }

        let node = &self.nodes[closest];
        let radius = closest_d2.sqrt() + node.center.distance_to(node.bounds.min);
        let radius2 = radius * radius;

        let mut candidates = self.upward_triangles(closest);
        for (i, other) in self.nodes.iter().enumerate() {
            if i != closest && point.distance_squared_to(other.center) < radius2 {
                candidates.extend(self.upward_triangles(i));
            }
        }
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }

    /// Exact nearest triangle under the metric `distance_sq`.
    ///
    /// The candidate set seeds the search radius; remaining nodes are visited
    /// only while their bounds are closer than the best distance found, so
    /// the result matches a scan over all triangles. `distance_sq` returns
    /// `None` for triangles that cannot produce a point.
    pub fn nearest<F>(&self, point: Point3, mut distance_sq: F) -> Option<(u32, f64)>
    where
        F: FnMut(u32) -> Option<f64>,
    {
        let candidates = self.nearest_candidates(point);
        let mut best: Option<(u32, f64)> = None;
        let mut consider = |index: u32, best: &mut Option<(u32, f64)>| {
            if let Some(d2) = distance_sq(index) {
                if best.is_none_or(|(_, b)| d2 < b) {
                    *best = Some((index, d2));
                }
            }
        };
        for &index in &candidates {
            consider(index, &mut best);
        }
        log::trace!("octree: {} candidate triangles seeded", candidates.len());

        let mut stack = vec![0u32];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current as usize];
            if best.is_some_and(|(_, b)| node.bounds.distance_squared_to_point(point) > b) {
                continue;
            }
            for &index in &node.triangles {
                if candidates.binary_search(&index).is_err() {
                    consider(index, &mut best);
                }
            }
            stack.extend(node.children.iter().copied().filter(|&c| c != NONE));
        }
        best
    }

    /// Triangles whose node bounds are crossed by the infinite line through
    /// `origin` along `direction`.
    #[must_use]
    pub fn line_candidates(&self, origin: Point3, direction: Vec3) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = vec![0u32];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current as usize];
            if !line_crosses_box(node.bounds, origin, direction) {
                continue;
            }
            out.extend_from_slice(&node.triangles);
            stack.extend(node.children.iter().copied().filter(|&c| c != NONE));
        }
        out
    }
}

/// Slab test for an unbounded line; boxes are padded slightly so flat
/// boxes and grazing lines are not lost to rounding.
fn line_crosses_box(bounds: BBox, origin: Point3, direction: Vec3) -> bool {
    let size = bounds.min.distance_to(bounds.max);
    let pad = 1e-9 * size.max(1.0);
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    let axes = [
        (origin.x, direction.x, bounds.min.x, bounds.max.x),
        (origin.y, direction.y, bounds.min.y, bounds.max.y),
        (origin.z, direction.z, bounds.min.z, bounds.max.z),
    ];
    for (o, d, lo, hi) in axes {
        let (lo, hi) = (lo - pad, hi + pad);
        if d.abs() < f64::EPSILON {
            if o < lo || o > hi {
                return false;
            }
            continue;
        }
        let (a, b) = ((lo - o) / d, (hi - o) / d);
        t_min = t_min.max(a.min(b));
        t_max = t_max.min(a.max(b));
        if t_min > t_max {
            return false;
        }
    }
    true
}
