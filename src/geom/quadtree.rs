//! Fixed-depth quadtree over triangle UV coordinates.

use super::{UvPoint, UvRect};

const NONE: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct QuadNode {
    rect: UvRect,
    children: [u32; 4],
    triangles: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct UvQuadtree {
    nodes: Vec<QuadNode>,
    depth: u8,
}

impl UvQuadtree {
    pub const DEFAULT_DEPTH: u8 = 2;

    /// Builds a tree of exactly `depth` levels below the root covering the
    /// unit square and every UV coordinate in `triangles`.
    #[must_use]
    pub fn build(triangles: &[[UvPoint; 3]], depth: u8) -> Self {
        let rect = triangles
            .iter()
            .flatten()
            .fold(UvRect::UNIT, |r, uv| r.expand_point(*uv));

        let mut tree = Self { nodes: Vec::new(), depth };
        tree.subdivide(rect, depth);
        for (index, uvs) in triangles.iter().enumerate() {
            tree.insert(index as u32, uvs);
        }
        log::debug!(
            "uv quadtree: {} triangles in {} nodes, {} at root",
            triangles.len(),
            tree.nodes.len(),
            tree.nodes[0].triangles.len()
        );
        tree
    }

    fn subdivide(&mut self, rect: UvRect, depth: u8) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(QuadNode {
            rect,
            children: [NONE; 4],
            triangles: Vec::new(),
        });
        if depth > 0 {
            for (slot, quadrant) in rect.quadrants().into_iter().enumerate() {
                let child = self.subdivide(quadrant, depth - 1);
                self.nodes[index as usize].children[slot] = child;
            }
        }
        index
    }

    fn insert(&mut self, index: u32, uvs: &[UvPoint; 3]) {
        let mut current = 0usize;
        while let Some(child) = self.nodes[current]
            .children
            .iter()
            .copied()
            .filter(|&c| c != NONE)
            .find(|&c| uvs.iter().all(|uv| self.nodes[c as usize].rect.contains(*uv)))
        {
            current = child as usize;
        }
        self.nodes[current].triangles.push(index);
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    #[must_use]
    pub fn rect(&self) -> UvRect {
        self.nodes[0].rect
    }

    /// Triangles that may contain `uv`: those stored at every node whose
    /// rectangle contains the point. Exact containment is left to the caller.
    #[must_use]
    pub fn query(&self, uv: UvPoint) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = vec![0u32];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current as usize];
            if !node.rect.contains(uv) {
                continue;
            }
            out.extend_from_slice(&node.triangles);
            stack.extend(node.children.iter().rev().copied().filter(|&c| c != NONE));
        }
        out
    }
}
