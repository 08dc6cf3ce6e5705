use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::support::{bumpy_grid, vertex};
use crate::geom::kernel::closest_point_on_triangle;
use crate::geom::{Mesh, MeshOptions, Point3, Polygon};

fn brute_force(mesh: &Mesh, p: Point3) -> f64 {
    mesh.triangles()
        .iter()
        .filter_map(|t| {
            let [a, b, c] = t.positions;
            closest_point_on_triangle(p, a, b, c)
        })
        .map(|hit| hit.point.distance_to(p))
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn closest_point_matches_brute_force() {
    let mesh = bumpy_grid(12, 4.0);
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..200 {
        let p = Point3::new(
            rng.random_range(-1.0..5.0),
            rng.random_range(-1.0..5.0),
            rng.random_range(-2.0..2.0),
        );
        let found = mesh.closest_point(p).expect("closest");
        let expected = brute_force(&mesh, p);
        assert!(
            (found.distance - expected).abs() < 1e-9,
            "octree {} vs brute force {expected} at {p:?}",
            found.distance
        );
    }
}

#[test]
fn closest_point_is_exact_for_every_depth() {
    let polygons: Vec<Polygon> = (0..40)
        .map(|i| {
            let x = f64::from(i % 8) * 0.7;
            let y = f64::from(i / 8) * 0.9;
            let z = f64::from(i % 3) * 0.4;
            Polygon::Triangle([
                vertex(x, y, z, 0.0, 0.0),
                vertex(x + 0.5, y, z + 0.1, 1.0, 0.0),
                vertex(x, y + 0.6, z - 0.2, 0.0, 1.0),
            ])
        })
        .collect();
    let mut rng = StdRng::seed_from_u64(5);
    let queries: Vec<Point3> = (0..50)
        .map(|_| {
            Point3::new(
                rng.random_range(-1.0..6.0),
                rng.random_range(-1.0..5.0),
                rng.random_range(-1.0..2.0),
            )
        })
        .collect();

    for depth in 0..=6 {
        let options = MeshOptions { octree_depth: depth, ..MeshOptions::default() };
        let mesh = Mesh::build_with_options("scatter", &polygons, options).expect("mesh");
        for &p in &queries {
            let found = mesh.closest_point(p).expect("closest");
            assert!((found.distance - brute_force(&mesh, p)).abs() < 1e-9, "depth {depth}");
        }
    }
}

#[test]
fn candidates_include_the_nearest_triangle() {
    let mesh = bumpy_grid(8, 2.0);
    let p = Point3::new(1.1, 0.9, 0.5);
    let nearest = mesh.closest_point(p).expect("closest").triangle as u32;
    let candidates = mesh.octree().nearest_candidates(p);
    assert!(candidates.contains(&nearest));
    assert!(candidates.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn every_triangle_is_stored_once() {
    let mesh = bumpy_grid(6, 3.0);
    let octree = mesh.octree();
    let mut holders = vec![Vec::new(); mesh.triangle_count()];
    for node in 0..octree.node_count() {
        for &index in octree.node_triangles(node) {
            holders[index as usize].push(node);
        }
    }

    for (index, nodes) in holders.iter().enumerate() {
        assert_eq!(nodes.len(), 1, "triangle {index} held by nodes {nodes:?}");
        let node = nodes[0];
        assert_eq!(octree.node_of(index as u32), Some(node));

        let corners = mesh.triangles()[index].positions;
        let bounds = octree.node_bounds(node).expect("bounds");
        assert!(corners.iter().all(|c| bounds.contains_point(*c)));

        // Pushed as deep as possible: at the depth limit, or no octant fits.
        let level = octree.node_level(node).expect("level");
        let fits_deeper = (0..8).any(|octant| {
            let sub = bounds.octant(octant);
            corners.iter().all(|c| sub.contains_point(*c))
        });
        assert!(level == octree.max_depth() || !fits_deeper, "triangle {index} stopped at level {level}");
    }
}
