use crate::geom::{Mesh, Point3, Polygon, UvPoint, Vertex};

pub fn vertex(x: f64, y: f64, z: f64, u: f64, v: f64) -> Vertex {
    Vertex::new(Point3::new(x, y, z), UvPoint::new(u, v))
}

/// `n x n` quad grid over `[0, size]^2` with a smooth height field and UVs
/// spanning the unit square.
pub fn bumpy_grid(n: usize, size: f64) -> Mesh {
    let height = |x: f64, y: f64| 0.3 * (x * 1.7).sin() * (y * 1.3).cos();
    let step = size / n as f64;
    let mut polygons = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let corner = |di: usize, dj: usize| {
                let x = (i + di) as f64 * step;
                let y = (j + dj) as f64 * step;
                vertex(x, y, height(x, y), x / size, y / size)
            };
            polygons.push(Polygon::Quad([corner(0, 0), corner(1, 0), corner(1, 1), corner(0, 1)]));
        }
    }
    Mesh::build("bumpy", &polygons).expect("grid mesh")
}

/// Closed axis-aligned unit cube made of six quads.
pub fn unit_cube() -> Mesh {
    let p = |x: f64, y: f64, z: f64| vertex(x, y, z, x, y);
    let quads = [
        [p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 0.0, 0.0)],
        [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(1.0, 1.0, 1.0), p(0.0, 1.0, 1.0)],
        [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 0.0, 1.0), p(0.0, 0.0, 1.0)],
        [p(0.0, 1.0, 0.0), p(0.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, 0.0)],
        [p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0), p(0.0, 1.0, 1.0), p(0.0, 1.0, 0.0)],
        [p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 1.0, 1.0), p(1.0, 0.0, 1.0)],
    ];
    let polygons: Vec<Polygon> = quads.into_iter().map(Polygon::Quad).collect();
    Mesh::build("cube", &polygons).expect("cube mesh")
}

/// Closed octahedron with vertices at distance 1 on each axis.
pub fn octahedron() -> Mesh {
    let p = |x: f64, y: f64, z: f64| vertex(x, y, z, (x + 1.0) / 2.0, (y + 1.0) / 2.0);
    let (px, nx) = (p(1.0, 0.0, 0.0), p(-1.0, 0.0, 0.0));
    let (py, ny) = (p(0.0, 1.0, 0.0), p(0.0, -1.0, 0.0));
    let (pz, nz) = (p(0.0, 0.0, 1.0), p(0.0, 0.0, -1.0));
    let polygons: Vec<Polygon> = [
        [px, py, pz],
        [py, nx, pz],
        [nx, ny, pz],
        [ny, px, pz],
        [py, px, nz],
        [nx, py, nz],
        [ny, nx, nz],
        [px, ny, nz],
    ]
    .into_iter()
    .map(Polygon::Triangle)
    .collect();
    Mesh::build("octahedron", &polygons).expect("octahedron mesh")
}
