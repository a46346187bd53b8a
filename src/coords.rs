use serde::{Deserialize, Serialize};
use crate::index_space::{Axis, IndexShape};




/// Floor on |sin θ| so metrics stay invertible at the poles.
const SIN_THETA_FLOOR: f64 = 1e-20;




/**
 * Location within a cell at which a geometric quantity is evaluated.
 * `FaceN` is the lower face normal to the XN axis.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Loci {
    Face1,
    Face2,
    Face3,
    Center,
    Corner,
}




// ============================================================================
impl Loci {

    /**
     * Return the face locus normal to the given direction (1, 2, or 3).
     */
    pub fn face(dir: usize) -> Self {
        match dir {
            1 => Loci::Face1,
            2 => Loci::Face2,
            3 => Loci::Face3,
            _ => panic!("no face normal to direction {}", dir),
        }
    }

    /**
     * Fraction of a cell width to add to the lower cell edge to reach this
     * location, on each of the three axes.
     */
    fn offsets(self) -> [f64; 3] {
        match self {
            Loci::Face1 => [0.0, 0.5, 0.5],
            Loci::Face2 => [0.5, 0.0, 0.5],
            Loci::Face3 => [0.5, 0.5, 0.0],
            Loci::Center => [0.5, 0.5, 0.5],
            Loci::Corner => [0.0, 0.0, 0.0],
        }
    }
}




/**
 * The base (embedding) coordinate system and its metric.
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// Flat space, Cartesian (t, x, y, z).
    Minkowski,
    /// Flat space, spherical (t, r, θ, φ).
    SphericalMinkowski,
    /// Kerr-Schild coordinates for a black hole of spin `a`.
    SphericalKs { a: f64 },
    /// Boyer-Lindquist coordinates for a black hole of spin `a`.
    SphericalBl { a: f64 },
}




// ============================================================================
impl CoordinateSystem {

    /**
     * Covariant metric at the given base coordinates.
     */
    pub fn gcov(&self, x: [f64; 4]) -> [[f64; 4]; 4] {
        let mut g = [[0.0; 4]; 4];

        match *self {
            CoordinateSystem::Minkowski => {
                g[0][0] = -1.0;
                g[1][1] = 1.0;
                g[2][2] = 1.0;
                g[3][3] = 1.0;
            }
            CoordinateSystem::SphericalMinkowski => {
                let (r, s, _) = polar(x);
                g[0][0] = -1.0;
                g[1][1] = 1.0;
                g[2][2] = r * r;
                g[3][3] = r * r * s * s;
            }
            CoordinateSystem::SphericalKs { a } => {
                let (r, s, c) = polar(x);
                let rho2 = r * r + a * a * c * c;
                let z = 2.0 * r / rho2;
                g[0][0] = -1.0 + z;
                g[0][1] = z;
                g[0][3] = -z * a * s * s;
                g[1][1] = 1.0 + z;
                g[1][3] = -a * s * s * (1.0 + z);
                g[2][2] = rho2;
                g[3][3] = s * s * (rho2 + a * a * s * s * (1.0 + z));
                g[1][0] = g[0][1];
                g[3][0] = g[0][3];
                g[3][1] = g[1][3];
            }
            CoordinateSystem::SphericalBl { a } => {
                let (r, s, c) = polar(x);
                let sigma = r * r + a * a * c * c;
                let delta = r * r - 2.0 * r + a * a;
                g[0][0] = -(1.0 - 2.0 * r / sigma);
                g[0][3] = -2.0 * a * r * s * s / sigma;
                g[1][1] = sigma / delta;
                g[2][2] = sigma;
                g[3][3] = s * s * (r * r + a * a + 2.0 * a * a * r * s * s / sigma);
                g[3][0] = g[0][3];
            }
        }
        g
    }
}




/**
 * Map from the native (grid) coordinates to the base coordinates.
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    /// Native and base coordinates coincide.
    Null,
    /// `r = exp(X1)`; the other coordinates pass through.
    Exponential,
}




// ============================================================================
impl Transform {

    pub fn coord_to_embed(&self, x: [f64; 4]) -> [f64; 4] {
        match self {
            Transform::Null => x,
            Transform::Exponential => [x[0], x[1].exp(), x[2], x[3]],
        }
    }

    /**
     * Jacobian dx^mu / dX^nu of the base coordinates with respect to the
     * native ones, at native coordinates `x`.
     */
    pub fn dxdx(&self, x: [f64; 4]) -> [[f64; 4]; 4] {
        let mut d = identity();
        if let Transform::Exponential = self {
            d[1][1] = x[1].exp();
        }
        d
    }
}




/**
 * The metric, its inverse, and the square root of minus its determinant, at
 * one point.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub gcov: [[f64; 4]; 4],
    pub gcon: [[f64; 4]; 4],
    pub gdet: f64,
}




// ============================================================================
impl Geometry {

    /**
     * Lapse, `1 / sqrt(-g^00)`.
     */
    pub fn lapse(&self) -> f64 {
        1.0 / (-self.gcon[0][0]).sqrt()
    }

    pub fn lower(&self, vcon: &[f64; 4]) -> [f64; 4] {
        let mut vcov = [0.0; 4];
        for mu in 0..4 {
            for nu in 0..4 {
                vcov[mu] += self.gcov[mu][nu] * vcon[nu];
            }
        }
        vcov
    }
}




/**
 * Geometry of one mesh block: the coordinate system, the grid transform,
 * the native coordinates of the lower corner of the first interior cell, and
 * the cell widths. Metric quantities are computed on demand.
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub system: CoordinateSystem,
    pub transform: Transform,
    pub startx: [f64; 3],
    pub dx: [f64; 3],
    pub shape: IndexShape,
}




// ============================================================================
impl Coordinates {

    /**
     * Cartesian Minkowski coordinates covering the box `lower..upper`.
     */
    pub fn cartesian(shape: IndexShape, lower: [f64; 3], upper: [f64; 3]) -> Self {
        Self::new(CoordinateSystem::Minkowski, Transform::Null, shape, lower, upper)
    }

    pub fn new(
        system: CoordinateSystem,
        transform: Transform,
        shape: IndexShape,
        lower: [f64; 3],
        upper: [f64; 3]) -> Self
    {
        let axes = [Axis::I, Axis::J, Axis::K];
        let mut dx = [0.0; 3];

        for (n, axis) in axes.iter().enumerate() {
            dx[n] = (upper[n] - lower[n]) / shape.ncells(*axis) as f64;
        }
        Self { system, transform, startx: lower, dx, shape }
    }

    /**
     * Cell width along direction `dir` (1, 2, or 3), in native coordinates.
     */
    pub fn dxv(&self, dir: usize) -> f64 {
        self.dx[dir - 1]
    }

    /**
     * Native coordinates of the given location of cell (k, j, i). Indexes
     * are memory indexes, ghost zones included.
     */
    pub fn coord(&self, k: usize, j: usize, i: usize, loc: Loci) -> [f64; 4] {
        let off = loc.offsets();
        let idx = [i, j, k];
        let axes = [Axis::I, Axis::J, Axis::K];
        let mut x = [0.0; 4];

        for n in 0..3 {
            let ng = self.shape.nghost(axes[n]) as f64;
            x[n + 1] = self.startx[n] + (idx[n] as f64 - ng + off[n]) * self.dx[n];
        }
        x
    }

    pub fn coord_embed(&self, k: usize, j: usize, i: usize, loc: Loci) -> [f64; 4] {
        self.transform.coord_to_embed(self.coord(k, j, i, loc))
    }

    /**
     * Covariant metric in native coordinates at the given location.
     */
    pub fn gcov(&self, k: usize, j: usize, i: usize, loc: Loci) -> [[f64; 4]; 4] {
        let x = self.coord(k, j, i, loc);
        let base = self.system.gcov(self.transform.coord_to_embed(x));
        let d = self.transform.dxdx(x);
        let mut g = [[0.0; 4]; 4];

        for mu in 0..4 {
            for nu in 0..4 {
                for a in 0..4 {
                    for b in 0..4 {
                        g[mu][nu] += d[a][mu] * d[b][nu] * base[a][b];
                    }
                }
            }
        }
        g
    }

    pub fn gcon(&self, k: usize, j: usize, i: usize, loc: Loci) -> [[f64; 4]; 4] {
        invert(&self.gcov(k, j, i, loc)).0
    }

    pub fn gdet(&self, k: usize, j: usize, i: usize, loc: Loci) -> f64 {
        invert(&self.gcov(k, j, i, loc)).1.abs().sqrt()
    }

    pub fn geometry(&self, k: usize, j: usize, i: usize, loc: Loci) -> Geometry {
        let gcov = self.gcov(k, j, i, loc);
        let (gcon, det) = invert(&gcov);
        Geometry { gcov, gcon, gdet: det.abs().sqrt() }
    }
}




fn polar(x: [f64; 4]) -> (f64, f64, f64) {
    let r = x[1];
    let mut s = x[2].sin();
    let c = x[2].cos();

    if s.abs() < SIN_THETA_FLOOR {
        s = SIN_THETA_FLOOR;
    }
    (r, s, c)
}

fn identity() -> [[f64; 4]; 4] {
    let mut m = [[0.0; 4]; 4];
    for (n, row) in m.iter_mut().enumerate() {
        row[n] = 1.0;
    }
    m
}




/**
 * Invert a 4x4 matrix by Gauss-Jordan elimination with partial pivoting.
 * Returns the inverse and the determinant.
 */
pub fn invert(m: &[[f64; 4]; 4]) -> ([[f64; 4]; 4], f64) {
    let mut a = *m;
    let mut inv = identity();
    let mut det = 1.0;

    for col in 0..4 {
        let pivot = (col..4)
            .max_by(|&p, &q| a[p][col].abs().total_cmp(&a[q][col].abs()))
            .unwrap_or(col);

        if pivot != col {
            a.swap(pivot, col);
            inv.swap(pivot, col);
            det = -det;
        }

        let p = a[col][col];
        det *= p;

        for n in 0..4 {
            a[col][n] /= p;
            inv[col][n] /= p;
        }
        for row in 0..4 {
            if row != col {
                let f = a[row][col];
                for n in 0..4 {
                    a[row][n] -= f * a[col][n];
                    inv[row][n] -= f * inv[col][n];
                }
            }
        }
    }
    (inv, det)
}
