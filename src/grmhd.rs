use crate::coords::Geometry;
use crate::var_map::VarMap;




/// Floor applied to quantities which appear in denominators.
pub const SMALL: f64 = 1e-20;




/**
 * The four-velocity and magnetic four-vector of the fluid at a point, each
 * with index up and down. The magnetic vectors are zero if the pack has no
 * field.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FourVectors {
    pub ucon: [f64; 4],
    pub ucov: [f64; 4],
    pub bcon: [f64; 4],
    pub bcov: [f64; 4],
}




// ============================================================================
impl FourVectors {

    /**
     * Return b^mu b_mu, twice the magnetic pressure.
     */
    pub fn bsq(&self) -> f64 {
        dot(&self.bcon, &self.bcov)
    }
}




pub fn dot(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}




/**
 * Lorentz factor of the primitive velocity, which is the fluid velocity
 * relative to normal observers, `u~^i`.
 */
pub fn lorentz_calc(g: &Geometry, p: &[f64], m_p: &VarMap) -> f64 {
    let u = [p[m_p.u1 as usize], p[m_p.u2 as usize], p[m_p.u3 as usize]];
    let mut qsq = 0.0;

    for a in 0..3 {
        for b in 0..3 {
            qsq += g.gcov[a + 1][b + 1] * u[a] * u[b];
        }
    }
    (1.0 + qsq).sqrt()
}




/**
 * Compute the fluid four-vectors from the primitive variables of one cell
 * (or one side of a face), given the geometry at that location.
 */
pub fn calc_4vecs(g: &Geometry, p: &[f64], m_p: &VarMap) -> FourVectors {
    let gamma = lorentz_calc(g, p, m_p);
    let alpha = g.lapse();
    let u = [p[m_p.u1 as usize], p[m_p.u2 as usize], p[m_p.u3 as usize]];

    let mut ucon = [gamma / alpha, 0.0, 0.0, 0.0];

    for n in 1..4 {
        ucon[n] = u[n - 1] - gamma * alpha * g.gcon[0][n];
    }
    let ucov = g.lower(&ucon);

    let mut d = FourVectors { ucon, ucov, ..FourVectors::default() };

    if m_p.has_b() {
        let b = [p[m_p.b1 as usize], p[m_p.b2 as usize], p[m_p.b3 as usize]];
        let bcon0 = b[0] * ucov[1] + b[1] * ucov[2] + b[2] * ucov[3];
        d.bcon[0] = bcon0;

        for n in 1..4 {
            d.bcon[n] = (b[n - 1] + bcon0 * ucon[n]) / ucon[0];
        }
        d.bcov = g.lower(&d.bcon);
    }
    d
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::coords::{Coordinates, CoordinateSystem, Loci, Transform};
    use crate::index_space::IndexShape;
    use crate::pack::PackBuilder;

    fn mhd_map() -> VarMap {
        let map = PackBuilder::new()
            .scalar("prims.rho")
            .scalar("prims.u")
            .vector("prims.uvec")
            .vector("prims.B")
            .build();
        VarMap::new(&map, false)
    }

    #[test]
    fn fluid_at_rest_in_flat_space() {
        let c = Coordinates::cartesian(IndexShape::new([4, 4, 1], 2), [0.0; 3], [1.0; 3]);
        let g = c.geometry(0, 3, 3, Loci::Center);
        let p = [1.0, 0.1, 0.0, 0.0, 0.0, 0.3, 0.0, 0.0];
        let d = calc_4vecs(&g, &p, &mhd_map());
        assert_eq!(d.ucon, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(d.ucov, [-1.0, 0.0, 0.0, 0.0]);
        assert_eq!(d.bcon, [0.0, 0.3, 0.0, 0.0]);
        assert!((d.bsq() - 0.09).abs() < 1e-15);
    }

    #[test]
    fn four_velocity_is_normalized_in_kerr_schild() {
        let c = Coordinates::new(
            CoordinateSystem::SphericalKs { a: 0.9 },
            Transform::Exponential,
            IndexShape::new([8, 8, 1], 2),
            [0.5, 0.2, 0.0],
            [3.0, 2.9, 1.0]);
        let g = c.geometry(0, 5, 5, Loci::Face1);
        let p = [1.0, 0.1, 0.2, -0.05, 0.3, 0.4, 0.1, -0.2];
        let d = calc_4vecs(&g, &p, &mhd_map());
        assert!((dot(&d.ucon, &d.ucov) + 1.0).abs() < 1e-10);
        assert!(dot(&d.bcon, &d.ucov).abs() < 1e-10);
    }
}
