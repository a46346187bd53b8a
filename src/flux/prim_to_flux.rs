use crate::coords::Geometry;
use crate::emhd::{self, EmhdParameters};
use crate::grmhd::{dot, FourVectors};
use crate::var_map::VarMap;




/**
 * Compute the flux of every conserved variable in direction `dir`, from the
 * primitive state `p` with four-vectors `d`. Direction 0 gives the
 * conserved variables themselves. Fluxes are densitized by `gdet`.
 *
 * Slots of `flux` not filled by any package are left untouched.
 */
#[allow(clippy::too_many_arguments)]
pub fn prim_to_flux(
    g: &Geometry,
    p: &[f64],
    m_p: &VarMap,
    d: &FourVectors,
    emhd_params: &EmhdParameters,
    gam: f64,
    dir: usize,
    flux: &mut [f64],
    m_u: &VarMap)
{
    let gdet = g.gdet;
    let rho = p[m_p.rho as usize];
    let u = p[m_p.uu as usize];
    let pgas = (gam - 1.0) * u;

    let mass_flux = rho * d.ucon[dir] * gdet;
    flux[m_u.rho as usize] = mass_flux;

    let t = if m_p.has_emhd() {
        let cs2 = gam * (gam - 1.0) * u / (rho + gam * u);
        let theta = pgas / rho;
        let (q, dp) = emhd::convert_prims_to_q_dp(
            p[m_p.q as usize],
            p[m_p.dp as usize],
            rho,
            theta,
            cs2,
            emhd_params);
        emhd::calc_tensor(rho, u, pgas, emhd_params, q, dp, d, dir)
    } else {
        ideal_tensor(rho, u, pgas, d, dir)
    };

    flux[m_u.uu as usize] = t[0] * gdet + mass_flux;
    flux[m_u.u1 as usize] = t[1] * gdet;
    flux[m_u.u2 as usize] = t[2] * gdet;
    flux[m_u.u3 as usize] = t[3] * gdet;

    if m_u.has_b() && m_p.has_b() {
        for v in 0..3 {
            let slot = (m_u.b1 + v as i8) as usize;
            flux[slot] = if dir == 0 {
                p[(m_p.b1 + v as i8) as usize] * gdet
            } else {
                (d.bcon[v + 1] * d.ucon[dir] - d.bcon[dir] * d.ucon[v + 1]) * gdet
            };
        }
        if m_p.psi >= 0 && m_u.psi >= 0 {
            let psi = p[m_p.psi as usize];
            if dir == 0 {
                flux[m_u.psi as usize] = psi * gdet;
            } else {
                for v in 0..3 {
                    flux[(m_u.b1 + v as i8) as usize] += psi * g.gcon[dir][v + 1] * gdet;
                }
                flux[m_u.psi as usize] = p[(m_p.b1 + dir as i8 - 1) as usize] * gdet;
            }
        }
    }

    let advected = [
        (m_p.rho_added, m_u.rho_added),
        (m_p.uu_added, m_u.uu_added),
        (m_p.q, m_u.q),
        (m_p.dp, m_u.dp),
    ];
    for (sp, su) in advected {
        if sp >= 0 && su >= 0 {
            flux[su as usize] = p[sp as usize] * d.ucon[dir] * gdet;
        }
    }

    for (sp, su) in m_p.specific_scalars().zip(m_u.specific_scalars()) {
        flux[su as usize] = mass_flux * p[sp as usize];
    }
}




/**
 * One row of the ideal MHD stress-energy tensor, `T^dir_mu`.
 */
pub fn ideal_tensor(rho: f64, u: f64, pgas: f64, d: &FourVectors, dir: usize) -> [f64; 4] {
    let bsq = dot(&d.bcon, &d.bcov);
    let eta = pgas + rho + u + bsq;
    let ptot = pgas + 0.5 * bsq;
    let mut t = [0.0; 4];

    for mu in 0..4 {
        let delta = if mu == dir { 1.0 } else { 0.0 };
        t[mu] = eta * d.ucon[dir] * d.ucov[mu] + ptot * delta - d.bcon[dir] * d.bcov[mu];
    }
    t
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::coords::{Coordinates, Loci};
    use crate::grmhd::calc_4vecs;
    use crate::index_space::IndexShape;
    use crate::mesh::PackLayout;

    #[test]
    fn conserved_state_of_static_gas() {
        let layout = PackLayout::mhd(&["Ktot"]).unwrap();
        let c = Coordinates::cartesian(IndexShape::new([4, 4, 1], 2), [0.0; 3], [1.0; 3]);
        let g = c.geometry(0, 3, 3, Loci::Center);
        let gam = 5.0 / 3.0;
        let p = [2.0, 0.3, 0.0, 0.0, 0.0, 0.1, 0.2, 0.0, 4.0];
        let d = calc_4vecs(&g, &p, layout.m_p());
        let mut u = vec![0.0; 9];
        prim_to_flux(&g, &p, layout.m_p(), &d, &EmhdParameters::default(), gam, 0, &mut u, layout.m_u());

        let bsq = 0.05;
        assert_eq!(u[0], 2.0);
        // T^0_0 = -(rho + u + p + b^2) + p + b^2/2 = -(rho + u) - b^2/2
        assert!((u[1] - (-(2.3 + 0.5 * bsq) + 2.0)).abs() < 1e-14);
        assert_eq!(&u[5..8], &[0.1, 0.2, 0.0]);
        assert_eq!(u[8], 8.0);
    }

    #[test]
    fn flux_of_moving_gas_carries_field_and_scalars() {
        let layout = PackLayout::mhd(&["Ktot"]).unwrap();
        let c = Coordinates::cartesian(IndexShape::new([4, 4, 1], 2), [0.0; 3], [1.0; 3]);
        let g = c.geometry(0, 3, 3, Loci::Face1);
        let p = [1.0, 0.5, 0.2, 0.0, 0.0, 0.0, 0.3, 0.0, 2.0];
        let d = calc_4vecs(&g, &p, layout.m_p());
        let mut f = vec![0.0; 9];
        prim_to_flux(&g, &p, layout.m_p(), &d, &EmhdParameters::default(), 4.0 / 3.0, 1, &mut f, layout.m_u());

        assert!((f[0] - d.ucon[1]).abs() < 1e-15);
        assert_eq!(f[5], 0.0);
        assert!((f[6] - (d.bcon[2] * d.ucon[1] - d.bcon[1] * d.ucon[2])).abs() < 1e-15);
        assert!((f[8] - 2.0 * f[0]).abs() < 1e-15);
    }

    #[test]
    fn constraint_damping_couples_psi_and_the_field() {
        let layout = PackLayout::mhd(&["psi_cd"]).unwrap();
        let c = Coordinates::cartesian(IndexShape::new([4, 4, 1], 2), [0.0; 3], [1.0; 3]);
        let g = c.geometry(0, 3, 3, Loci::Face1);
        let p = [1.0, 0.5, 0.1, 0.0, 0.0, 0.1, 0.2, 0.3, 0.4];
        let d = calc_4vecs(&g, &p, layout.m_p());
        let params = EmhdParameters::default();
        let mut u = vec![0.0; 9];
        let mut f = vec![0.0; 9];
        prim_to_flux(&g, &p, layout.m_p(), &d, &params, 5.0 / 3.0, 0, &mut u, layout.m_u());
        prim_to_flux(&g, &p, layout.m_p(), &d, &params, 5.0 / 3.0, 1, &mut f, layout.m_u());

        assert_eq!(u[8], 0.4);
        assert_eq!(f[8], 0.1);
        // F^1(B1) vanishes without damping, leaving psi g^11.
        assert!((f[5] - 0.4).abs() < 1e-15);
        assert!((f[6] - (d.bcon[2] * d.ucon[1] - d.bcon[1] * d.ucon[2])).abs() < 1e-15);
    }
}
