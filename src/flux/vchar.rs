use crate::coords::{Coordinates, Geometry};
use crate::emhd::{self, EmhdParameters};
use crate::grmhd::{FourVectors, SMALL};
use crate::var_map::VarMap;




/**
 * Find the fastest signal speeds along direction `dir`, as the two roots of
 * the fast magnetosonic dispersion relation. Returns `(cmax, cmin)`, the
 * larger and smaller root, in native coordinates.
 *
 * With extended MHD the conductive and viscous signal speeds are added to
 * the sound speed.
 */
#[allow(clippy::too_many_arguments)]
pub fn vchar(
    coords: &Coordinates,
    g: &Geometry,
    p: &[f64],
    m_p: &VarMap,
    d: &FourVectors,
    gam: f64,
    emhd_params: &EmhdParameters,
    index: (usize, usize, usize),
    dir: usize) -> (f64, f64)
{
    let rho = p[m_p.rho as usize];
    let u = p[m_p.uu as usize];

    let bsq = d.bsq().max(SMALL);
    let ef = (rho + gam * u).max(SMALL);
    let ee = bsq + ef;
    let va2 = bsq / ee;
    let mut cs2 = gam * (gam - 1.0) * u / ef;

    if m_p.has_emhd() {
        let t = emhd::set_parameters(coords, p, m_p, emhd_params, gam, index);
        let ccond2 = (gam - 1.0) * t.chi_e / t.tau;
        let cvis2 = (4.0 / 3.0) / (rho + gam * u) * rho * t.nu_e / t.tau;
        cs2 += ccond2 + cvis2;
    }

    let cms2 = (cs2 + va2 - cs2 * va2).clamp(SMALL, 1.0);

    // Acov = e_dir, Bcov = e_0
    let a_sq = g.gcon[dir][dir];
    let b_sq = g.gcon[0][0];
    let ab = g.gcon[0][dir];
    let au = d.ucon[dir];
    let bu = d.ucon[0];
    let au2 = au * au;
    let bu2 = bu * bu;
    let aubu = au * bu;

    let a = bu2 - (b_sq + bu2) * cms2;
    let b = 2.0 * (aubu - (ab + aubu) * cms2);
    let c = au2 - (a_sq + au2) * cms2;

    let discr = (b * b - 4.0 * a * c).max(0.0).sqrt();
    let vp = -(-b + discr) / (2.0 * a);
    let vm = -(-b - discr) / (2.0 * a);

    (vp.max(vm), vp.min(vm))
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::coords::Loci;
    use crate::grmhd::calc_4vecs;
    use crate::index_space::IndexShape;
    use crate::mesh::PackLayout;

    fn setup() -> (PackLayout, Coordinates) {
        let layout = PackLayout::mhd(&[]).unwrap();
        let c = Coordinates::cartesian(IndexShape::new([4, 4, 1], 2), [0.0; 3], [1.0; 3]);
        (layout, c)
    }

    #[test]
    fn static_gas_propagates_at_the_sound_speed() {
        let (layout, c) = setup();
        let g = c.geometry(0, 3, 3, Loci::Face1);
        let gam = 5.0 / 3.0;
        let p = [1.0, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let d = calc_4vecs(&g, &p, layout.m_p());
        let (cmax, cmin) = vchar(&c, &g, &p, layout.m_p(), &d, gam, &EmhdParameters::default(), (0, 3, 3), 1);
        let cs = (gam * (gam - 1.0) * 0.6 / (1.0 + gam * 0.6)).sqrt();
        assert!((cmax - cs).abs() < 1e-8);
        assert!((cmin + cs).abs() < 1e-8);
    }

    #[test]
    fn signal_speeds_are_subluminal_and_shifted_by_the_flow() {
        let (layout, c) = setup();
        let g = c.geometry(0, 3, 3, Loci::Face2);
        let p = [1.0, 5.0, 0.0, 0.8, 0.0, 0.0, 2.0, 0.0];
        let d = calc_4vecs(&g, &p, layout.m_p());
        let (cmax, cmin) = vchar(&c, &g, &p, layout.m_p(), &d, 4.0 / 3.0, &EmhdParameters::default(), (0, 3, 3), 2);
        assert!(cmax <= 1.0 && cmin >= -1.0);
        assert!(cmax > 0.0);
        assert!(cmax + cmin > 0.0);
    }

    #[test]
    fn extended_mhd_adds_conduction_and_viscous_speeds() {
        let layout = PackLayout::mhd(&["q", "dP"]).unwrap();
        let c = Coordinates::cartesian(IndexShape::new([4, 4, 1], 2), [0.0; 3], [1.0; 3]);
        let g = c.geometry(0, 3, 3, Loci::Face1);
        let gam = 5.0 / 3.0;
        let p = [1.0, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let params = EmhdParameters {
            conduction_alpha: 0.1,
            viscosity_alpha: 0.05,
            ..EmhdParameters::default()
        };
        let d = calc_4vecs(&g, &p, layout.m_p());
        let (cmax, cmin) = vchar(&c, &g, &p, layout.m_p(), &d, gam, &params, (0, 3, 3), 1);

        let ef = 1.0 + gam * 0.6;
        let cs2 = gam * (gam - 1.0) * 0.6 / ef;
        let ccond2 = (gam - 1.0) * 0.1;
        let cvis2 = (4.0 / 3.0) / ef * 0.05;
        let expected = (cs2 + ccond2 + cvis2).sqrt();
        assert!((cmax - expected).abs() < 1e-8);
        assert!((cmin + expected).abs() < 1e-8);
        assert!(cmax > cs2.sqrt() + 0.05);
    }
}
