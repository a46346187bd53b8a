/*!
 * The flux engine: primitive states on either side of each face are turned
 * into conserved states, physical fluxes, and signal speeds, and combined by
 * an approximate Riemann solver into the face flux.
 */

use rayon::prelude::*;
use crate::config::Config;
use crate::coords::{Coordinates, Geometry, Loci};
use crate::emhd::EmhdParameters;
use crate::error::Error;
use crate::field::row_cell;
use crate::grmhd;
use crate::index_space::IndexDomain;
use crate::mesh::{BlockDomain, MeshBlockData};
use crate::trace::Span;
use crate::var_map::VarMap;

pub mod prim_to_flux;
pub mod reconstruct;
pub mod riemann;
pub mod vchar;

pub use prim_to_flux::prim_to_flux;
pub use reconstruct::Reconstruction;
pub use riemann::RiemannSolver;
pub use vchar::vchar;




/**
 * Everything the per-face physics needs besides the state itself.
 */
pub struct FluxContext<'a> {
    pub coords: &'a Coordinates,
    pub m_p: &'a VarMap,
    pub m_u: &'a VarMap,
    pub gam: f64,
    pub emhd: &'a EmhdParameters,
}




// ============================================================================
impl<'a> FluxContext<'a> {

    /**
     * From one primitive state at a face normal to `dir`, compute the
     * conserved state into `u`, the flux into `f`, and return the signal
     * speeds `(cmax, cmin)` of that state.
     */
    pub fn face_state(
        &self,
        g: &Geometry,
        p: &[f64],
        index: (usize, usize, usize),
        dir: usize,
        u: &mut [f64],
        f: &mut [f64]) -> (f64, f64)
    {
        let d = grmhd::calc_4vecs(g, p, self.m_p);
        prim_to_flux(g, p, self.m_p, &d, self.emhd, self.gam, 0, u, self.m_u);
        prim_to_flux(g, p, self.m_p, &d, self.emhd, self.gam, dir, f, self.m_u);
        vchar(self.coords, g, p, self.m_p, &d, self.gam, self.emhd, index, dir)
    }
}




/**
 * Check that every block can be reconstructed with the configured scheme.
 */
pub fn check_ghost_zones<D: BlockDomain>(md: &D, config: &Config) -> Result<(), Error> {
    md.blocks()
        .iter()
        .try_for_each(|block| config.reconstruction.check_ghost_zones(block))
}




/**
 * Reconstruct the face states normal to `dir` and compute the face fluxes of
 * every conserved variable, along with the face signal speeds. Only the
 * block's `pl`, `pr`, `flux[dir - 1]`, `cmax[dir - 1]`, and `cmin[dir - 1]`
 * are written. Directions beyond the dimension of the mesh are skipped.
 *
 * Fails, writing nothing, if any block has too few ghost zones for the
 * configured reconstruction.
 */
pub fn get_flux<D: BlockDomain>(md: &mut D, dir: usize, config: &Config) -> Result<(), Error> {
    if dir > md.ndim() {
        return Ok(());
    }
    check_ghost_zones(md, config)?;

    let _span = Span::enter(match dir {
        1 => "get_flux_x1",
        2 => "get_flux_x2",
        _ => "get_flux_x3",
    });
    let emhd = config.emhd_parameters();

    md.blocks_mut().par_iter_mut().for_each(|block| {
        reconstruct::reconstruct(block, dir, config.reconstruction);
        block_flux(block, dir, config, &emhd);
    });
    Ok(())
}




/**
 * Compute face fluxes in every direction the mesh has.
 */
pub fn get_fluxes<D: BlockDomain>(md: &mut D, config: &Config) -> Result<(), Error> {
    for dir in 1..=md.ndim() {
        get_flux(md, dir, config)?
    }
    Ok(())
}




fn block_flux(block: &mut MeshBlockData, dir: usize, config: &Config, emhd: &EmhdParameters) {
    let range = block.face_range(dir);
    let loc = Loci::face(dir);
    let n = dir - 1;

    let MeshBlockData { coords, layout, pl, pr, flux, cmax, cmin, .. } = block;
    let (pl, pr) = (&*pl, &*pr);
    let nv = layout.num_vars();
    let ctx = FluxContext {
        coords,
        m_p: layout.m_p(),
        m_u: layout.m_u(),
        gam: config.gamma,
        emhd,
    };
    let solver = config.riemann_solver;

    flux[n]
        .par_rows_mut()
        .zip(cmax[n].par_rows_mut())
        .zip(cmin[n].par_rows_mut())
        .for_each(|((((k, j), f_row), (_, cmax_row)), (_, cmin_row))| {
            if !(range.kb.contains(k) && range.jb.contains(j)) {
                return;
            }
            let mut ul = vec![0.0; nv];
            let mut ur = vec![0.0; nv];
            let mut fl = vec![0.0; nv];
            let mut fr = vec![0.0; nv];

            for i in range.ib.iter() {
                let index = (k, j, i);
                let g = ctx.coords.geometry(k, j, i, loc);
                let (cmax_l, cmin_l) = ctx.face_state(&g, pl.get_slice(index), index, dir, &mut ul, &mut fl);
                let (cmax_r, cmin_r) = ctx.face_state(&g, pr.get_slice(index), index, dir, &mut ur, &mut fr);
                let (cmax, cmin) = riemann::face_speeds(cmax_l, cmin_l, cmax_r, cmin_r);

                cmax_row[i] = cmax;
                cmin_row[i] = cmin;

                for (v, f) in row_cell(f_row, i, nv).iter_mut().enumerate() {
                    *f = solver.flux(fl[v], fr[v], cmax, cmin, ul[v], ur[v]);
                }
            }
        })
}




/**
 * Return the largest stable time step, `cfl / sum_d (ctop_d / dx_d)`
 * minimized over the interior of every block, where `ctop` is the larger
 * face speed on each cell's lower face. Requires fluxes to have been
 * computed. Returns infinity if no signal moves.
 */
pub fn estimate_timestep<D: BlockDomain>(md: &D, cfl: f64) -> f64 {
    let _span = Span::enter("estimate_timestep");
    let ndim = md.ndim();

    md.blocks()
        .par_iter()
        .map(|block| {
            let interior = block.bounds(IndexDomain::Interior);
            interior
                .iter()
                .map(|index| {
                    let rate: f64 = (1..=ndim)
                        .map(|dir| {
                            let ctop = block.cmax[dir - 1].get(0, index).max(block.cmin[dir - 1].get(0, index));
                            ctop / block.coords.dxv(dir)
                        })
                        .sum();
                    if rate > 0.0 { cfl / rate } else { f64::INFINITY }
                })
                .fold(f64::INFINITY, f64::min)
        })
        .reduce(|| f64::INFINITY, f64::min)
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::testing;

    #[test]
    fn uniform_state_gives_the_physical_flux_everywhere() {
        let mut block = testing::block_2d(8, 8, 2);
        testing::fill_prims(&mut block, |_| [1.0, 0.5, 0.1, -0.2, 0.0, 0.3, 0.1, 0.0]);
        let config = Config::default();
        get_flux(&mut block, 1, &config).unwrap();

        let layout = block.layout.clone();
        let ctx = FluxContext {
            coords: &block.coords,
            m_p: layout.m_p(),
            m_u: layout.m_u(),
            gam: config.gamma,
            emhd: &EmhdParameters::default(),
        };
        let g = block.coords.geometry(0, 5, 5, Loci::Face1);
        let mut u = vec![0.0; 8];
        let mut f = vec![0.0; 8];
        ctx.face_state(&g, block.prims.get_slice((0, 5, 5)), (0, 5, 5), 1, &mut u, &mut f);

        for v in 0..8 {
            assert!((block.flux[0].get(v, (0, 5, 5)) - f[v]).abs() < 1e-13, "slot {}", v);
            assert!((block.flux[0].get(v, (0, 2, 9)) - f[v]).abs() < 1e-13, "slot {}", v);
        }
        assert!(block.cmax[0].get(0, (0, 5, 5)) > 0.0);
    }

    #[test]
    fn mirrored_state_reverses_the_mass_flux() {
        // Cells i and 11 - i are mirror images across the middle of the
        // block, so face i (between i - 1 and i) maps onto face 12 - i.
        let profile = |i: usize| {
            let x = i as f64 * 0.7;
            [1.0 + 0.3 * x.sin(), 0.6 + 0.1 * x.cos(), 0.2 * x.cos(), 0.05, 0.0, 0.0, 0.0, 0.0]
        };
        let mut block = testing::block_2d(8, 8, 2);
        let mut mirror = testing::block_2d(8, 8, 2);
        testing::fill_prims(&mut block, |(_, _, i)| profile(i));
        testing::fill_prims(&mut mirror, |(_, _, i)| {
            let mut p = profile(11 - i);
            p[2] = -p[2];
            p
        });
        let config = Config::default();
        get_flux(&mut block, 1, &config).unwrap();
        get_flux(&mut mirror, 1, &config).unwrap();

        let rho = block.layout.m_u().rho as usize;
        for i in block.face_range(1).ib.iter() {
            let f = block.flux[0].get(rho, (0, 5, i));
            let g = mirror.flux[0].get(rho, (0, 5, 12 - i));
            assert!((f + g).abs() < 1e-13 * f.abs().max(1.0), "face {}", i);
            assert!((block.cmax[0].get(0, (0, 5, i)) - mirror.cmin[0].get(0, (0, 5, 12 - i))).abs() < 1e-13);
        }
    }

    #[test]
    fn reconstructed_states_are_bounded_by_neighbors() {
        let mut block = testing::block_2d(8, 8, 2);
        testing::fill_prims(&mut block, |(_, j, i)| {
            let x = i as f64 * 0.3 + j as f64 * 0.1;
            [1.0 + 0.2 * x.sin(), 0.6, 0.1 * x.cos(), 0.05, 0.0, 0.2, 0.1 * x.sin(), 0.0]
        });
        get_fluxes(&mut block, &Config::default()).unwrap();

        let pl = block.pl.get(0, (0, 5, 5));
        let pr = block.pr.get(0, (0, 5, 5));
        let lo = block.prims.get(0, (0, 4, 5)).min(block.prims.get(0, (0, 5, 5)));
        let hi = block.prims.get(0, (0, 4, 5)).max(block.prims.get(0, (0, 5, 5)));
        assert!(pl >= lo - 1e-14 && pl <= hi + 1e-14);
        assert!(pr >= lo - 1e-14 && pr <= hi + 1e-14);
    }

    #[test]
    fn directions_beyond_the_mesh_are_skipped() {
        let mut block = testing::block_2d(8, 8, 2);
        testing::fill_prims(&mut block, |_| [1.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        get_flux(&mut block, 3, &Config::default()).unwrap();
        assert!(block.flux[2].as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn too_few_ghost_zones_is_an_error() {
        let mut block = testing::block_2d(8, 8, 1);
        testing::fill_prims(&mut block, |_| [1.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let result = get_fluxes(&mut block, &Config::default());
        assert!(matches!(result, Err(Error::InsufficientGhostZones { required: 2, available: 1, .. })));
        assert!(block.flux[0].as_slice().iter().all(|&x| x == 0.0));

        let config = Config { reconstruction: Reconstruction::DonorCell, ..Config::default() };
        assert!(get_fluxes(&mut block, &config).is_ok());
    }

    #[test]
    fn timestep_is_limited_by_the_sound_speed() {
        let mut block = testing::block_2d(8, 8, 2);
        testing::fill_prims(&mut block, |_| [1.0, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let config = Config::default();
        get_fluxes(&mut block, &config).unwrap();

        let gam = config.gamma;
        let cs = (gam * (gam - 1.0) * 0.6 / (1.0 + gam * 0.6)).sqrt();
        let dx = block.coords.dxv(1);
        let expected = 0.9 / (2.0 * cs / dx);
        assert!((estimate_timestep(&block, 0.9) - expected).abs() < 1e-8);
    }
}
