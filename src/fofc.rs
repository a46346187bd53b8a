/*!
 * First-order flux correction. After a trial step has flagged cells whose
 * primitives failed to invert or hit a floor, the fluxes through the faces of
 * those cells are recomputed from unreconstructed (donor-cell) states with
 * the LLF solver, and the step is retaken with the corrected fluxes.
 */

use rayon::prelude::*;
use crate::config::Config;
use crate::coords::Loci;
use crate::emhd::EmhdParameters;
use crate::error::Error;
use crate::field::row_cell;
use crate::flux::{riemann, FluxContext, Reconstruction};
use crate::index_space::{shift, IndexDomain};
use crate::mesh::{BlockDomain, MeshBlockData};
use crate::trace::Span;




/**
 * Replace the fluxes through the faces of every flagged cell by first-order
 * LLF fluxes. Flags are read from `guess`, the state after the trial step,
 * which must have the same blocks as `md`; primitives are read from `md`.
 * Only `fofcflag` and the flux and speed fields of `md` are written, and
 * fluxes through unflagged faces are left untouched. Returns the number of
 * faces corrected.
 *
 * The corrected B fluxes are not constrained. When any face was corrected,
 * `b_flux_ct::compute_flux_ct` has to be run on `md` again before the
 * update, or the step will not preserve div B.
 */
pub fn apply_fofc<D, G>(md: &mut D, guess: &G, config: &Config) -> Result<usize, Error>
where
    D: BlockDomain,
    G: BlockDomain,
{
    let _span = Span::enter("apply_fofc");

    if md.num_blocks() != guess.num_blocks() {
        return Err(Error::MismatchedBlocks(format!(
            "{} blocks to correct but {} blocks in the trial state",
            md.num_blocks(),
            guess.num_blocks())));
    }
    for (block, trial) in md.blocks().iter().zip(guess.blocks()) {
        if block.prims.dims() != trial.pflag.dims() {
            return Err(Error::MismatchedBlocks(format!(
                "block {} has shape {:?} but its trial state has {:?}",
                block.gid,
                block.prims.dims(),
                trial.pflag.dims())));
        }
        Reconstruction::DonorCell.check_ghost_zones(block)?;
    }
    let ndim = md.ndim();
    let emhd = config.emhd_parameters();

    md.blocks_mut()
        .par_iter_mut()
        .zip(guess.blocks().par_iter())
        .for_each(|(block, trial)| flag_block(block, trial, ndim));

    let corrected = md
        .blocks_mut()
        .par_iter_mut()
        .map(|block| (1..=ndim).map(|dir| correct_block(block, dir, config.gamma, &emhd)).sum::<usize>())
        .sum();

    if corrected > 0 {
        log::debug!("FOFC replaced {} face fluxes", corrected);
    }
    Ok(corrected)
}




/**
 * Mark the cells within one zone of the interior whose trial step was
 * floored or failed to invert.
 */
fn flag_block(block: &mut MeshBlockData, trial: &MeshBlockData, ndim: usize) {
    let region = block.bounds(IndexDomain::Interior).offset_all(-1, 1, ndim);
    let (fflag, pflag) = (&trial.fflag, &trial.pflag);

    block.fofcflag.par_rows_mut().for_each(|((k, j), row)| {
        for (i, flag) in row.iter_mut().enumerate() {
            let index = (k, j, i);
            let bad = fflag.get(0, index) as i32 > 0 || pflag.get(0, index) as i32 > 0;
            *flag = if bad && region.contains(index) { 1.0 } else { 0.0 };
        }
    })
}

fn correct_block(block: &mut MeshBlockData, dir: usize, gam: f64, emhd: &EmhdParameters) -> usize {
    let range = block.face_range(dir);
    let loc = Loci::face(dir);
    let n = dir - 1;

    let MeshBlockData { coords, layout, prims, flux, cmax, cmin, fofcflag, .. } = block;
    let (prims, fofcflag) = (&*prims, &*fofcflag);
    let nv = layout.num_vars();
    let ctx = FluxContext {
        coords,
        m_p: layout.m_p(),
        m_u: layout.m_u(),
        gam,
        emhd,
    };

    flux[n]
        .par_rows_mut()
        .zip(cmax[n].par_rows_mut())
        .zip(cmin[n].par_rows_mut())
        .map(|((((k, j), f_row), (_, cmax_row)), (_, cmin_row))| {
            if !(range.kb.contains(k) && range.jb.contains(j)) {
                return 0;
            }
            let mut ul = vec![0.0; nv];
            let mut ur = vec![0.0; nv];
            let mut fl = vec![0.0; nv];
            let mut fr = vec![0.0; nv];
            let mut count = 0;

            for i in range.ib.iter() {
                let index = (k, j, i);
                let left = shift(index, dir, -1);

                if fofcflag.get(0, index) <= 0.0 && fofcflag.get(0, left) <= 0.0 {
                    continue;
                }
                let g = ctx.coords.geometry(k, j, i, loc);
                let (cmax_l, cmin_l) = ctx.face_state(&g, prims.get_slice(left), index, dir, &mut ul, &mut fl);
                let (cmax_r, cmin_r) = ctx.face_state(&g, prims.get_slice(index), index, dir, &mut ur, &mut fr);
                let (cmax, cmin) = riemann::face_speeds(cmax_l, cmin_l, cmax_r, cmin_r);

                cmax_row[i] = cmax;
                cmin_row[i] = cmin;

                for (v, f) in row_cell(f_row, i, nv).iter_mut().enumerate() {
                    *f = riemann::llf(fl[v], fr[v], cmax, cmin, ul[v], ur[v]);
                }
                count += 1;
            }
            count
        })
        .sum()
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::apply_fofc;
    use crate::b_flux_ct;
    use crate::config::Config;
    use crate::error::Error;
    use crate::flux::{self, Reconstruction, RiemannSolver};
    use crate::index_space::IndexShape;
    use crate::mesh::{BoundaryFlag, MeshBlockData, MeshData};
    use crate::testing;
    use crate::update;

    fn blast((_, j, i): (usize, usize, usize)) -> [f64; 8] {
        let r2 = (i as f64 - 6.0).powi(2) + (j as f64 - 6.0).powi(2);
        let rho = 1.0 + 4.0 * (-r2 / 4.0).exp();
        [rho, 0.3 * rho, 0.1, -0.05, 0.0, 0.02, 0.01, 0.0]
    }

    fn trial_block() -> MeshBlockData {
        let mut block = testing::block_2d(12, 12, 2);
        testing::fill_prims(&mut block, blast);
        testing::fill_cons(&mut block, Config::default().gamma);
        flux::get_fluxes(&mut block, &Config { riemann_solver: RiemannSolver::Hlle, ..Config::default() }).unwrap();
        block
    }

    #[test]
    fn nothing_changes_without_flags() {
        let mut block = trial_block();
        let guess = block.clone();
        let (flux, cmax, cmin) = (block.flux.clone(), block.cmax.clone(), block.cmin.clone());

        assert_eq!(apply_fofc(&mut block, &guess, &Config::default()).unwrap(), 0);
        assert_eq!(block.flux, flux);
        assert_eq!(block.cmax, cmax);
        assert_eq!(block.cmin, cmin);
        assert!(block.fofcflag.as_slice().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn flagged_cell_gets_donor_cell_llf_fluxes() {
        let mut block = trial_block();
        let before = block.flux.clone();
        let mut guess = block.clone();
        guess.pflag.set(0, (0, 6, 6), 1.0);

        assert_eq!(apply_fofc(&mut block, &guess, &Config::default()).unwrap(), 4);
        assert_eq!(block.fofcflag.get(0, (0, 6, 6)), 1.0);
        assert_eq!(block.fofcflag.as_slice().iter().sum::<f64>(), 1.0);

        let mut donor = trial_block();
        let config = Config { reconstruction: Reconstruction::DonorCell, ..Config::default() };
        flux::get_fluxes(&mut donor, &config).unwrap();

        let corrected = [(0, (0, 6, 6)), (0, (0, 6, 7)), (1, (0, 6, 6)), (1, (0, 7, 6))];

        for &(n, index) in &corrected {
            assert_eq!(block.flux[n].get_slice(index), donor.flux[n].get_slice(index));
            assert_eq!(block.cmax[n].get(0, index), donor.cmax[n].get(0, index));
            assert_ne!(block.flux[n].get_slice(index), before[n].get_slice(index));
        }
        for n in 0..2 {
            let dims = block.flux[n].dims();
            for k in 0..dims.0 {
                for j in 0..dims.1 {
                    for i in 0..dims.2 {
                        if !corrected.contains(&(n, (k, j, i))) {
                            assert_eq!(block.flux[n].get_slice((k, j, i)), before[n].get_slice((k, j, i)));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn floor_flags_also_trigger_correction() {
        let mut block = trial_block();
        let mut guess = block.clone();
        guess.fflag.set(0, (0, 3, 9), 2.0);
        assert_eq!(apply_fofc(&mut block, &guess, &Config::default()).unwrap(), 4);
    }

    #[test]
    fn fractional_flags_are_truncated() {
        let mut block = trial_block();
        let mut guess = block.clone();
        guess.pflag.set(0, (0, 6, 6), 0.5);
        guess.fflag.set(0, (0, 4, 4), 0.9);
        assert_eq!(apply_fofc(&mut block, &guess, &Config::default()).unwrap(), 0);
        assert!(block.fofcflag.as_slice().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn constrained_transport_after_correction_preserves_divergence() {
        let config = Config::default();
        let mut block = testing::block_2d(16, 16, 2);
        testing::fill_prims(&mut block, testing::moving_plasma);
        testing::field_from_potential(&mut block, testing::loop_potential);
        testing::fill_cons(&mut block, config.gamma);
        let scale = testing::field_scale(&block);

        flux::get_fluxes(&mut block, &config).unwrap();
        b_flux_ct::compute_flux_ct(&mut block, &config);

        let mut guess = block.clone();
        guess.pflag.set(0, (0, 8, 8), 1.0);
        assert_eq!(apply_fofc(&mut block, &guess, &config).unwrap(), 4);

        let b1 = block.layout.m_u().b1 as usize;
        assert_ne!(block.flux[0].get(b1, (0, 8, 8)), 0.0);

        b_flux_ct::compute_flux_ct(&mut block, &config);
        update::apply_flux_divergence(&mut block, 0.01);
        assert!(b_flux_ct::max_div_b(&block) < 1e-10 * scale);
    }

    #[test]
    fn flags_far_in_the_ghost_zones_are_ignored() {
        let mut block = trial_block();
        let before = block.flux.clone();
        let mut guess = block.clone();
        guess.pflag.set(0, (0, 0, 0), 1.0);
        guess.pflag.set(0, (0, 6, 15), 1.0);

        assert_eq!(apply_fofc(&mut block, &guess, &Config::default()).unwrap(), 0);
        assert_eq!(block.flux, before);
    }

    #[test]
    fn flag_next_to_the_interior_corrects_faces_in_range() {
        let mut block = trial_block();
        let mut guess = block.clone();
        // One zone outside the interior, which starts at i = 2. Its lower X1
        // face is outside the X1 face range, but its X2 faces are inside the
        // transverse halo of the X2 face range.
        guess.pflag.set(0, (0, 6, 1), 1.0);

        assert_eq!(apply_fofc(&mut block, &guess, &Config::default()).unwrap(), 3);
        assert_eq!(block.fofcflag.get(0, (0, 6, 1)), 1.0);
    }

    #[test]
    fn mismatched_trial_state_is_rejected() {
        let mut md = MeshData::new(vec![trial_block(), trial_block()]).unwrap();
        let guess = trial_block();
        assert!(matches!(apply_fofc(&mut md, &guess, &Config::default()), Err(Error::MismatchedBlocks(_))));

        let mut block = trial_block();
        let other = testing::block(IndexShape::new([8, 8, 1], 2), [BoundaryFlag::Periodic; 6]);
        assert!(matches!(apply_fofc(&mut block, &other, &Config::default()), Err(Error::MismatchedBlocks(_))));
    }
}
