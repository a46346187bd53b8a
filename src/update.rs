use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::field::row_cell;
use crate::index_space::{shift, IndexDomain};
use crate::mesh::{BlockDomain, MeshBlockData};
use crate::trace::Span;




/**
 * Where a run is in time: the current time, the step size, and the number
 * of steps taken.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    pub time: f64,
    pub dt: f64,
    pub ncycle: u64,
}




// ============================================================================
impl SimTime {

    pub fn advance(&mut self) {
        self.time += self.dt;
        self.ncycle += 1;
    }
}




/**
 * Advance the conserved variables of every block's interior by the
 * divergence of the face fluxes:
 *
 * `U -= dt * sum_d (F_d[upper face] - F_d[lower face]) / dx_d`
 *
 * This is the bare first-order update; a time integrator composes stages of
 * it. Source terms are not included.
 */
pub fn apply_flux_divergence<D: BlockDomain>(md: &mut D, dt: f64) {
    let _span = Span::enter("apply_flux_divergence");
    let ndim = md.ndim();

    md.blocks_mut()
        .par_iter_mut()
        .for_each(|block| block_update(block, ndim, dt))
}

fn block_update(block: &mut MeshBlockData, ndim: usize, dt: f64) {
    let interior = block.bounds(IndexDomain::Interior);
    let MeshBlockData { coords, cons, flux, .. } = block;
    let nv = cons.num_fields();
    let flux = &*flux;
    let dx = [coords.dxv(1), coords.dxv(2), coords.dxv(3)];

    cons.par_rows_mut().for_each(|((k, j), row)| {
        if !(interior.kb.contains(k) && interior.jb.contains(j)) {
            return;
        }
        for i in interior.ib.iter() {
            let index = (k, j, i);
            let u = row_cell(row, i, nv);

            for dir in 1..=ndim {
                let fm = flux[dir - 1].get_slice(index);
                let fp = flux[dir - 1].get_slice(shift(index, dir, 1));
                for v in 0..nv {
                    u[v] -= dt * (fp[v] - fm[v]) / dx[dir - 1];
                }
            }
        }
    })
}
