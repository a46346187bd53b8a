use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::error::Error;
use crate::field::{row_cell, Field};
use crate::index_space::{shift, Axis, IndexSpace};
use crate::mesh::MeshBlockData;




/**
 * Scheme used to find the primitive states on either side of a face from
 * the cell-centered primitives.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reconstruction {
    /// Piecewise constant: each side takes the value of its cell.
    DonorCell,
    /// Piecewise linear with the van Leer limiter.
    LinearVanLeer,
    /// Piecewise linear with the monotonized-central limiter.
    LinearMc,
}




// ============================================================================
impl Reconstruction {

    pub fn name(self) -> &'static str {
        match self {
            Reconstruction::DonorCell => "donor cell",
            Reconstruction::LinearVanLeer => "linear van Leer",
            Reconstruction::LinearMc => "linear MC",
        }
    }

    /**
     * Number of ghost zones needed along each direction with extent.
     */
    pub fn required_ghosts(self) -> usize {
        match self {
            Reconstruction::DonorCell => 1,
            Reconstruction::LinearVanLeer | Reconstruction::LinearMc => 2,
        }
    }

    /**
     * Check that a block has enough ghost zones along each of its `ndim`
     * axes for this scheme.
     */
    pub fn check_ghost_zones(self, block: &MeshBlockData) -> Result<(), Error> {
        let required = self.required_ghosts();

        for axis in [Axis::I, Axis::J, Axis::K].iter().take(block.ndim()) {
            let available = block.shape().nghost(*axis);
            if available < required {
                return Err(Error::InsufficientGhostZones { scheme: self.name(), required, available });
            }
        }
        Ok(())
    }

    fn slope(self, dm: f64, dp: f64) -> f64 {
        match self {
            Reconstruction::DonorCell => 0.0,
            Reconstruction::LinearVanLeer => van_leer(dm, dp),
            Reconstruction::LinearMc => mc(dm, dp),
        }
    }
}




/**
 * Limited slope from the backward and forward differences `dm` and `dp`.
 */
pub fn mc(dm: f64, dp: f64) -> f64 {
    if dm * dp <= 0.0 {
        0.0
    } else {
        let r = (2.0 * dm.abs()).min(2.0 * dp.abs()).min(0.5 * (dm + dp).abs());
        r.copysign(dm)
    }
}

pub fn van_leer(dm: f64, dp: f64) -> f64 {
    if dm * dp > 0.0 {
        2.0 * dm * dp / (dm + dp)
    } else {
        0.0
    }
}




/**
 * Fill the block's `pl` and `pr` fields with the primitive states to the
 * left and right of each face normal to `dir`, over the flux face range.
 */
pub fn reconstruct(block: &mut MeshBlockData, dir: usize, scheme: Reconstruction) {
    let range = block.face_range(dir);
    let MeshBlockData { prims, pl, pr, .. } = block;
    reconstruct_into(prims, pl, pr, &range, dir, scheme)
}

fn reconstruct_into(prims: &Field, pl: &mut Field, pr: &mut Field, range: &IndexSpace, dir: usize, scheme: Reconstruction) {
    let nv = prims.num_fields();

    pl.par_rows_mut()
        .zip(pr.par_rows_mut())
        .for_each(|(((k, j), row_l), (_, row_r))| {
            if !(range.kb.contains(k) && range.jb.contains(j)) {
                return;
            }
            for i in range.ib.iter() {
                let c = (k, j, i);
                let l = shift(c, dir, -1);
                let left = row_cell(row_l, i, nv);

                if scheme == Reconstruction::DonorCell {
                    left.copy_from_slice(prims.get_slice(l));
                    row_cell(row_r, i, nv).copy_from_slice(prims.get_slice(c));
                    continue;
                }

                let ll = prims.get_slice(shift(c, dir, -2));
                let pll = prims.get_slice(l);
                let pc = prims.get_slice(c);
                let prr = prims.get_slice(shift(c, dir, 1));

                for v in 0..nv {
                    left[v] = pll[v] + 0.5 * scheme.slope(pll[v] - ll[v], pc[v] - pll[v]);
                }
                let right = row_cell(row_r, i, nv);
                for v in 0..nv {
                    right[v] = pc[v] - 0.5 * scheme.slope(pc[v] - pll[v], prr[v] - pc[v]);
                }
            }
        })
}
