/*!
 * Constrained transport of the magnetic field by the flux-CT scheme of
 * Toth (2000). The face fluxes of the field computed by the flux engine are
 * averaged to edge EMFs, and rewritten from them, so that the update
 * preserves a corner-centered discretization of div B to round-off.
 *
 * The primitive field is the cell-centered B, and the conserved field is
 * `gdet * B`.
 */

use rayon::prelude::*;
use crate::config::Config;
use crate::coords::Loci;
use crate::error::Error;
use crate::field::Field;
use crate::index_space::{IndexDomain, IndexRange, IndexSpace};
use crate::mesh::{BlockDomain, BoundaryFace, BoundaryFlag, MeshBlockData};
use crate::message::Communicator;
use crate::pack::VariablePack;
use crate::trace::Span;
use crate::update::SimTime;




/**
 * Apply constrained transport to the B fluxes of every block: the polar
 * flux fix first if it is enabled, then the EMF rewrite. Does nothing if
 * constrained transport is disabled.
 */
pub fn compute_flux_ct<D: BlockDomain>(md: &mut D, config: &Config) {
    if config.disable_flux_ct {
        log::trace!("constrained transport is disabled");
        return;
    }
    if config.fix_polar_flux {
        fix_polar_flux(md);
    }
    flux_ct(md);
}




/**
 * Rewrite the B fluxes from edge EMFs, choosing the path by the
 * dimensionality of the mesh. A 1D mesh has no transverse field to
 * transport, and is left alone.
 */
pub fn flux_ct<D: BlockDomain>(md: &mut D) {
    match md.ndim() {
        1 => (),
        2 => flux_ct_2d(md),
        _ => flux_ct_3d(md),
    }
}

pub fn flux_ct_2d<D: BlockDomain>(md: &mut D) {
    let _span = Span::enter("flux_ct_2d");
    md.blocks_mut().par_iter_mut().for_each(block_flux_ct_2d)
}

pub fn flux_ct_3d<D: BlockDomain>(md: &mut D) {
    let _span = Span::enter("flux_ct_3d");
    md.blocks_mut().par_iter_mut().for_each(block_flux_ct_3d)
}




fn zero_component(field: &mut Field, slot: usize) {
    let nv = field.num_fields();
    field.par_rows_mut().for_each(|(_, row)| {
        for cell in row.chunks_exact_mut(nv) {
            cell[slot] = 0.0
        }
    })
}

fn upper(r: IndexRange) -> IndexRange {
    r.offset(0, 1)
}

fn block_flux_ct_2d(block: &mut MeshBlockData) {
    if !block.layout.m_u().has_b() {
        return;
    }
    let interior = block.bounds(IndexDomain::Interior);
    let (kb, jb, ib) = (interior.kb, interior.jb, interior.ib);
    let b1 = block.layout.m_u().b1 as usize;
    let b2 = b1 + 1;
    let mut emf3 = Field::zeros(block.prims.dims(), 1);

    {
        let (f1, f2) = (&block.flux[0], &block.flux[1]);
        emf3.par_for_each_in(&IndexSpace::new(kb, upper(jb), upper(ib)), |(k, j, i), e| {
            e[0] = 0.25 * (f1.get(b2, (k, j, i)) + f1.get(b2, (k, j - 1, i))
                         - f2.get(b1, (k, j, i)) - f2.get(b1, (k, j, i - 1)));
        });
    }

    let [f1, f2, _] = &mut block.flux;
    let emf3 = &emf3;

    zero_component(f1, b1);
    zero_component(f2, b2);

    f1.par_for_each_in(&IndexSpace::new(kb, jb, upper(ib)), |(k, j, i), f| {
        f[b2] = 0.5 * (emf3.get(0, (k, j, i)) + emf3.get(0, (k, j + 1, i)));
    });
    f2.par_for_each_in(&IndexSpace::new(kb, upper(jb), ib), |(k, j, i), f| {
        f[b1] = -0.5 * (emf3.get(0, (k, j, i)) + emf3.get(0, (k, j, i + 1)));
    });
}

fn block_flux_ct_3d(block: &mut MeshBlockData) {
    if !block.layout.m_u().has_b() {
        return;
    }
    let interior = block.bounds(IndexDomain::Interior);
    let (kb, jb, ib) = (interior.kb, interior.jb, interior.ib);
    let b1 = block.layout.m_u().b1 as usize;
    let b2 = b1 + 1;
    let b3 = b1 + 2;

    // emf1, emf2, emf3 on the edges along X1, X2, X3
    let mut emf = Field::zeros(block.prims.dims(), 3);

    {
        let [f1, f2, f3] = &block.flux;
        emf.par_for_each_in(&IndexSpace::new(upper(kb), upper(jb), upper(ib)), |(k, j, i), e| {
            e[0] = 0.25 * (f2.get(b3, (k, j, i)) + f2.get(b3, (k - 1, j, i))
                         - f3.get(b2, (k, j, i)) - f3.get(b2, (k, j - 1, i)));
            e[1] = -0.25 * (f1.get(b3, (k, j, i)) + f1.get(b3, (k - 1, j, i))
                          - f3.get(b1, (k, j, i)) - f3.get(b1, (k, j, i - 1)));
            e[2] = 0.25 * (f1.get(b2, (k, j, i)) + f1.get(b2, (k, j - 1, i))
                         - f2.get(b1, (k, j, i)) - f2.get(b1, (k, j, i - 1)));
        });
    }

    let [f1, f2, f3] = &mut block.flux;
    let emf = &emf;

    zero_component(f1, b1);
    zero_component(f2, b2);
    zero_component(f3, b3);

    f1.par_for_each_in(&IndexSpace::new(kb, jb, upper(ib)), |(k, j, i), f| {
        f[b2] = 0.5 * (emf.get(2, (k, j, i)) + emf.get(2, (k, j + 1, i)));
        f[b3] = -0.5 * (emf.get(1, (k, j, i)) + emf.get(1, (k + 1, j, i)));
    });
    f2.par_for_each_in(&IndexSpace::new(kb, upper(jb), ib), |(k, j, i), f| {
        f[b1] = -0.5 * (emf.get(2, (k, j, i)) + emf.get(2, (k, j, i + 1)));
        f[b3] = 0.5 * (emf.get(0, (k, j, i)) + emf.get(0, (k + 1, j, i)));
    });
    f3.par_for_each_in(&IndexSpace::new(upper(kb), jb, ib), |(k, j, i), f| {
        f[b1] = 0.5 * (emf.get(1, (k, j, i)) + emf.get(1, (k, j, i + 1)));
        f[b2] = -0.5 * (emf.get(0, (k, j, i)) + emf.get(0, (k, j + 1, i)));
    });
}




/**
 * On blocks whose X2 faces are the polar axis (`User` boundaries), make the
 * B2 fluxes antisymmetric across the pole and zero the B2 flux through it,
 * so the edge EMFs on the axis vanish under constrained transport.
 */
pub fn fix_polar_flux<D: BlockDomain>(md: &mut D) {
    let _span = Span::enter("fix_polar_flux");
    let ndim = md.ndim();

    md.blocks_mut()
        .par_iter_mut()
        .for_each(|block| block_fix_polar_flux(block, ndim))
}

fn block_fix_polar_flux(block: &mut MeshBlockData, ndim: usize) {
    if ndim < 2 || !block.layout.m_u().has_b() {
        return;
    }
    let inner = block.boundary(BoundaryFace::InnerX2) == BoundaryFlag::User;
    let outer = block.boundary(BoundaryFace::OuterX2) == BoundaryFlag::User;

    if !inner && !outer {
        return;
    }
    let interior = block.bounds(IndexDomain::Interior);
    let (js, je) = (interior.jb.s, interior.jb.e);

    if js == 0 {
        log::warn!("block {} has no X2 ghost zones to mirror polar fluxes into", block.gid);
        return;
    }
    let kb = if ndim > 2 { upper(interior.kb) } else { interior.kb };
    let ib = upper(interior.ib);
    let b2 = block.layout.m_u().b1 as usize + 1;
    let [f1, f2, f3] = &mut block.flux;

    // (row whose fluxes are set, interior row they mirror, pole face)
    let mut rows = Vec::new();
    if inner {
        rows.push((js - 1, js, js));
    }
    if outer {
        rows.push((je + 1, je, je + 1));
    }

    for (ghost, mirror, pole) in rows {
        for k in kb.iter() {
            for i in ib.iter() {
                f1.set(b2, (k, ghost, i), -f1.get(b2, (k, mirror, i)));
                f2.set(b2, (k, pole, i), 0.0);
                if ndim > 2 {
                    f3.set(b2, (k, ghost, i), -f3.get(b2, (k, mirror, i)));
                }
            }
        }
    }
}




/**
 * The region over which the corner-centered divergence is evaluated: the
 * interior with its lowest row trimmed on each axis present, so the stencil
 * stays inside the interior. `None` if that leaves nothing.
 */
fn div_b_range(block: &MeshBlockData, ndim: usize) -> Option<IndexSpace> {
    let interior = block.bounds(IndexDomain::Interior);
    let trim = |r: IndexRange| if r.e > r.s { Some(IndexRange::new(r.s + 1, r.e)) } else { None };
    let kb = if ndim > 2 { trim(interior.kb)? } else { interior.kb };
    Some(IndexSpace::new(kb, trim(interior.jb)?, trim(interior.ib)?))
}

/**
 * |div B| at the lower corner of cell (k, j, i) of block `n` of the pack,
 * from the conserved field averaged onto the corner: 4 cells in 2D, 8 in
 * 3D.
 */
fn corner_div_b(b_u: &VariablePack, n: usize, b1: usize, index: (usize, usize, usize), ndim: usize, dx: [f64; 3]) -> f64 {
    let (k, j, i) = index;
    let (b2, b3) = (b1 + 1, b1 + 2);
    let b = |v: usize, k: usize, j: usize, i: usize| b_u.get(n, v, k, j, i);
    let norm = if ndim > 2 { 0.25 } else { 0.5 };

    let mut term1 = b(b1, k, j, i) + b(b1, k, j - 1, i) - b(b1, k, j, i - 1) - b(b1, k, j - 1, i - 1);
    let mut term2 = b(b2, k, j, i) + b(b2, k, j, i - 1) - b(b2, k, j - 1, i) - b(b2, k, j - 1, i - 1);
    let mut term3 = 0.0;

    if ndim > 2 {
        term1 += b(b1, k - 1, j, i) + b(b1, k - 1, j - 1, i) - b(b1, k - 1, j, i - 1) - b(b1, k - 1, j - 1, i - 1);
        term2 += b(b2, k - 1, j, i) + b(b2, k - 1, j, i - 1) - b(b2, k - 1, j - 1, i) - b(b2, k - 1, j - 1, i - 1);
        term3 = b(b3, k, j, i) + b(b3, k, j - 1, i) + b(b3, k, j, i - 1) + b(b3, k, j - 1, i - 1)
              - b(b3, k - 1, j, i) - b(b3, k - 1, j - 1, i) - b(b3, k - 1, j, i - 1) - b(b3, k - 1, j - 1, i - 1);
    }
    (norm * term1 / dx[0] + norm * term2 / dx[1] + norm * term3 / dx[2]).abs()
}

fn block_max_div_b(b_u: &VariablePack, n: usize, block: &MeshBlockData, ndim: usize) -> f64 {
    if !block.layout.m_u().has_b() {
        return 0.0;
    }
    let space = match div_b_range(block, ndim) {
        Some(space) => space,
        None => return 0.0,
    };
    let b1 = block.layout.m_u().b1 as usize;
    let dx = block.coords.dx;
    let rows: Vec<(usize, usize)> = space.kb.iter().flat_map(|k| space.jb.iter().map(move |j| (k, j))).collect();

    rows.into_par_iter()
        .map(|(k, j)| {
            space.ib
                .iter()
                .map(|i| corner_div_b(b_u, n, b1, (k, j, i), ndim, dx))
                .fold(0.0, f64::max)
        })
        .reduce(|| 0.0, f64::max)
}




/**
 * Return the largest |div B| over the interiors of the local blocks. Zero on
 * a 1D mesh.
 */
pub fn max_div_b<D: BlockDomain>(md: &D) -> f64 {
    let _span = Span::enter("max_div_b");
    let ndim = md.ndim();

    if ndim < 2 {
        return 0.0;
    }
    let b_u = VariablePack::new(md.blocks().iter().map(|block| &block.cons).collect());

    md.blocks()
        .par_iter()
        .enumerate()
        .map(|(n, block)| block_max_div_b(&b_u, n, block, ndim))
        .reduce(|| 0.0, f64::max)
}




/**
 * Report the divergence of the field after a step. When `verbose >= 1` the
 * maximum over all ranks is computed, logged on rank 0, and returned; every
 * rank has to call this together in that case. Otherwise returns `None`
 * without communicating.
 */
pub fn post_step_diagnostics<D, C>(tm: &SimTime, md: &D, config: &Config, comm: &C) -> Result<Option<f64>, Error>
where
    D: BlockDomain,
    C: Communicator,
{
    let _span = Span::enter("post_step_diagnostics");

    if config.verbose < 1 {
        return Ok(None);
    }
    let max_divb = comm.all_reduce_max(max_div_b(md))?;

    if comm.rank() == 0 {
        log::info!("[{:06}] t={:.6} max divB: {:e}", tm.ncycle, tm.time, max_divb);
    }
    Ok(Some(max_divb))
}




/**
 * Write |div B| at each cell's lower corner into the block's `div_b` field,
 * for output. Cells outside the evaluated region are set to zero.
 */
pub fn fill_div_b<D: BlockDomain>(md: &mut D) {
    let _span = Span::enter("fill_div_b");
    let ndim = md.ndim();

    md.blocks_mut().par_iter_mut().for_each(|block| {
        block.div_b.fill(0.0);

        if ndim < 2 || !block.layout.m_u().has_b() {
            return;
        }
        if let Some(space) = div_b_range(block, ndim) {
            let b1 = block.layout.m_u().b1 as usize;
            let dx = block.coords.dx;
            let MeshBlockData { cons, div_b, .. } = block;
            let b_u = VariablePack::new(vec![&*cons]);
            div_b.par_for_each_in(&space, |index, d| d[0] = corner_div_b(&b_u, 0, b1, index, ndim, dx));
        }
    })
}




/**
 * Recover the primitive field from the conserved one, `B = (gdet B) / gdet`,
 * over the given domain.
 */
pub fn cons_to_prim<D: BlockDomain>(md: &mut D, domain: IndexDomain) {
    let _span = Span::enter("b_cons_to_prim");

    md.blocks_mut().par_iter_mut().for_each(|block| {
        let space = block.bounds(domain);
        block_cons_to_prim(block, &space)
    })
}

/**
 * Recover the primitive field over every zone that is computed or exchanged
 * with a neighbor, leaving the zones set by physical boundary conditions
 * alone.
 */
pub fn fill_derived<D: BlockDomain>(md: &mut D) {
    let _span = Span::enter("b_fill_derived");

    md.blocks_mut().par_iter_mut().for_each(|block| {
        let space = block.get_physical_zones();
        block_cons_to_prim(block, &space)
    })
}

fn block_cons_to_prim(block: &mut MeshBlockData, space: &IndexSpace) {
    if !block.layout.m_p().has_b() {
        return;
    }
    let bp = block.layout.m_p().b1 as usize;
    let bu = block.layout.m_u().b1 as usize;
    let MeshBlockData { coords, prims, cons, .. } = block;
    let (coords, cons) = (&*coords, &*cons);

    prims.par_for_each_in(space, |(k, j, i), p| {
        let gdet = coords.gdet(k, j, i, Loci::Center);
        for v in 0..3 {
            p[bp + v] = cons.get(bu + v, (k, j, i)) / gdet;
        }
    })
}

/**
 * Set the conserved field from the primitive one over the given domain.
 */
pub fn prim_to_cons<D: BlockDomain>(md: &mut D, domain: IndexDomain) {
    let _span = Span::enter("b_prim_to_cons");

    md.blocks_mut().par_iter_mut().for_each(|block| {
        if !block.layout.m_p().has_b() {
            return;
        }
        let space = block.bounds(domain);
        let bp = block.layout.m_p().b1 as usize;
        let bu = block.layout.m_u().b1 as usize;
        let MeshBlockData { coords, prims, cons, .. } = block;
        let (coords, prims) = (&*coords, &*prims);

        cons.par_for_each_in(&space, |(k, j, i), u| {
            let gdet = coords.gdet(k, j, i, Loci::Center);
            for v in 0..3 {
                u[bu + v] = prims.get(bp + v, (k, j, i)) * gdet;
            }
        })
    })
}
