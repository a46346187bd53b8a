use std::sync::Arc;
use crate::coords::{Coordinates, Loci};
use crate::emhd::EmhdParameters;
use crate::flux::FluxContext;
use crate::index_space::IndexShape;
use crate::mesh::{BoundaryFlag, MeshBlockData, PackLayout};




pub fn mhd_layout() -> Arc<PackLayout> {
    Arc::new(PackLayout::mhd(&[]).unwrap())
}

pub fn block(shape: IndexShape, boundaries: [BoundaryFlag; 6]) -> MeshBlockData {
    let coords = Coordinates::cartesian(shape, [0.0; 3], [1.0; 3]);
    MeshBlockData::new(0, coords, boundaries, mhd_layout())
}

pub fn block_2d(nx1: usize, nx2: usize, ng: usize) -> MeshBlockData {
    block(IndexShape::new([nx1, nx2, 1], ng), [BoundaryFlag::Periodic; 6])
}

pub fn block_3d(nx: usize, ng: usize) -> MeshBlockData {
    block(IndexShape::new([nx, nx, nx], ng), [BoundaryFlag::Periodic; 6])
}




/**
 * Fill the primitives of the whole block, ghost zones included, from a
 * function of the cell index returning (rho, u, u1, u2, u3, B1, B2, B3).
 */
pub fn fill_prims<F>(block: &mut MeshBlockData, f: F)
where
    F: Fn((usize, usize, usize)) -> [f64; 8]
{
    let dims = block.prims.dims();
    for k in 0..dims.0 {
        for j in 0..dims.1 {
            for i in 0..dims.2 {
                block.prims.get_slice_mut((k, j, i)).copy_from_slice(&f((k, j, i)))
            }
        }
    }
}




/**
 * Set the conserved variables of the whole block from its primitives.
 */
pub fn fill_cons(block: &mut MeshBlockData, gam: f64) {
    let layout = block.layout.clone();
    let emhd = EmhdParameters::default();
    let ctx = FluxContext {
        coords: &block.coords,
        m_p: layout.m_p(),
        m_u: layout.m_u(),
        gam,
        emhd: &emhd,
    };
    let dims = block.prims.dims();
    let nv = layout.num_vars();
    let mut f = vec![0.0; nv];

    for k in 0..dims.0 {
        for j in 0..dims.1 {
            for i in 0..dims.2 {
                let g = ctx.coords.geometry(k, j, i, Loci::Center);
                ctx.face_state(&g, block.prims.get_slice((k, j, i)), (k, j, i), 1, block.cons.get_slice_mut((k, j, i)), &mut f);
            }
        }
    }
}




/**
 * Set a cell-centered magnetic field from the corner values of a vector
 * potential A3(x1, x2), such that the corner-centered divergence vanishes
 * to round-off. The field is written to both the primitive and conserved
 * (flat space) variables over the whole block but its last row and column.
 */
pub fn field_from_potential<F>(block: &mut MeshBlockData, a3: F)
where
    F: Fn(f64, f64) -> f64
{
    let dims = block.prims.dims();
    let m_p = *block.layout.m_p();
    let m_u = *block.layout.m_u();
    let dx = block.coords.dxv(1);
    let dy = block.coords.dxv(2);
    let a = |k: usize, j: usize, i: usize| {
        let x = block.coords.coord(k, j, i, Loci::Corner);
        a3(x[1], x[2])
    };
    let mut values = Vec::new();

    for k in 0..dims.0 {
        for j in 0..dims.1 - 1 {
            for i in 0..dims.2 - 1 {
                let b1 = (a(k, j + 1, i) + a(k, j + 1, i + 1) - a(k, j, i) - a(k, j, i + 1)) / (2.0 * dy);
                let b2 = -(a(k, j, i + 1) + a(k, j + 1, i + 1) - a(k, j, i) - a(k, j + 1, i)) / (2.0 * dx);
                values.push(((k, j, i), b1, b2));
            }
        }
    }
    for (index, b1, b2) in values {
        for (field, b) in [(&mut block.prims, m_p.b1), (&mut block.cons, m_u.b1)] {
            field.set(b as usize, index, b1);
            field.set(b as usize + 1, index, b2);
            field.set(b as usize + 2, index, 0.0);
        }
    }
}




/**
 * A smooth, subsonic flow with no field, varying along every axis.
 */
pub fn moving_plasma((k, j, i): (usize, usize, usize)) -> [f64; 8] {
    let x = 0.3 * i as f64 + 0.2 * j as f64 + 0.1 * k as f64;
    [1.0 + 0.1 * x.sin(), 0.5, 0.2 * x.cos(), 0.1 + 0.05 * x.sin(), 0.03 * x.cos(), 0.0, 0.0, 0.0]
}

/**
 * Vector potential of a weak field loop centered in the unit square.
 */
pub fn loop_potential(x: f64, y: f64) -> f64 {
    let r = ((x - 0.5).powi(2) + (y - 0.5).powi(2)).sqrt();
    1e-3 * (0.3 - r).max(0.0)
}

/**
 * The scale against which a round-off divergence is judged: the largest
 * conserved in-plane field component over the cell width.
 */
pub fn field_scale(block: &MeshBlockData) -> f64 {
    let b1 = block.layout.m_u().b1 as usize;
    let bmax = block
        .cons
        .as_slice()
        .chunks_exact(block.cons.num_fields())
        .map(|c| c[b1].abs().max(c[b1 + 1].abs()))
        .fold(0.0, f64::max);
    bmax / block.coords.dxv(1)
}
