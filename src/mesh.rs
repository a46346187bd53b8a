use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::coords::Coordinates;
use crate::error::Error;
use crate::field::Field;
use crate::index_space::{Axis, IndexDomain, IndexRange, IndexShape, IndexSpace};
use crate::pack::{PackBuilder, PackIndexMap};
use crate::var_map::VarMap;




/**
 * One of the six faces of a block.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryFace {
    InnerX1,
    OuterX1,
    InnerX2,
    OuterX2,
    InnerX3,
    OuterX3,
}




// ============================================================================
impl BoundaryFace {

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn axis(self) -> Axis {
        match self {
            BoundaryFace::InnerX1 | BoundaryFace::OuterX1 => Axis::I,
            BoundaryFace::InnerX2 | BoundaryFace::OuterX2 => Axis::J,
            BoundaryFace::InnerX3 | BoundaryFace::OuterX3 => Axis::K,
        }
    }
}




/**
 * What lies across a block face. `Block` and `Periodic` faces border other
 * zones of the simulation; the rest are edges of the problem domain, whose
 * ghost zones are filled by a boundary condition. `User` marks a problem
 * specific condition, e.g. the polar axis of a spherical grid.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryFlag {
    Block,
    Periodic,
    User,
    Outflow,
    Reflect,
}




pub fn is_physical_boundary(flag: BoundaryFlag) -> bool {
    !matches!(flag, BoundaryFlag::Block | BoundaryFlag::Periodic)
}




/**
 * The variable layout shared by every block of a mesh: the slot maps of the
 * primitive and conserved packs, and the variable maps built from them.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct PackLayout {
    prims: PackIndexMap,
    cons: PackIndexMap,
    m_p: VarMap,
    m_u: VarMap,
}




// ============================================================================
impl PackLayout {

    /**
     * Build a layout from primitive and conserved slot maps. Density,
     * internal energy, and velocity are required in both; every other
     * variable is optional, but has to be in both packs or neither.
     */
    pub fn new(prims: PackIndexMap, cons: PackIndexMap) -> Result<Self, Error> {
        for name in ["rho", "u", "uvec"] {
            for (prefix, map) in [("prims", &prims), ("cons", &cons)] {
                let full = format!("{}.{}", prefix, name);
                if !map.contains(&full) {
                    return Err(Error::MissingVariable(full));
                }
            }
        }
        for name in prims.names() {
            let cons_name = name.replacen("prims.", "cons.", 1);
            if !cons.contains(&cons_name) {
                return Err(Error::MissingVariable(cons_name));
            }
        }
        if prims.num_vars() != cons.num_vars() {
            return Err(Error::InvalidConfig("primitive and conserved packs differ in size".into()));
        }
        let m_p = VarMap::new(&prims, false);
        let m_u = VarMap::new(&cons, true);
        Ok(Self { prims, cons, m_p, m_u })
    }

    /**
     * The layout of an ideal MHD run: density, internal energy, velocity,
     * and magnetic field, followed by the named extra scalars. Conserved
     * variables are laid out in the same order as primitives.
     */
    pub fn mhd(extra_scalars: &[&str]) -> Result<Self, Error> {
        let build = |prefix: &str| {
            let builder = PackBuilder::new()
                .scalar(&format!("{}.rho", prefix))
                .scalar(&format!("{}.u", prefix))
                .vector(&format!("{}.uvec", prefix))
                .vector(&format!("{}.B", prefix));
            extra_scalars
                .iter()
                .fold(builder, |b, name| b.scalar(&format!("{}.{}", prefix, name)))
                .build()
        };
        Self::new(build("prims"), build("cons"))
    }

    pub fn prims(&self) -> &PackIndexMap {
        &self.prims
    }

    pub fn cons(&self) -> &PackIndexMap {
        &self.cons
    }

    pub fn m_p(&self) -> &VarMap {
        &self.m_p
    }

    pub fn m_u(&self) -> &VarMap {
        &self.m_u
    }

    pub fn num_vars(&self) -> usize {
        self.cons.num_vars()
    }
}




/**
 * The data of one mesh block: its geometry and boundary flags, the
 * primitive and conserved state, and the per-block scratch written by the
 * flux kernels. Every field spans the entire block, ghost zones included.
 * Face-centered fields (fluxes, speeds, reconstructed states) are indexed by
 * the cell whose lower face they sit on.
 */
#[derive(Clone, Debug)]
pub struct MeshBlockData {
    pub gid: usize,
    pub coords: Coordinates,
    pub boundaries: [BoundaryFlag; 6],
    pub layout: Arc<PackLayout>,

    pub prims: Field,
    pub cons: Field,

    /// Face fluxes of the conserved variables, one field per direction.
    pub flux: [Field; 3],

    /// Reconstructed primitives on the left and right of each face, for the
    /// direction most recently processed.
    pub pl: Field,
    pub pr: Field,

    /// Signal speeds toward the upper and lower side of each face, by direction.
    pub cmax: [Field; 3],
    pub cmin: [Field; 3],

    /// Floor and inversion flags written by the solver after a trial step.
    pub fflag: Field,
    pub pflag: Field,

    /// Cells whose bordering faces are corrected by FOFC.
    pub fofcflag: Field,

    pub div_b: Field,
}




// ============================================================================
impl MeshBlockData {

    pub fn new(gid: usize, coords: Coordinates, boundaries: [BoundaryFlag; 6], layout: Arc<PackLayout>) -> Self {
        let dims = coords.shape.entire_dims();
        let nv = layout.num_vars();
        let scalar = || Field::zeros(dims, 1);
        let vars = || Field::zeros(dims, nv);

        Self {
            gid,
            coords,
            boundaries,
            layout,
            prims: vars(),
            cons: vars(),
            flux: [vars(), vars(), vars()],
            pl: vars(),
            pr: vars(),
            cmax: [scalar(), scalar(), scalar()],
            cmin: [scalar(), scalar(), scalar()],
            fflag: scalar(),
            pflag: scalar(),
            fofcflag: scalar(),
            div_b: scalar(),
        }
    }

    pub fn shape(&self) -> IndexShape {
        self.coords.shape
    }

    /**
     * Number of dimensions of the block: the highest axis with more than one
     * interior cell.
     */
    pub fn ndim(&self) -> usize {
        let shape = self.shape();
        if shape.ncells(Axis::K) > 1 {
            3
        } else if shape.ncells(Axis::J) > 1 {
            2
        } else {
            1
        }
    }

    pub fn bounds(&self, domain: IndexDomain) -> IndexSpace {
        self.shape().bounds(domain)
    }

    pub fn boundary(&self, face: BoundaryFace) -> BoundaryFlag {
        self.boundaries[face.index()]
    }

    /**
     * The faces normal to `dir` on which a flux is computed: every face of
     * the interior along `dir`, and one extra row of faces on each side of
     * the interior along the other axes present, for the CT stencil.
     */
    pub fn face_range(&self, dir: usize) -> IndexSpace {
        let ndim = self.ndim();
        let interior = self.bounds(IndexDomain::Interior);

        [Axis::I, Axis::J, Axis::K]
            .iter()
            .take(ndim)
            .fold(interior, |space, &axis| {
                if axis.dir() == dir {
                    space.extend_upper(1, axis)
                } else {
                    space.offset(axis, -1, 1)
                }
            })
    }

    /**
     * Zones which are filled by computation or by exchange with neighbors,
     * rather than by a boundary condition: the interior, extended through
     * the ghost zones on every face which is not a physical boundary.
     */
    pub fn get_physical_zones(&self) -> IndexSpace {
        let shape = self.shape();
        let side = |face: BoundaryFace| {
            let domain = if is_physical_boundary(self.boundary(face)) {
                IndexDomain::Interior
            } else {
                IndexDomain::Entire
            };
            shape.range(face.axis(), domain)
        };
        let range = |inner: BoundaryFace, outer: BoundaryFace| {
            IndexRange::new(side(inner).s, side(outer).e)
        };
        IndexSpace::new(
            range(BoundaryFace::InnerX3, BoundaryFace::OuterX3),
            range(BoundaryFace::InnerX2, BoundaryFace::OuterX2),
            range(BoundaryFace::InnerX1, BoundaryFace::OuterX1),
        )
    }
}




/**
 * A group of blocks processed together by the kernels. All blocks share a
 * variable layout and dimensionality.
 */
#[derive(Clone, Debug)]
pub struct MeshData {
    blocks: Vec<MeshBlockData>,
}




// ============================================================================
impl MeshData {

    pub fn new(blocks: Vec<MeshBlockData>) -> Result<Self, Error> {
        if let Some(first) = blocks.first() {
            for block in &blocks[1..] {
                if block.ndim() != first.ndim() {
                    return Err(Error::MismatchedBlocks(format!(
                        "block {} is {}D, block {} is {}D", first.gid, first.ndim(), block.gid, block.ndim())));
                }
                if block.layout != first.layout {
                    return Err(Error::MismatchedBlocks(format!(
                        "blocks {} and {} have different variable layouts", first.gid, block.gid)));
                }
            }
        }
        Ok(Self { blocks })
    }

    pub fn into_blocks(self) -> Vec<MeshBlockData> {
        self.blocks
    }
}




/**
 * Anything the kernels can run over: a single block, or a group of them.
 */
pub trait BlockDomain: Send + Sync {
    fn blocks(&self) -> &[MeshBlockData];

    fn blocks_mut(&mut self) -> &mut [MeshBlockData];

    fn num_blocks(&self) -> usize {
        self.blocks().len()
    }

    fn ndim(&self) -> usize {
        self.blocks().first().map_or(1, |b| b.ndim())
    }
}




// ============================================================================
impl BlockDomain for MeshBlockData {
    fn blocks(&self) -> &[MeshBlockData] {
        std::slice::from_ref(self)
    }

    fn blocks_mut(&mut self) -> &mut [MeshBlockData] {
        std::slice::from_mut(self)
    }
}

impl BlockDomain for MeshData {
    fn blocks(&self) -> &[MeshBlockData] {
        &self.blocks
    }

    fn blocks_mut(&mut self) -> &mut [MeshBlockData] {
        &mut self.blocks
    }
}
