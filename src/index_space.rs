use serde::{Deserialize, Serialize};




/**
 * Identifier for a coordinate axis. `I` is the X1 axis (the fastest-varying
 * index in memory), `J` is X2, and `K` is X3.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    I,
    J,
    K,
}




// ============================================================================
impl Axis {

    /**
     * Return the direction number (1, 2, or 3) of this axis.
     */
    pub fn dir(self) -> usize {
        match self {
            Axis::I => 1,
            Axis::J => 2,
            Axis::K => 3,
        }
    }

    /**
     * Return the position of this axis in the array `[X1, X2, X3]`.
     */
    pub fn position(self) -> usize {
        self.dir() - 1
    }
}




/**
 * A closed interval `[s, e]` of indexes along one axis.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    pub s: usize,
    pub e: usize,
}




// ============================================================================
impl IndexRange {

    pub fn new(s: usize, e: usize) -> Self {
        assert!(s <= e, "index range [{}, {}] is empty", s, e);
        Self { s, e }
    }

    pub fn len(&self) -> usize {
        self.e - self.s + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        self.s <= index && index <= self.e
    }

    /**
     * Move the lower end by `lower` and the upper end by `upper`. Negative
     * offsets shrink (lower) or grow (upper) the range as usual.
     */
    pub fn offset(&self, lower: isize, upper: isize) -> Self {
        let s = self.s as isize + lower;
        let e = self.e as isize + upper;
        assert!(s >= 0, "index range offset below zero ({})", s);
        Self::new(s as usize, e as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> {
        self.s..=self.e
    }
}




/**
 * Represents a rectangular region in a discrete 3D index space, as closed
 * ranges on each of the three axes. Indexes are always given in (k, j, i)
 * order.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpace {
    pub kb: IndexRange,
    pub jb: IndexRange,
    pub ib: IndexRange,
}




// ============================================================================
impl IndexSpace {

    pub fn new(kb: IndexRange, jb: IndexRange, ib: IndexRange) -> Self {
        Self { kb, jb, ib }
    }


    /**
     * Return the number of indexes on each axis, as (nk, nj, ni).
     */
    pub fn dim(&self) -> (usize, usize, usize) {
        (self.kb.len(), self.jb.len(), self.ib.len())
    }


    /**
     * Return the number of elements in this index space.
     */
    pub fn len(&self) -> usize {
        let (l, m, n) = self.dim();
        l * m * n
    }


    pub fn range(&self, axis: Axis) -> IndexRange {
        match axis {
            Axis::I => self.ib,
            Axis::J => self.jb,
            Axis::K => self.kb,
        }
    }


    /**
     * Determine whether this index space contains the given (k, j, i) index.
     */
    pub fn contains(&self, index: (usize, usize, usize)) -> bool {
        self.kb.contains(index.0) && self.jb.contains(index.1) && self.ib.contains(index.2)
    }


    /**
     * Offset the bounds on a single axis.
     */
    pub fn offset(&self, axis: Axis, lower: isize, upper: isize) -> Self {
        let mut result = *self;
        match axis {
            Axis::I => result.ib = self.ib.offset(lower, upper),
            Axis::J => result.jb = self.jb.offset(lower, upper),
            Axis::K => result.kb = self.kb.offset(lower, upper),
        }
        result
    }


    /**
     * Offset the bounds on each of the first `ndim` axes (X1, then X2, then
     * X3). Axes beyond `ndim` have no extent and are left alone.
     */
    pub fn offset_all(&self, lower: isize, upper: isize, ndim: usize) -> Self {
        [Axis::I, Axis::J, Axis::K]
            .iter()
            .take(ndim)
            .fold(*self, |space, &axis| space.offset(axis, lower, upper))
    }


    /**
     * Extend the upper end of the given axis by `delta`, e.g. to go from a
     * range of cells to the range of faces bounding them.
     */
    pub fn extend_upper(&self, delta: usize, axis: Axis) -> Self {
        self.offset(axis, 0, delta as isize)
    }


    /**
     * Return an iterator which traverses the index space in row-major order
     * (C-like; the final index increases fastest).
     */
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.kb.iter().flat_map(move |k| {
            self.jb.iter().flat_map(move |j| self.ib.iter().map(move |i| (k, j, i)))
        })
    }
}




/**
 * Move a (k, j, i) index by `delta` along the given direction (1, 2, or 3).
 */
pub fn shift(index: (usize, usize, usize), dir: usize, delta: isize) -> (usize, usize, usize) {
    let (k, j, i) = index;
    let moved = |n: usize| (n as isize + delta) as usize;
    match dir {
        1 => (k, j, moved(i)),
        2 => (k, moved(j), i),
        3 => (moved(k), j, i),
        _ => panic!("no direction {}", dir),
    }
}




/**
 * Which part of a block an iteration should cover.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexDomain {
    Interior,
    Entire,
}




/**
 * The cell bounds of a block: the number of interior cells on each axis and
 * the number of ghost cells padding each side of it.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexShape {
    nx: [usize; 3],
    ng: [usize; 3],
}




// ============================================================================
impl IndexShape {

    /**
     * Create a shape with `nx = [nx1, nx2, nx3]` interior cells. Ghost zones
     * of width `nghost` are added only along axes with more than one cell.
     */
    pub fn new(nx: [usize; 3], nghost: usize) -> Self {
        let ng = [
            if nx[0] > 1 { nghost } else { 0 },
            if nx[1] > 1 { nghost } else { 0 },
            if nx[2] > 1 { nghost } else { 0 },
        ];
        Self::with_ghosts(nx, ng)
    }

    /**
     * Create a shape with an explicit number of ghost zones on each axis.
     */
    pub fn with_ghosts(nx: [usize; 3], ng: [usize; 3]) -> Self {
        assert!(nx.iter().all(|&n| n > 0), "block has an axis with no cells");
        Self { nx, ng }
    }

    pub fn ncells(&self, axis: Axis) -> usize {
        self.nx[axis.position()]
    }

    pub fn nghost(&self, axis: Axis) -> usize {
        self.ng[axis.position()]
    }

    /**
     * The memory extent of the block on each axis, ghosts included, as
     * (n3, n2, n1).
     */
    pub fn entire_dims(&self) -> (usize, usize, usize) {
        (
            self.nx[2] + 2 * self.ng[2],
            self.nx[1] + 2 * self.ng[1],
            self.nx[0] + 2 * self.ng[0],
        )
    }

    pub fn range(&self, axis: Axis, domain: IndexDomain) -> IndexRange {
        let n = axis.position();
        match domain {
            IndexDomain::Interior => IndexRange::new(self.ng[n], self.ng[n] + self.nx[n] - 1),
            IndexDomain::Entire => IndexRange::new(0, self.nx[n] + 2 * self.ng[n] - 1),
        }
    }

    pub fn bounds(&self, domain: IndexDomain) -> IndexSpace {
        IndexSpace::new(
            self.range(Axis::K, domain),
            self.range(Axis::J, domain),
            self.range(Axis::I, domain),
        )
    }
}
