use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::index_space::IndexSpace;




/**
 * A block-local array of field values. Each cell `(k, j, i)` of the block
 * holds `num_fields` contiguous values, so the backing buffer is laid out
 * as `[k][j][i][v]`, and a cell's data can be handed around as a slice. The
 * extent covers the whole block, ghost zones included, and is fixed for the
 * lifetime of the field.
 */
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    dims: (usize, usize, usize),
    num_fields: usize,
    data: Vec<f64>,
}




// ============================================================================
impl Field {

    /**
     * Create a field of zeros with the given (n3, n2, n1) extent.
     */
    pub fn zeros(dims: (usize, usize, usize), num_fields: usize) -> Self {
        Self {
            dims,
            num_fields,
            data: vec![0.0; dims.0 * dims.1 * dims.2 * num_fields],
        }
    }


    /**
     * Generate a field with values defined from a closure, which is handed
     * the (k, j, i) index and the cell's slice to fill.
     */
    pub fn from_slice_function<F>(dims: (usize, usize, usize), num_fields: usize, f: F) -> Self
    where
        F: Fn((usize, usize, usize), &mut [f64]),
    {
        let mut field = Self::zeros(dims, num_fields);

        for (n, slice) in field.data.chunks_exact_mut(num_fields.max(1)).enumerate() {
            f(unravel(dims, n), slice)
        }
        field
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value)
    }

    fn offset(&self, index: (usize, usize, usize)) -> usize {
        let (k, j, i) = index;
        debug_assert!(
            k < self.dims.0 && j < self.dims.1 && i < self.dims.2,
            "index ({} {} {}) out of range on field ({} {} {})",
            k, j, i, self.dims.0, self.dims.1, self.dims.2);
        ((k * self.dims.1 + j) * self.dims.2 + i) * self.num_fields
    }

    pub fn get(&self, v: usize, index: (usize, usize, usize)) -> f64 {
        self.data[self.offset(index) + v]
    }

    pub fn set(&mut self, v: usize, index: (usize, usize, usize), value: f64) {
        let n = self.offset(index) + v;
        self.data[n] = value
    }

    pub fn get_slice(&self, index: (usize, usize, usize)) -> &[f64] {
        let n = self.offset(index);
        &self.data[n..n + self.num_fields]
    }

    pub fn get_slice_mut(&mut self, index: (usize, usize, usize)) -> &mut [f64] {
        let n = self.offset(index);
        let m = self.num_fields;
        &mut self.data[n..n + m]
    }


    /**
     * Return a parallel iterator over the rows of this field. Each item is
     * the (k, j) index of the row, and the mutable buffer of the row, which
     * holds `n1 * num_fields` values. Rows never alias, so a kernel writing
     * through them needs no synchronization.
     */
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = ((usize, usize), &mut [f64])> + '_ {
        let n2 = self.dims.1;
        let row = (self.dims.2 * self.num_fields).max(1);
        self.data
            .par_chunks_mut(row)
            .enumerate()
            .map(move |(r, data)| ((r / n2, r % n2), data))
    }


    /**
     * Apply a closure to every cell within the given index space, in
     * parallel. The closure receives the (k, j, i) index and the cell's
     * mutable slice.
     */
    pub fn par_for_each_in<F>(&mut self, space: &IndexSpace, f: F)
    where
        F: Fn((usize, usize, usize), &mut [f64]) + Sync + Send,
    {
        let nv = self.num_fields;
        let space = *space;

        self.par_rows_mut().for_each(|((k, j), row)| {
            if space.kb.contains(k) && space.jb.contains(j) {
                for i in space.ib.iter() {
                    f((k, j, i), row_cell(row, i, nv))
                }
            }
        })
    }
}




/**
 * Return the mutable slice of cell `i` in a row buffer with `nv` fields per
 * cell.
 */
pub fn row_cell(row: &mut [f64], i: usize, nv: usize) -> &mut [f64] {
    &mut row[i * nv..(i + 1) * nv]
}

fn unravel(dims: (usize, usize, usize), n: usize) -> (usize, usize, usize) {
    let i = n % dims.2;
    let j = (n / dims.2) % dims.1;
    let k = n / (dims.2 * dims.1);
    (k, j, i)
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::Field;
    use crate::index_space::{IndexRange, IndexSpace};

    #[test]
    fn cell_slices_are_contiguous() {
        let field = Field::from_slice_function((2, 3, 4), 2, |(k, j, i), s| {
            s[0] = (100 * k + 10 * j + i) as f64;
            s[1] = -s[0];
        });
        assert_eq!(field.get_slice((1, 2, 3)), &[123.0, -123.0]);
        assert_eq!(field.get(0, (0, 1, 2)), 12.0);
    }

    #[test]
    fn parallel_iteration_only_touches_the_space() {
        let mut field = Field::zeros((3, 4, 5), 1);
        let space = IndexSpace::new(IndexRange::new(1, 1), IndexRange::new(1, 2), IndexRange::new(2, 4));
        field.par_for_each_in(&space, |_, s| s[0] = 1.0);
        let total: f64 = field.as_slice().iter().sum();
        assert_eq!(total, space.len() as f64);
        assert_eq!(field.get(0, (1, 2, 4)), 1.0);
        assert_eq!(field.get(0, (1, 2, 1)), 0.0);
    }
}
