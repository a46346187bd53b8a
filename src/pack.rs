use serde::{Deserialize, Serialize};
use crate::field::Field;




/**
 * The slot layout of a variable pack: a list of named variables, each
 * occupying a contiguous interval of slots. Built once by `PackBuilder` and
 * never modified after; hot loops should not query it by name, but go
 * through a `VarMap` instead.
 */
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackIndexMap {
    entries: Vec<(String, usize, usize)>,
    num_vars: usize,
}




// ============================================================================
impl PackIndexMap {

    /**
     * Return the first and last slot of the named variable, if it is in the
     * pack.
     */
    pub fn get(&self, name: &str) -> Option<(usize, usize)> {
        self.entries
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|&(_, s, e)| (s, e))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /**
     * Return the total number of slots in the pack.
     */
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _, _)| n.as_str())
    }
}




/**
 * Builder for a `PackIndexMap`. Slots are assigned in the order variables
 * are added; a vector variable always takes three consecutive slots.
 */
#[derive(Default)]
pub struct PackBuilder {
    entries: Vec<(String, usize, usize)>,
    next: usize,
}




// ============================================================================
impl PackBuilder {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(self, name: &str) -> Self {
        self.add(name, 1)
    }

    pub fn vector(self, name: &str) -> Self {
        self.add(name, 3)
    }

    fn add(mut self, name: &str, size: usize) -> Self {
        assert!(
            !self.entries.iter().any(|(n, _, _)| n == name),
            "variable {} added to a pack twice", name);
        self.entries.push((name.to_string(), self.next, self.next + size - 1));
        self.next += size;
        self
    }

    pub fn build(self) -> PackIndexMap {
        assert!(self.next <= i8::MAX as usize, "a pack holds at most 127 slots");
        PackIndexMap {
            entries: self.entries,
            num_vars: self.next,
        }
    }
}




/**
 * A read-only view of one packed field across a number of blocks, addressed
 * by (block, variable, k, j, i). The view borrows the block storage and is
 * meant to live only for the duration of a kernel call.
 */
pub struct VariablePack<'a> {
    fields: Vec<&'a Field>,
}




// ============================================================================
impl<'a> VariablePack<'a> {

    pub fn new(fields: Vec<&'a Field>) -> Self {
        if let Some(first) = fields.first() {
            assert!(
                fields.iter().all(|f| f.num_fields() == first.num_fields()),
                "blocks disagree on the pack layout");
        }
        Self { fields }
    }

    pub fn num_blocks(&self) -> usize {
        self.fields.len()
    }

    pub fn num_vars(&self) -> usize {
        self.fields.first().map_or(0, |f| f.num_fields())
    }

    pub fn get(&self, b: usize, v: usize, k: usize, j: usize, i: usize) -> f64 {
        self.fields[b].get(v, (k, j, i))
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{PackBuilder, VariablePack};
    use crate::field::Field;

    #[test]
    fn vectors_take_three_contiguous_slots() {
        let map = PackBuilder::new()
            .scalar("prims.rho")
            .scalar("prims.u")
            .vector("prims.uvec")
            .vector("prims.B")
            .build();
        assert_eq!(map.get("prims.uvec"), Some((2, 4)));
        assert_eq!(map.get("prims.B"), Some((5, 7)));
        assert_eq!(map.num_vars(), 8);
        assert_eq!(map.get("prims.q"), None);
    }

    #[test]
    #[should_panic]
    fn duplicate_names_are_rejected() {
        PackBuilder::new().scalar("cons.rho").scalar("cons.rho");
    }

    #[test]
    fn variable_pack_addresses_blocks() {
        let a = Field::from_slice_function((1, 2, 2), 2, |(_, j, i), s| s[1] = (j * 2 + i) as f64);
        let b = Field::from_slice_function((1, 2, 2), 2, |_, s| s[1] = -1.0);
        let pack = VariablePack::new(vec![&a, &b]);
        assert_eq!(pack.num_blocks(), 2);
        assert_eq!(pack.num_vars(), 2);
        assert_eq!(pack.get(0, 1, 0, 1, 1), 3.0);
        assert_eq!(pack.get(1, 1, 0, 1, 1), -1.0);
    }
}
