//! Kharmars computes the numerical fluxes of general relativistic
//! magnetohydrodynamics (GRMHD) on block-structured meshes, and keeps the
//! magnetic field divergence-free. The flux engine reconstructs primitive
//! states at cell faces and combines them with an approximate Riemann
//! solver; the constrained transport engine rewrites the field fluxes from
//! edge EMFs so the update preserves a discrete div B = 0 to round-off; and
//! first-order flux correction (FOFC) demotes the fluxes around zones whose
//! trial step failed. Time integration, primitive recovery, and boundary
//! exchange are left to the caller.

pub mod b_flux_ct;
pub mod config;
pub mod coords;
pub mod emhd;
pub mod error;
pub mod field;
pub mod flags;
pub mod flux;
pub mod fofc;
pub mod grmhd;
pub mod index_space;
pub mod mesh;
pub mod message;
pub mod pack;
pub mod trace;
pub mod update;
pub mod var_map;

#[cfg(test)]
mod testing;
