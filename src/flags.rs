use std::collections::BTreeMap;
use crate::config::Config;
use crate::error::Error;
use crate::index_space::IndexDomain;
use crate::mesh::BlockDomain;
use crate::message::Communicator;




/**
 * Outcome of a conserved-to-primitive inversion, as stored in `pflag`. The
 * value -1 marks a zone that was never initialized and so not inverted.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InversionStatus {
    Success = 0,
    NegInput,
    MaxIter,
    BadUt,
    BadGamma,
    NegRho,
    NegU,
    NegRhou,
}

/// Floor conditions, as bits of `fflag`.
pub const FLOOR_NAMES: [(i32, &str); 7] = [
    (1, "GEOM_RHO"),
    (2, "GEOM_U"),
    (4, "B_RHO"),
    (8, "B_U"),
    (16, "TEMP"),
    (32, "GAMMA"),
    (64, "KTOT"),
];




// ============================================================================
impl InversionStatus {

    pub fn from_flag(flag: i32) -> Option<Self> {
        use InversionStatus::*;
        [Success, NegInput, MaxIter, BadUt, BadGamma, NegRho, NegU, NegRhou]
            .iter()
            .copied()
            .find(|s| *s as i32 == flag)
    }

    pub fn name(self) -> &'static str {
        match self {
            InversionStatus::Success   => "success",
            InversionStatus::NegInput  => "neg_input",
            InversionStatus::MaxIter   => "max_iter",
            InversionStatus::BadUt     => "bad_ut",
            InversionStatus::BadGamma  => "bad_gamma",
            InversionStatus::NegRho    => "neg_rho",
            InversionStatus::NegU      => "neg_u",
            InversionStatus::NegRhou   => "neg_rhou",
        }
    }
}




/**
 * The per-zone flag fields a solver writes after a trial step.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagField {
    /// Inversion status, one of the `InversionStatus` values.
    Pflag,
    /// Bitwise OR of the floors applied, see `FLOOR_NAMES`.
    Fflag,
}

/// Number of zones holding each nonzero flag value.
pub type FlagCounts = BTreeMap<i32, usize>;




// ============================================================================
impl FlagField {

    pub fn name(self) -> &'static str {
        match self {
            FlagField::Pflag => "pflag",
            FlagField::Fflag => "fflag",
        }
    }

    /**
     * Human readable description of one flag value.
     */
    pub fn describe(self, flag: i32) -> String {
        match self {
            FlagField::Pflag => match InversionStatus::from_flag(flag) {
                Some(status) => status.name().to_string(),
                None if flag < 0 => "uninitialized".to_string(),
                None => format!("unknown({})", flag),
            },
            FlagField::Fflag => {
                let names: Vec<_> = FLOOR_NAMES
                    .iter()
                    .filter(|(bit, _)| flag & bit != 0)
                    .map(|(_, name)| *name)
                    .collect();
                if names.is_empty() {
                    format!("unknown({})", flag)
                } else {
                    names.join("|")
                }
            }
        }
    }
}




/**
 * Histogram of the nonzero values of a flag field over the interiors of the
 * local blocks.
 */
pub fn count_flags<D: BlockDomain>(md: &D, which: FlagField) -> FlagCounts {
    let mut counts = FlagCounts::new();

    for block in md.blocks() {
        let field = match which {
            FlagField::Pflag => &block.pflag,
            FlagField::Fflag => &block.fflag,
        };
        for index in block.bounds(IndexDomain::Interior).iter() {
            let flag = field.get(0, index) as i32;
            if flag != 0 {
                *counts.entry(flag).or_insert(0) += 1;
            }
        }
    }
    counts
}




/**
 * Combine the flag histograms of all ranks, then log them on rank 0: the
 * total at `flag_verbose >= 1` and a breakdown by value at
 * `flag_verbose >= 2`. Every rank has to call this together when
 * `flag_verbose >= 1`. Returns the global histogram, or `None` if reporting
 * is disabled.
 */
pub fn report_flags<D, C>(md: &D, which: FlagField, config: &Config, comm: &C) -> Result<Option<FlagCounts>, Error>
where
    D: BlockDomain,
    C: Communicator,
{
    if config.flag_verbose < 1 {
        return Ok(None);
    }
    let counts = comm.all_reduce_value(merge_counts, &count_flags(md, which))?;

    if comm.rank() == 0 {
        let total: usize = counts.values().sum();

        if total > 0 {
            log::info!("{} zones flagged in {}", total, which.name());
        }
        if config.flag_verbose >= 2 {
            for (flag, count) in &counts {
                log::info!("    {:>10} {}", count, which.describe(*flag));
            }
        }
    }
    Ok(Some(counts))
}

fn merge_counts(mut a: FlagCounts, b: FlagCounts) -> FlagCounts {
    for (flag, count) in b {
        *a.entry(flag).or_insert(0) += count;
    }
    a
}
