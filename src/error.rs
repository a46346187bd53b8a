use thiserror::Error;




/**
 * Error to represent an invalid configuration, or block data which cannot
 * be used by the flux kernels. The kernels themselves never fail; these are
 * raised when things are being set up.
 */
#[derive(Debug, Error)]
pub enum Error {
    #[error("adiabatic index must exceed 1, got {0}")]
    InvalidGamma(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("required variable {0} is missing from the pack")]
    MissingVariable(String),

    #[error("{scheme} needs {required} ghost zones, the block has {available}")]
    InsufficientGhostZones {
        scheme: &'static str,
        required: usize,
        available: usize,
    },

    #[error("blocks cannot be grouped: {0}")]
    MismatchedBlocks(String),

    #[error("could not encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("could not decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}
