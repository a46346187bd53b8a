use serde::{Deserialize, Serialize};
use crate::emhd::EmhdParameters;
use crate::error::Error;
use crate::flux::{Reconstruction, RiemannSolver};




/**
 * Run-time parameters read by the flux, constrained-transport, and FOFC
 * kernels. Values are read-only for the lifetime of a run. Any field missing
 * from a deserialized document takes its default.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Adiabatic index of the gas.
    pub gamma: f64,

    /// Force the B fluxes through a polar (user) X2 boundary to vanish.
    pub fix_polar_flux: bool,

    /// Skip constrained transport entirely. The field will quickly pick up
    /// a divergence.
    pub disable_flux_ct: bool,

    /// Diagnostic verbosity; at 1 or above the post-step divergence report
    /// is computed and logged.
    pub verbose: i32,

    /// At 1 or above, counts of floor and inversion flags are logged.
    pub flag_verbose: i32,

    pub reconstruction: Reconstruction,

    pub riemann_solver: RiemannSolver,

    /// Extended MHD closure, if the pack carries `q` and `dP`.
    pub emhd: Option<EmhdParameters>,
}




// ============================================================================
impl Default for Config {
    fn default() -> Self {
        Self {
            gamma: 5.0 / 3.0,
            fix_polar_flux: true,
            disable_flux_ct: false,
            verbose: 0,
            flag_verbose: 0,
            reconstruction: Reconstruction::LinearMc,
            riemann_solver: RiemannSolver::Llf,
            emhd: None,
        }
    }
}




// ============================================================================
impl Config {

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.gamma > 1.0) {
            return Err(Error::InvalidGamma(self.gamma));
        }
        if let Some(emhd) = &self.emhd {
            emhd.validate()?;
        }
        Ok(())
    }

    /**
     * Return the EMHD parameters, or the inert default if extended MHD is
     * not enabled.
     */
    pub fn emhd_parameters(&self) -> EmhdParameters {
        self.emhd.clone().unwrap_or_default()
    }
}
