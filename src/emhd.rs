use serde::{Deserialize, Serialize};
use crate::coords::{Coordinates, Loci};
use crate::error::Error;
use crate::grmhd::{FourVectors, SMALL};
use crate::var_map::VarMap;




/**
 * How the relaxation time, thermal diffusivity, and kinematic viscosity of
 * the extended MHD model are set.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Closure {
    /// tau, chi, and nu are constants.
    Constant,
    /// tau is constant, chi and nu scale with the sound speed squared.
    SoundSpeed,
    /// tau is constant, chi = kappa / rho and nu = eta / rho.
    KappaEta,
    /// tau follows the local dynamical time, limited by the stability
    /// bounds on q and dP.
    Torus,
}




/**
 * Parameters of the extended MHD (viscous, conducting) closure. The default
 * value is inert: no higher-order terms, no feedback on the stress tensor.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmhdParameters {
    pub higher_order_terms: bool,
    pub feedback: bool,
    pub closure: Closure,
    pub tau: f64,
    pub conduction_alpha: f64,
    pub viscosity_alpha: f64,
    pub kappa: f64,
    pub eta: f64,
}




// ============================================================================
impl Default for EmhdParameters {
    fn default() -> Self {
        Self {
            higher_order_terms: false,
            feedback: false,
            closure: Closure::Constant,
            tau: 1.0,
            conduction_alpha: 1.0,
            viscosity_alpha: 1.0,
            kappa: 1.0,
            eta: 0.0,
        }
    }
}




// ============================================================================
impl EmhdParameters {

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.tau > 0.0) {
            return Err(Error::InvalidConfig(format!("EMHD tau must be positive, got {}", self.tau)));
        }
        if self.conduction_alpha < 0.0 || self.viscosity_alpha < 0.0 {
            return Err(Error::InvalidConfig("EMHD alpha parameters must be non-negative".into()));
        }
        Ok(())
    }
}




/**
 * Relaxation time and transport coefficients at a point.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transport {
    pub tau: f64,
    pub chi_e: f64,
    pub nu_e: f64,
}




/**
 * Evaluate the closure for the primitive state `p`, located in cell
 * (k, j, i). The torus closure needs the radius of the cell center.
 */
pub fn set_parameters(
    coords: &Coordinates,
    p: &[f64],
    m_p: &VarMap,
    params: &EmhdParameters,
    gam: f64,
    index: (usize, usize, usize)) -> Transport
{
    let rho = p[m_p.rho as usize];
    let uu = p[m_p.uu as usize];

    match params.closure {
        Closure::Constant => Transport {
            tau: params.tau,
            chi_e: params.conduction_alpha,
            nu_e: params.viscosity_alpha,
        },
        Closure::SoundSpeed => {
            let cs2 = gam * (gam - 1.0) * uu / (rho + gam * uu);
            Transport {
                tau: params.tau,
                chi_e: params.conduction_alpha * cs2 * params.tau,
                nu_e: params.viscosity_alpha * cs2 * params.tau,
            }
        }
        Closure::KappaEta => Transport {
            tau: params.tau,
            chi_e: params.kappa / rho.max(SMALL),
            nu_e: params.eta / rho.max(SMALL),
        },
        Closure::Torus => {
            let (k, j, i) = index;
            let r = coords.coord_embed(k, j, i, Loci::Center)[1];
            torus_closure(params, gam, rho, uu, p[m_p.q as usize], p[m_p.dp as usize], r)
        }
    }
}




/**
 * Limit the relaxation time so that the heat flux and pressure anisotropy
 * stay below their stability bounds, which are approached with a smooth
 * logistic switch.
 */
fn torus_closure(
    params: &EmhdParameters,
    gam: f64,
    rho: f64,
    uu: f64,
    q_tilde: f64,
    dp_tilde: f64,
    r: f64) -> Transport
{
    const LAMBDA: f64 = 0.01;

    let tau_dyn = r.powf(1.5);
    let pg = (gam - 1.0) * uu;
    let theta = pg / rho;
    let cs = (gam * pg / (rho + gam * uu)).sqrt();
    let switch = |ratio: f64| {
        let inv_exp_g = (-(ratio - 1.0) / LAMBDA).exp();
        inv_exp_g / (inv_exp_g + 1.0) + 1e-5
    };

    let mut q = q_tilde;
    if params.higher_order_terms {
        q *= (rho * params.conduction_alpha * cs * cs * theta * theta).sqrt();
    }
    let q_max = params.conduction_alpha * rho * cs * cs * cs;
    let mut tau = tau_dyn.min(switch(q.abs() / q_max) * tau_dyn);

    let mut dp = dp_tilde;
    if params.higher_order_terms {
        dp *= (rho * params.viscosity_alpha * cs * cs * theta).sqrt();
    }
    let dp_comp_ratio = (pg - 2.0 / 3.0 * dp).max(SMALL) / (pg + 1.0 / 3.0 * dp).max(SMALL);
    tau = tau.min(switch(dp_comp_ratio) * tau_dyn);

    let max_alpha = (1.0 - cs * cs) / (2.0 * cs * cs + 1e-12);

    Transport {
        tau,
        chi_e: max_alpha.min(params.conduction_alpha) * cs * cs * tau,
        nu_e: max_alpha.min(params.viscosity_alpha) * cs * cs * tau,
    }
}




/**
 * Return one row of the extended MHD stress-energy tensor, `T^dir_mu`. The
 * q and dP arguments are the physical heat flux and pressure anisotropy, not
 * the rescaled primitives (see `convert_prims_to_q_dp`). Without feedback
 * this is the ideal MHD tensor, with b^2 floored.
 */
#[allow(clippy::too_many_arguments)]
pub fn calc_tensor(
    rho: f64,
    u: f64,
    pgas: f64,
    params: &EmhdParameters,
    q: f64,
    dp: f64,
    d: &FourVectors,
    dir: usize) -> [f64; 4]
{
    let bsq = d.bsq().max(SMALL);
    let eta = pgas + rho + u + bsq;
    let ptot = pgas + 0.5 * bsq;
    let mut t = [0.0; 4];

    for mu in 0..4 {
        let delta = if mu == dir { 1.0 } else { 0.0 };
        t[mu] = eta * d.ucon[dir] * d.ucov[mu] + ptot * delta - d.bcon[dir] * d.bcov[mu];

        if params.feedback {
            t[mu] += (q / bsq.sqrt()) * (d.ucon[dir] * d.bcov[mu] + d.bcon[dir] * d.ucov[mu])
                - dp * (d.bcon[dir] * d.bcov[mu] / bsq - (1.0 / 3.0) * (delta + d.ucon[dir] * d.ucov[mu]));
        }
    }
    t
}




/**
 * Convert the primitive heat flux and pressure anisotropy to physical
 * values. With higher-order terms they are stored rescaled by the closure.
 */
pub fn convert_prims_to_q_dp(
    q_tilde: f64,
    dp_tilde: f64,
    rho: f64,
    theta: f64,
    cs2: f64,
    params: &EmhdParameters) -> (f64, f64)
{
    if !params.higher_order_terms {
        return (q_tilde, dp_tilde);
    }
    match params.closure {
        Closure::KappaEta => (
            q_tilde * (params.kappa * theta * theta / params.tau).sqrt(),
            dp_tilde * (params.eta * theta / params.tau).sqrt(),
        ),
        _ => (
            q_tilde * (rho * params.conduction_alpha * cs2 * theta * theta).sqrt(),
            dp_tilde * (rho * params.viscosity_alpha * cs2 * theta).sqrt(),
        ),
    }
}
