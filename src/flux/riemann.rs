use serde::{Deserialize, Serialize};




/**
 * Approximate Riemann solver used to combine the two states at a face.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiemannSolver {
    /// Local Lax-Friedrichs (Rusanov): one wave, the fastest in either
    /// direction.
    Llf,
    /// Harten-Lax-van Leer-Einfeldt: two waves.
    Hlle,
}




// ============================================================================
impl RiemannSolver {

    /**
     * Combine the left and right fluxes and conserved states of one
     * variable. Both `cmax` and `cmin` are non-negative: they are the speeds
     * of the fastest waves moving up and down, respectively.
     */
    pub fn flux(self, fl: f64, fr: f64, cmax: f64, cmin: f64, ul: f64, ur: f64) -> f64 {
        match self {
            RiemannSolver::Llf => llf(fl, fr, cmax, cmin, ul, ur),
            RiemannSolver::Hlle => hlle(fl, fr, cmax, cmin, ul, ur),
        }
    }
}




pub fn llf(fl: f64, fr: f64, cmax: f64, cmin: f64, ul: f64, ur: f64) -> f64 {
    let ctop = cmax.max(cmin);
    0.5 * (fl + fr - ctop * (ur - ul))
}

pub fn hlle(fl: f64, fr: f64, cmax: f64, cmin: f64, ul: f64, ur: f64) -> f64 {
    let ap = cmax;
    let am = -cmin;

    if ap - am > 0.0 {
        (fl * ap - fr * am - (ul - ur) * ap * am) / (ap - am)
    } else {
        0.5 * (fl + fr)
    }
}




/**
 * Combine the one-sided signal speeds of the two states at a face into the
 * non-negative face speeds `(cmax, cmin)`.
 */
pub fn face_speeds(cmax_l: f64, cmin_l: f64, cmax_r: f64, cmin_r: f64) -> (f64, f64) {
    let cmax = 0.0_f64.max(cmax_l).max(cmax_r).abs();
    let cmin = 0.0_f64.max(-cmin_l).max(-cmin_r).abs();
    (cmax, cmin)
}
