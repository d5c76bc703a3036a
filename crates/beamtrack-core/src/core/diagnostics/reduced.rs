use crate::core::particles::{Particle, RefPart};
use nalgebra::Matrix2;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("Cannot compute beam statistics of an empty beam")]
    EmptyBeam,
    #[error("Unsupported beam monitor backend '{0}' (supported: csv, memory)")]
    UnsupportedBackend(String),
    #[error("Invalid beam monitor name '{0}': must be non-empty and contain no path separators")]
    InvalidMonitorName(String),
    #[error("Beam monitor name '{0}' is reserved for the reduced diagnostics output")]
    ReservedMonitorName(String),
    #[error("Beam monitor '{0}' was recorded before its output was opened")]
    MonitorNotOpen(String),
    #[error("I/O error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write CSV file '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Weighted statistics of the bunch at one point along the lattice.
///
/// Positions are in m (`t` in units of `c * dt`), momenta in static units. Emittances are the
/// rms values from the determinant of each plane's 2x2 covariance matrix; the normalised
/// emittances multiply by the reference `beta * gamma`. Twiss parameters are `NaN` in a plane
/// whose emittance vanishes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReducedBeamCharacteristics {
    pub step: usize,
    pub s: f64,
    pub ref_beta_gamma: f64,
    pub x_mean: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_mean: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub t_mean: f64,
    pub t_min: f64,
    pub t_max: f64,
    pub sig_x: f64,
    pub sig_y: f64,
    pub sig_t: f64,
    pub px_mean: f64,
    pub py_mean: f64,
    pub pt_mean: f64,
    pub sig_px: f64,
    pub sig_py: f64,
    pub sig_pt: f64,
    pub emittance_x: f64,
    pub emittance_y: f64,
    pub emittance_t: f64,
    pub emittance_xn: f64,
    pub emittance_yn: f64,
    pub emittance_tn: f64,
    pub alpha_x: f64,
    pub alpha_y: f64,
    pub alpha_t: f64,
    pub beta_x: f64,
    pub beta_y: f64,
    pub beta_t: f64,
    pub charge_c: f64,
}

/// Weighted first and second moments of one phase-space plane.
#[derive(Default)]
struct PlaneMoments {
    q: f64,
    p: f64,
    qq: f64,
    pp: f64,
    qp: f64,
    q_min: f64,
    q_max: f64,
}

impl PlaneMoments {
    fn empty() -> Self {
        Self {
            q_min: f64::INFINITY,
            q_max: f64::NEG_INFINITY,
            ..Self::default()
        }
    }

    fn accumulate(&mut self, w: f64, q: f64, p: f64) {
        self.q += w * q;
        self.p += w * p;
        self.qq += w * q * q;
        self.pp += w * p * p;
        self.qp += w * q * p;
        self.q_min = self.q_min.min(q);
        self.q_max = self.q_max.max(q);
    }

    fn finish(&self, total_weight: f64) -> PlaneStats {
        let q_mean = self.q / total_weight;
        let p_mean = self.p / total_weight;
        let covariance = Matrix2::new(
            (self.qq / total_weight - q_mean * q_mean).max(0.0),
            self.qp / total_weight - q_mean * p_mean,
            self.qp / total_weight - q_mean * p_mean,
            (self.pp / total_weight - p_mean * p_mean).max(0.0),
        );
        let emittance = covariance.determinant().max(0.0).sqrt();
        let (alpha, beta) = if emittance > 0.0 {
            (-covariance[(0, 1)] / emittance, covariance[(0, 0)] / emittance)
        } else {
            (f64::NAN, f64::NAN)
        };
        PlaneStats {
            q_mean,
            q_min: self.q_min,
            q_max: self.q_max,
            sig_q: covariance[(0, 0)].sqrt(),
            p_mean,
            sig_p: covariance[(1, 1)].sqrt(),
            emittance,
            alpha,
            beta,
        }
    }
}

struct PlaneStats {
    q_mean: f64,
    q_min: f64,
    q_max: f64,
    sig_q: f64,
    p_mean: f64,
    sig_p: f64,
    emittance: f64,
    alpha: f64,
    beta: f64,
}

impl ReducedBeamCharacteristics {
    /// Computes the statistics of `particles`, weighted by macro-particle weight.
    ///
    /// `step` is left at zero; callers stamp it with [`Self::at_step`].
    pub fn compute(particles: &[Particle], refpart: &RefPart) -> Result<Self, DiagnosticsError> {
        let total_weight: f64 = particles.iter().map(|p| p.weight).sum();
        if particles.is_empty() || total_weight <= 0.0 {
            return Err(DiagnosticsError::EmptyBeam);
        }

        let mut planes = [
            PlaneMoments::empty(),
            PlaneMoments::empty(),
            PlaneMoments::empty(),
        ];
        for p in particles {
            planes[0].accumulate(p.weight, p.x, p.px);
            planes[1].accumulate(p.weight, p.y, p.py);
            planes[2].accumulate(p.weight, p.t, p.pt);
        }
        let [x, y, t] = planes.map(|plane| plane.finish(total_weight));
        let bg = refpart.beta_gamma();

        Ok(Self {
            step: 0,
            s: refpart.s,
            ref_beta_gamma: bg,
            x_mean: x.q_mean,
            x_min: x.q_min,
            x_max: x.q_max,
            y_mean: y.q_mean,
            y_min: y.q_min,
            y_max: y.q_max,
            t_mean: t.q_mean,
            t_min: t.q_min,
            t_max: t.q_max,
            sig_x: x.sig_q,
            sig_y: y.sig_q,
            sig_t: t.sig_q,
            px_mean: x.p_mean,
            py_mean: y.p_mean,
            pt_mean: t.p_mean,
            sig_px: x.sig_p,
            sig_py: y.sig_p,
            sig_pt: t.sig_p,
            emittance_x: x.emittance,
            emittance_y: y.emittance,
            emittance_t: t.emittance,
            emittance_xn: x.emittance * bg,
            emittance_yn: y.emittance * bg,
            emittance_tn: t.emittance * bg,
            alpha_x: x.alpha,
            alpha_y: y.alpha,
            alpha_t: t.alpha,
            beta_x: x.beta,
            beta_y: y.beta,
            beta_t: t.beta,
            charge_c: total_weight * refpart.charge,
        })
    }

    pub fn at_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }
}
